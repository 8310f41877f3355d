//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementación mínima de HTTP sobre `std::net`, sin frameworks:
//!
//! - Parsing de requests (request line, headers, body)
//! - Construcción de responses
//! - Status codes
//!
//! El servidor atiende una petición por conexión y siempre responde con
//! `Connection: close`, así que no hay keep-alive ni chunked encoding.

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
