//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API builder para armar respuestas y serializarlas a bytes.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 38\r\n
//! X-Request-Id: 0000000000000007\r\n
//! \r\n
//! {"status":"done","job_id":"job_id_7"}
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use stats_server::http::{Response, StatusCode};
//! use serde_json::json;
//!
//! let response = Response::json_value(StatusCode::Ok, &json!({"num_jobs": 2}));
//!
//! assert_eq!(response.body(), br#"{"num_jobs":2}"#);
//! ```

use super::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers (un valor por nombre)
    headers: HashMap<String, String>,

    body: Vec<u8>,
}

impl Response {
    /// Respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header (sobrescribe si ya existe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el body y el `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self.headers
            .insert("Content-Length".to_string(), self.body.len().to_string());
        self
    }

    /// Respuesta JSON 200 a partir de un string ya serializado
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Respuesta JSON con el status indicado
    pub fn json_value(status: StatusCode, value: &Value) -> Self {
        // Serializar un Value no falla: las claves siempre son strings
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body_bytes(body)
    }

    /// Respuesta de texto plano
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(body)
    }

    /// Respuesta de error: `{"status": "error", "reason": "..."}`
    ///
    /// ```
    /// use stats_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "Invalid job_id");
    ///
    /// assert_eq!(response.status(), StatusCode::NotFound);
    /// assert_eq!(response.body(), br#"{"status":"error","reason":"Invalid job_id"}"#);
    /// ```
    pub fn error(status: StatusCode, reason: &str) -> Self {
        Self::json_value(status, &json!({ "status": "error", "reason": reason }))
    }

    /// Serializa la respuesta completa (status line, headers, body)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body parseado como JSON (útil en tests y handlers)
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}
