//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Solo los códigos que el servidor realmente emite:
//!
//! - **2xx**: 200 OK, 204 No Content
//! - **4xx**: 400, 404, 405
//! - **5xx**: 500, 503 (servidor apagándose)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok = 200,

    /// 204 No Content
    NoContent = 204,

    /// 400 Bad Request - body o parámetros inválidos
    BadRequest = 400,

    /// 404 Not Found - ruta o job inexistente
    NotFound = 404,

    /// 405 Method Not Allowed - la ruta existe con otro método
    MethodNotAllowed = 405,

    /// 500 Internal Server Error
    InternalServerError = 500,

    /// 503 Service Unavailable - el pool ya no acepta trabajo
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// ```
    /// use stats_server::http::StatusCode;
    /// assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
