//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, path) a handlers.
//!
//! ```text
//! Request → Router → Handler(&Request, &AppState) → Response
//! ```
//!
//! Las rutas exactas se revisan antes que las de prefijo. Si el path existe
//! pero con otro método se responde 405; si no existe, 404.

use crate::http::{Method, Request, Response, StatusCode};
use crate::server::AppState;

/// Un handler recibe el request y el estado compartido del servidor
pub type Handler = fn(&Request, &AppState) -> Response;

/// Valor del header `Server`
pub const SERVER_NAME: &str = concat!("stats-server/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathMatch {
    Exact(String),
    Prefix(String),
}

impl PathMatch {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatch::Exact(p) => p == path,
            PathMatch::Prefix(p) => path.starts_with(p.as_str()),
        }
    }

    fn is_exact(&self) -> bool {
        matches!(self, PathMatch::Exact(_))
    }

    fn display(&self) -> String {
        match self {
            PathMatch::Exact(p) => p.clone(),
            PathMatch::Prefix(p) => format!("{}<job_id>", p),
        }
    }
}

struct Route {
    method: Method,
    path: PathMatch,
    handler: Handler,
}

/// Tabla de rutas
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una ruta exacta
    pub fn register(&mut self, method: Method, path: &str, handler: Handler) {
        self.routes.push(Route {
            method,
            path: PathMatch::Exact(path.to_string()),
            handler,
        });
    }

    /// Registra una ruta por prefijo (ej: `/api/get_results/`)
    pub fn register_prefix(&mut self, method: Method, prefix: &str, handler: Handler) {
        self.routes.push(Route {
            method,
            path: PathMatch::Prefix(prefix.to_string()),
            handler,
        });
    }

    /// Listado `METHOD path` de las rutas registradas
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| format!("{} {}", r.method, r.path.display()))
            .collect()
    }

    /// Despacha el request al handler que corresponda
    pub fn route(&self, request: &Request, state: &AppState) -> Response {
        let path = request.path();

        let candidates = self
            .routes
            .iter()
            .filter(|r| r.path.is_exact())
            .chain(self.routes.iter().filter(|r| !r.path.is_exact()))
            .filter(|r| r.path.matches(path));

        let mut path_known = false;
        let mut response = None;
        for route in candidates {
            path_known = true;
            if route.method == request.method() {
                response = Some((route.handler)(request, state));
                break;
            }
        }

        let mut response = response.unwrap_or_else(|| {
            if path_known {
                Response::error(
                    StatusCode::MethodNotAllowed,
                    &format!("Method {} not allowed for {}", request.method(), path),
                )
            } else {
                Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
            }
        });

        Self::add_common_headers(&mut response);
        response
    }

    /// Headers presentes en todas las respuestas
    pub fn add_common_headers(response: &mut Response) {
        response.add_header("Server", SERVER_NAME);
        response.add_header("Connection", "close");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_state;

    fn ok_handler(_req: &Request, _state: &AppState) -> Response {
        Response::json(r#"{"test":"ok"}"#)
    }

    fn prefix_handler(req: &Request, _state: &AppState) -> Response {
        Response::text(StatusCode::Ok, req.path())
    }

    fn parse(raw: &[u8]) -> Request {
        Request::parse(raw).unwrap()
    }

    #[test]
    fn test_route_found() {
        let (state, _dir) = test_state();
        let mut router = Router::new();
        router.register(Method::GET, "/test", ok_handler);

        let response = router.route(&parse(b"GET /test HTTP/1.0\r\n\r\n"), &state);

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Connection"), Some("close"));
        assert_eq!(response.header("Server"), Some(SERVER_NAME));
    }

    #[test]
    fn test_route_not_found() {
        let (state, _dir) = test_state();
        let router = Router::new();

        let response = router.route(&parse(b"GET /nonexistent HTTP/1.0\r\n\r\n"), &state);

        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.header("Connection"), Some("close"));
    }

    #[test]
    fn test_method_not_allowed() {
        let (state, _dir) = test_state();
        let mut router = Router::new();
        router.register(Method::POST, "/api/best5", ok_handler);

        let response = router.route(&parse(b"GET /api/best5 HTTP/1.0\r\n\r\n"), &state);

        assert_eq!(response.status(), StatusCode::MethodNotAllowed);
    }

    #[test]
    fn test_prefix_route() {
        let (state, _dir) = test_state();
        let mut router = Router::new();
        router.register_prefix(Method::GET, "/api/get_results/", prefix_handler);

        let response = router.route(
            &parse(b"GET /api/get_results/job_id_4 HTTP/1.0\r\n\r\n"),
            &state,
        );

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), b"/api/get_results/job_id_4");
    }

    #[test]
    fn test_exact_wins_over_prefix() {
        let (state, _dir) = test_state();
        let mut router = Router::new();
        router.register_prefix(Method::GET, "/api/", prefix_handler);
        router.register(Method::GET, "/api/jobs", ok_handler);

        let response = router.route(&parse(b"GET /api/jobs HTTP/1.0\r\n\r\n"), &state);

        assert_eq!(response.body(), br#"{"test":"ok"}"#);
    }

    #[test]
    fn test_routes_listing() {
        let mut router = Router::new();
        router.register(Method::GET, "/api/jobs", ok_handler);
        router.register_prefix(Method::GET, "/api/get_results/", prefix_handler);

        assert_eq!(
            router.routes(),
            vec!["GET /api/jobs", "GET /api/get_results/<job_id>"]
        );
    }
}
