//! # Handlers de Consultas
//! src/commands/handlers.rs
//!
//! `POST /api/<consulta>` con body JSON `{"question": "...", "state": "..."}`.
//! El handler solo valida y encola; el cálculo corre en el pool.

use super::{Command, QueryKind, QueryParams};
use crate::http::{Request, Response, StatusCode};
use crate::jobs::handlers::submission_response;
use crate::server::AppState;
use std::sync::Arc;
use tracing::{info, warn};

/// Handler común a las nueve consultas; el tipo sale del path
pub fn submit_query(req: &Request, state: &AppState) -> Response {
    let name = req.path().trim_start_matches("/api/");
    let Some(kind) = QueryKind::from_name(name) else {
        return Response::error(
            StatusCode::NotFound,
            &format!("Route not found: {}", req.path()),
        );
    };

    let params: QueryParams = match req.json() {
        Ok(params) => params,
        Err(e) => {
            warn!(query = kind.name(), error = %e, "rejected request body");
            return Response::error(
                StatusCode::BadRequest,
                &format!("Invalid JSON body: {}", e),
            );
        }
    };

    let command = match Command::new(kind, params) {
        Ok(command) => command,
        Err(e) => return Response::error(StatusCode::BadRequest, &e.to_string()),
    };

    info!(query = kind.name(), "received query");
    submission_response(
        state
            .jobs
            .submit(command.into_task(Arc::clone(&state.dataset))),
    )
}
