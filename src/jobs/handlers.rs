//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Endpoints que consultan o controlan el pool:
//! - `GET /api/get_results/<job_id>`
//! - `GET /api/jobs`
//! - `GET /api/num_jobs`
//! - `GET /api/graceful_shutdown`

use crate::http::{Request, Response, StatusCode};
use crate::jobs::manager::PoolError;
use crate::jobs::types::{JobId, JobStatus};
use crate::server::AppState;
use serde_json::{json, Map, Value};
use tracing::{error, info};

/// Prefijo de la ruta de resultados
pub const RESULTS_PREFIX: &str = "/api/get_results/";

/// Respuesta estándar a un intento de encolar
///
/// ```json
/// {"status": "done", "job_id": "job_id_1"}
/// ```
pub fn submission_response(result: Result<JobId, PoolError>) -> Response {
    match result {
        Ok(job_id) => Response::json_value(
            StatusCode::Ok,
            &json!({ "status": "done", "job_id": job_id.to_string() }),
        ),
        Err(PoolError::ShuttingDown) => {
            Response::error(StatusCode::ServiceUnavailable, "shutting down")
        }
        Err(e) => {
            error!(error = %e, "failed to submit job");
            Response::error(StatusCode::InternalServerError, &e.to_string())
        }
    }
}

/// `GET /api/get_results/<job_id>`
///
/// | Estado del job | Respuesta                                   |
/// |----------------|---------------------------------------------|
/// | desconocido    | 404 `{"status":"error","reason":"Invalid job_id"}` |
/// | running        | `{"status":"running"}`                      |
/// | done           | `{"status":"done","data":<resultado>}`       |
/// | error          | `{"status":"error","reason":<detalle>}`      |
pub fn get_results(req: &Request, state: &AppState) -> Response {
    let raw_id = req.path().trim_start_matches(RESULTS_PREFIX);

    let snapshot = JobId::parse(raw_id).and_then(|id| state.jobs.job_status(&id).ok());
    let Some(snapshot) = snapshot else {
        return Response::error(StatusCode::NotFound, "Invalid job_id");
    };

    match snapshot.status {
        JobStatus::Running => Response::json_value(StatusCode::Ok, &json!({ "status": "running" })),
        JobStatus::Done => match state.results.read(&snapshot.id) {
            Ok(data) => {
                Response::json_value(StatusCode::Ok, &json!({ "status": "done", "data": data }))
            }
            Err(e) => {
                error!(job_id = %snapshot.id, error = %e, "failed to read result file");
                Response::error(
                    StatusCode::InternalServerError,
                    "Error while reading result file",
                )
            }
        },
        JobStatus::Error => {
            let reason = snapshot.error.unwrap_or_default();
            Response::error(StatusCode::Ok, &reason)
        }
    }
}

/// `GET /api/jobs`: encola un job cuyo resultado es el listado de jobs
///
/// El listado se toma cuando el worker ejecuta la tarea, así que el propio
/// job aparece en él como `running`.
pub fn jobs(_req: &Request, state: &AppState) -> Response {
    let registry = state.jobs.registry();

    submission_response(state.jobs.submit(move || {
        let mut listing: Map<String, Value> = registry
            .snapshot_all()
            .into_iter()
            .map(|(id, status)| (id.to_string(), json!(status.as_str())))
            .collect();
        listing.insert("status".to_string(), json!("done"));
        Ok(Value::Object(listing))
    }))
}

/// `GET /api/num_jobs`: jobs que siguen en estado running
pub fn num_jobs(_req: &Request, state: &AppState) -> Response {
    Response::json_value(
        StatusCode::Ok,
        &json!({ "num_jobs": state.jobs.running_count() }),
    )
}

/// `GET /api/graceful_shutdown`
///
/// Bloquea hasta que el pool termina todo lo encolado. Los demás endpoints
/// siguen respondiendo mientras tanto (cada conexión tiene su hilo).
pub fn graceful_shutdown(_req: &Request, state: &AppState) -> Response {
    info!("graceful shutdown requested");
    state.jobs.shutdown();
    Response::json_value(StatusCode::Ok, &json!({ "status": "done" }))
}
