//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Estado compartido del servidor y tabla de rutas. El loop TCP vive en
//! [`tcp`].
//!
//! ## Rutas
//!
//! | Método | Path                           | Handler                          |
//! |--------|--------------------------------|----------------------------------|
//! | GET    | `/`, `/index`                  | listado de rutas                 |
//! | POST   | `/api/<consulta>`              | encola una agregación            |
//! | GET    | `/api/get_results/<job_id>`    | estado o resultado de un job     |
//! | GET    | `/api/jobs`                    | encola un listado de jobs        |
//! | GET    | `/api/num_jobs`                | jobs en estado running           |
//! | GET    | `/api/graceful_shutdown`       | apaga el pool (bloquea)          |

pub mod tcp;

pub use tcp::Server;

use crate::commands::{self, QueryKind};
use crate::dataset::Dataset;
use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::{self, FsResultStore, JobManager, JobManagerConfig, PoolError};
use crate::router::Router;
use std::sync::Arc;

/// Estado compartido por todas las conexiones
pub struct AppState {
    /// Pool de jobs
    pub jobs: Arc<JobManager>,

    /// Dataset cargado al arrancar, solo lectura
    pub dataset: Arc<Dataset>,

    /// Directorio de resultados (el pool escribe, `get_results` lee)
    pub results: FsResultStore,
}

impl AppState {
    /// Arranca el pool usando `results` como sumidero
    pub fn new(
        dataset: Dataset,
        results: FsResultStore,
        pool: JobManagerConfig,
    ) -> Result<Self, PoolError> {
        let jobs = JobManager::new(pool, Arc::new(results.clone()))?;

        Ok(Self {
            jobs: Arc::new(jobs),
            dataset: Arc::new(dataset),
            results,
        })
    }
}

/// Construye la tabla de rutas del servidor
pub fn build_router() -> Router {
    let mut router = Router::new();

    router.register(Method::GET, "/", index_handler);
    router.register(Method::GET, "/index", index_handler);

    for kind in QueryKind::ALL {
        router.register(
            Method::POST,
            &format!("/api/{}", kind.name()),
            commands::handlers::submit_query,
        );
    }

    router.register_prefix(
        Method::GET,
        jobs::handlers::RESULTS_PREFIX,
        jobs::handlers::get_results,
    );
    router.register(Method::GET, "/api/jobs", jobs::handlers::jobs);
    router.register(Method::GET, "/api/num_jobs", jobs::handlers::num_jobs);
    router.register(
        Method::GET,
        "/api/graceful_shutdown",
        jobs::handlers::graceful_shutdown,
    );

    router
}

/// `GET /` y `GET /index`: rutas disponibles en texto plano
fn index_handler(_req: &Request, _state: &AppState) -> Response {
    let mut body = String::from("Available routes:\n");
    for route in build_router().routes() {
        body.push_str("  ");
        body.push_str(&route);
        body.push('\n');
    }
    Response::text(StatusCode::Ok, &body)
}

/// Estado con dataset vacío y resultados en un directorio temporal
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    test_state_with(Dataset::default())
}

#[cfg(test)]
pub(crate) fn test_state_with(dataset: Dataset) -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let results = FsResultStore::new(dir.path().join("results")).unwrap();
    let pool = JobManagerConfig {
        workers: 2,
        poll_interval: std::time::Duration::from_millis(20),
    };
    (AppState::new(dataset, results, pool).unwrap(), dir)
}
