//! # Sistema de Jobs
//! src/jobs/mod.rs
//!
//! Ejecuta las consultas de agregación de forma asíncrona: cada consulta
//! se convierte en un job con ID propio cuyo resultado se consulta después.
//!
//! ## Componentes
//!
//! - `registry`: estado de cada job (running → done/error)
//! - `queue`: cola FIFO entre quienes encolan y los workers
//! - `worker`: hilos que ejecutan tareas y persisten resultados
//! - `storage`: sumidero de resultados (un JSON por job)
//! - `manager`: fachada del pool y shutdown ordenado
//!
//! ## Endpoints
//!
//! - `/api/get_results/<job_id>` - Resultado o estado de un job
//! - `/api/jobs` - Estado de todos los jobs (como job)
//! - `/api/num_jobs` - Jobs en ejecución
//! - `/api/graceful_shutdown` - Shutdown ordenado del pool

pub mod handlers;
pub mod job;
pub mod manager;
pub mod queue;
pub mod registry;
pub mod storage;
pub mod types;
pub mod worker;

pub use job::{JobCompletion, Outcome, QueueEntry, Task, TaskError};
pub use manager::{JobManager, JobManagerConfig, PoolError};
pub use queue::TaskQueue;
pub use registry::JobRegistry;
pub use storage::{FsResultStore, MemoryResultStore, ResultStore, StoreError};
pub use types::{JobId, JobSnapshot, JobStatus, PoolState};
pub use worker::{ShutdownSignal, Worker};
