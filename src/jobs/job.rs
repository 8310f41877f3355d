//! # Tareas y Completaciones
//! src/jobs/job.rs
//!
//! Una `Task` es el cómputo diferido asociado a un job. El pool no conoce su
//! forma: solo sabe ejecutarla y obtener un `serde_json::Value` o un error.
//! Al terminar, el worker produce una `JobCompletion` que consume el registro.

use crate::jobs::types::JobId;
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// Error producido por la ejecución de una tarea
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Construye un `Panicked` a partir del payload de `catch_unwind`
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        TaskError::Panicked(message)
    }
}

/// Cómputo diferido, opaco para el pool
pub type Task = Box<dyn FnOnce() -> Result<Value, TaskError> + Send + 'static>;

/// Entrada de la cola: (job, tarea)
pub struct QueueEntry {
    pub job_id: JobId,
    pub task: Task,
}

impl QueueEntry {
    pub fn new(job_id: JobId, task: Task) -> Self {
        Self { job_id, task }
    }
}

impl fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("job_id", &self.job_id)
            .finish_non_exhaustive()
    }
}

/// Resultado final de un job
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done(Value),
    Failed(String),
}

/// Mensaje que un worker entrega al registro al terminar un job
#[derive(Debug, Clone, PartialEq)]
pub struct JobCompletion {
    pub job_id: JobId,
    pub outcome: Outcome,
}

impl JobCompletion {
    pub fn done(job_id: JobId, value: Value) -> Self {
        Self {
            job_id,
            outcome: Outcome::Done(value),
        }
    }

    pub fn failed(job_id: JobId, detail: impl Into<String>) -> Self {
        Self {
            job_id,
            outcome: Outcome::Failed(detail.into()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.outcome, Outcome::Done(_))
    }
}
