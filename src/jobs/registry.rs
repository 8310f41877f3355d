//! # Registro de Jobs
//! src/jobs/registry.rs
//!
//! Mapa en memoria `JobId -> estado`, protegido por un único mutex.
//! Es la única fuente de verdad sobre si un job terminó.
//!
//! El lock protege solo la estructura; las tareas nunca se ejecutan
//! mientras se sostiene.

use crate::jobs::job::{JobCompletion, Outcome};
use crate::jobs::types::{JobId, JobSnapshot, JobStatus};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error};

struct RegistryInner {
    jobs: HashMap<JobId, JobSnapshot>,
    /// Próximo número de secuencia a asignar
    next_seq: u64,
    /// Jobs en estado running
    running: usize,
}

/// Registro thread-safe de jobs
pub struct JobRegistry {
    inner: Mutex<RegistryInner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                jobs: HashMap::new(),
                next_seq: 1,
                running: 0,
            }),
        }
    }

    /// Asigna un ID nuevo y crea su entrada en estado running
    pub fn allocate(&self) -> JobId {
        let mut inner = self.inner.lock();
        let id = JobId::new(inner.next_seq);
        inner.next_seq += 1;
        inner.jobs.insert(id, JobSnapshot::running(id));
        inner.running += 1;
        id
    }

    /// Aplica la completación de un job
    ///
    /// Un ID desconocido o un job ya terminal indica un bug del pool:
    /// se registra y se ignora.
    pub fn complete(&self, completion: JobCompletion) {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        let Some(entry) = inner.jobs.get_mut(&completion.job_id) else {
            error!(job_id = %completion.job_id, "completion for unknown job");
            return;
        };

        if entry.is_terminal() {
            error!(
                job_id = %completion.job_id,
                status = %entry.status,
                "completion for job already in a terminal state"
            );
            return;
        }

        match completion.outcome {
            Outcome::Done(value) => {
                entry.status = JobStatus::Done;
                entry.result = Some(value);
            }
            Outcome::Failed(detail) => {
                entry.status = JobStatus::Error;
                entry.error = Some(detail);
            }
        }
        inner.running -= 1;

        debug!(job_id = %completion.job_id, status = %entry.status, "job completed");
    }

    /// Obtiene la foto actual de un job
    pub fn get(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.inner.lock().jobs.get(job_id).cloned()
    }

    /// Copia inmutable de `id -> estado` de todos los jobs, ordenada por ID
    pub fn snapshot_all(&self) -> BTreeMap<JobId, JobStatus> {
        let inner = self.inner.lock();
        inner
            .jobs
            .iter()
            .map(|(id, job)| (*id, job.status))
            .collect()
    }

    /// Número de jobs en estado running
    pub fn running_count(&self) -> usize {
        self.inner.lock().running
    }

    /// Número total de jobs registrados
    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
