//! # Gestor Central de Jobs
//! src/jobs/manager.rs
//!
//! Fachada del pool: asigna IDs, encola tareas, responde consultas de
//! estado y coordina el shutdown ordenado de los workers.
//!
//! ```text
//! submit ─► registry.allocate ─► queue.enqueue ─► Worker ─► store.write ─► registry.complete
//! ```

use crate::jobs::job::{QueueEntry, TaskError};
use crate::jobs::queue::TaskQueue;
use crate::jobs::registry::JobRegistry;
use crate::jobs::storage::ResultStore;
use crate::jobs::types::{JobId, JobSnapshot, JobStatus, PoolState};
use crate::jobs::worker::{ShutdownSignal, Worker};
use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info};

/// Errores del pool visibles para quien lo usa
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    #[error("job pool is shutting down")]
    ShuttingDown,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

/// Configuración del Job Manager
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Número de workers
    pub workers: usize,

    /// Cada cuánto un worker ocioso revisa la señal de shutdown
    pub poll_interval: Duration,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            workers: crate::config::default_pool_size(),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl JobManagerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            workers: config.pool_size(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

struct Lifecycle {
    state: PoolState,
    workers: Vec<JoinHandle<()>>,
}

/// Controlador del pool de workers
pub struct JobManager {
    registry: Arc<JobRegistry>,
    queue: Arc<TaskQueue>,
    shutdown: ShutdownSignal,
    lifecycle: Mutex<Lifecycle>,

    /// Notifica cuando el estado llega a `Stopped`
    stopped: Condvar,
    worker_count: usize,
}

impl JobManager {
    /// Crea el pool e inicia los workers
    pub fn new(config: JobManagerConfig, store: Arc<dyn ResultStore>) -> Result<Self, PoolError> {
        let worker_count = config.workers.max(1);
        let registry = Arc::new(JobRegistry::new());
        let queue = Arc::new(TaskQueue::new());
        let shutdown = ShutdownSignal::new();

        let mut handles = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let worker = Worker::new(
                format!("worker-{}", i),
                Arc::clone(&queue),
                Arc::clone(&registry),
                Arc::clone(&store),
                shutdown.clone(),
                config.poll_interval,
            );

            let spawned = thread::Builder::new()
                .name(format!("job-worker-{}", i))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Detener los que sí arrancaron antes de fallar
                    shutdown.trigger();
                    queue.close();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(PoolError::Spawn(e.to_string()));
                }
            }
        }

        info!(workers = worker_count, "job pool started");

        Ok(Self {
            registry,
            queue,
            shutdown,
            lifecycle: Mutex::new(Lifecycle {
                state: PoolState::Active,
                workers: handles,
            }),
            stopped: Condvar::new(),
            worker_count,
        })
    }

    /// Encola una tarea y retorna su ID sin esperar la ejecución
    pub fn submit<F>(&self, task: F) -> Result<JobId, PoolError>
    where
        F: FnOnce() -> Result<Value, TaskError> + Send + 'static,
    {
        // El lock de lifecycle ordena submit contra shutdown: nada se encola
        // después de cerrar la cola.
        let lifecycle = self.lifecycle.lock();
        if lifecycle.state != PoolState::Active {
            return Err(PoolError::ShuttingDown);
        }

        let job_id = self.registry.allocate();
        self.queue.enqueue(QueueEntry::new(job_id, Box::new(task)));
        drop(lifecycle);

        info!(%job_id, "job added to the queue");
        Ok(job_id)
    }

    /// Obtiene el estado de un job
    pub fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, PoolError> {
        self.registry
            .get(job_id)
            .ok_or(PoolError::UnknownJob(*job_id))
    }

    /// Número de jobs en estado running
    pub fn running_count(&self) -> usize {
        self.registry.running_count()
    }

    /// Copia de `id -> estado` de todos los jobs
    pub fn jobs_snapshot(&self) -> BTreeMap<JobId, JobStatus> {
        self.registry.snapshot_all()
    }

    /// Handle compartido al registro (para tareas que lo inspeccionan)
    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn state(&self) -> PoolState {
        self.lifecycle.lock().state
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Shutdown ordenado
    ///
    /// Deja de aceptar jobs, espera a que los workers vacíen la cola y
    /// terminen, y a que toda entrada encolada quede procesada. Bloquea.
    /// Las tareas en curso no se interrumpen. Si otro hilo ya está drenando,
    /// espera a que ese hilo termine.
    pub fn shutdown(&self) {
        let workers = {
            let mut lifecycle = self.lifecycle.lock();
            match lifecycle.state {
                PoolState::Active => {
                    lifecycle.state = PoolState::Draining;
                    self.shutdown.trigger();
                    self.queue.close();
                    info!(pending = self.queue.len(), "graceful shutdown initiated");
                    std::mem::take(&mut lifecycle.workers)
                }
                PoolState::Draining => {
                    while lifecycle.state != PoolState::Stopped {
                        self.stopped.wait(&mut lifecycle);
                    }
                    return;
                }
                PoolState::Stopped => return,
            }
        };

        for handle in workers {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }

        self.queue.wait_drained();

        self.lifecycle.lock().state = PoolState::Stopped;
        self.stopped.notify_all();
        info!("job pool stopped");
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        if self.state() != PoolState::Stopped {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::storage::MemoryResultStore;
    use serde_json::json;
    use std::collections::HashSet;
    use std::time::Instant;

    fn manager(workers: usize) -> (JobManager, Arc<MemoryResultStore>) {
        let store = Arc::new(MemoryResultStore::new());
        let config = JobManagerConfig {
            workers,
            poll_interval: Duration::from_millis(20),
        };
        let manager = JobManager::new(config, store.clone()).unwrap();
        (manager, store)
    }

    fn wait_terminal(manager: &JobManager, id: &JobId) -> JobSnapshot {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let snapshot = manager.job_status(id).unwrap();
            if snapshot.is_terminal() || Instant::now() > deadline {
                return snapshot;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_submit_returns_distinct_ids() {
        let (manager, _) = manager(4);

        let ids: HashSet<_> = (0..100)
            .map(|i| manager.submit(move || Ok(json!(i))).unwrap())
            .collect();

        assert_eq!(ids.len(), 100);
        manager.shutdown();
    }

    #[test]
    fn test_job_result_is_recorded_and_persisted() {
        let (manager, store) = manager(2);

        let id = manager.submit(|| Ok(json!({"global_mean": 35.4}))).unwrap();
        let snapshot = wait_terminal(&manager, &id);

        assert_eq!(snapshot.status, JobStatus::Done);
        assert_eq!(snapshot.result, Some(json!({"global_mean": 35.4})));
        assert_eq!(store.get(&id), Some(json!({"global_mean": 35.4})));
    }

    #[test]
    fn test_unknown_job() {
        let (manager, _) = manager(1);

        let err = manager.job_status(&JobId::new(12345)).unwrap_err();
        assert_eq!(err, PoolError::UnknownJob(JobId::new(12345)));
    }

    #[test]
    fn test_running_until_task_finishes() {
        let (manager, _) = manager(1);
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let id = manager
            .submit(move || {
                release_rx.recv().map_err(|e| TaskError::Failed(e.to_string()))?;
                Ok(json!("released"))
            })
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(manager.job_status(&id).unwrap().status, JobStatus::Running);
        assert_eq!(manager.running_count(), 1);

        release_tx.send(()).unwrap();
        assert_eq!(wait_terminal(&manager, &id).status, JobStatus::Done);
        assert_eq!(manager.running_count(), 0);
    }

    #[test]
    fn test_failure_does_not_affect_other_jobs() {
        let (manager, _) = manager(2);

        let bad = manager
            .submit(|| {
                thread::sleep(Duration::from_millis(20));
                Err(TaskError::Failed("designed to fail".to_string()))
            })
            .unwrap();
        let good = manager
            .submit(|| {
                thread::sleep(Duration::from_millis(20));
                Ok(json!("fine"))
            })
            .unwrap();

        let bad = wait_terminal(&manager, &bad);
        let good = wait_terminal(&manager, &good);

        assert_eq!(bad.status, JobStatus::Error);
        assert_eq!(bad.error.as_deref(), Some("designed to fail"));
        assert_eq!(good.status, JobStatus::Done);
        assert_eq!(good.result, Some(json!("fine")));
    }

    #[test]
    fn test_panicking_task_keeps_worker_alive() {
        let (manager, _) = manager(1);

        let boom = manager.submit(|| panic!("boom")).unwrap();
        let after = manager.submit(|| Ok(json!(2))).unwrap();

        assert_eq!(wait_terminal(&manager, &boom).status, JobStatus::Error);
        assert_eq!(wait_terminal(&manager, &after).status, JobStatus::Done);
    }

    #[test]
    fn test_pool_of_two_runs_five_sleeping_tasks() {
        let (manager, _) = manager(2);

        let ids: Vec<_> = (0..5)
            .map(|i| {
                manager
                    .submit(move || {
                        thread::sleep(Duration::from_millis(30));
                        Ok(json!(i))
                    })
                    .unwrap()
            })
            .collect();

        let mut last = manager.running_count();
        assert!(last <= 5);
        loop {
            let now = manager.running_count();
            assert!(now <= last, "running count went up: {} -> {}", last, now);
            last = now;
            if now == 0 {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }

        for (i, id) in ids.iter().enumerate() {
            let snapshot = manager.job_status(id).unwrap();
            assert_eq!(snapshot.status, JobStatus::Done);
            assert_eq!(snapshot.result, Some(json!(i)));
        }
    }

    #[test]
    fn test_shutdown_with_no_jobs_is_prompt() {
        let (manager, _) = manager(4);
        let start = Instant::now();

        manager.shutdown();

        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(manager.state(), PoolState::Stopped);
    }

    #[test]
    fn test_shutdown_waits_for_submitted_jobs() {
        let (manager, _) = manager(2);

        let ids: Vec<_> = (0..6)
            .map(|i| {
                manager
                    .submit(move || {
                        thread::sleep(Duration::from_millis(25));
                        Ok(json!(i))
                    })
                    .unwrap()
            })
            .collect();

        manager.shutdown();

        for id in &ids {
            assert!(manager.job_status(id).unwrap().is_terminal());
        }
        assert_eq!(manager.running_count(), 0);
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let (manager, _) = manager(1);
        manager.shutdown();

        assert_eq!(manager.submit(|| Ok(json!(1))), Err(PoolError::ShuttingDown));
        assert!(manager.jobs_snapshot().is_empty());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (manager, _) = manager(2);
        manager.submit(|| Ok(json!(1))).unwrap();

        manager.shutdown();
        manager.shutdown();

        assert_eq!(manager.state(), PoolState::Stopped);
    }

    #[test]
    fn test_zero_workers_is_clamped_to_one() {
        let (manager, _) = manager(0);
        assert_eq!(manager.worker_count(), 1);

        let id = manager.submit(|| Ok(json!("ok"))).unwrap();
        assert_eq!(wait_terminal(&manager, &id).status, JobStatus::Done);
    }

    #[test]
    fn test_shutdown_racing_fresh_submits_always_returns() {
        for round in 0..200 {
            let store = Arc::new(MemoryResultStore::new());
            let config = JobManagerConfig {
                workers: 2,
                poll_interval: Duration::from_millis(1),
            };
            let manager = JobManager::new(config, store).unwrap();

            let ids: Vec<_> = (0..3)
                .map(|i| manager.submit(move || Ok(json!(i))).unwrap())
                .collect();

            let (done_tx, done_rx) = std::sync::mpsc::channel();
            thread::spawn(move || {
                manager.shutdown();
                let _ = done_tx.send(manager);
            });

            let manager = done_rx
                .recv_timeout(Duration::from_secs(10))
                .unwrap_or_else(|_| panic!("shutdown hung in round {}", round));

            assert!(manager.queue.is_empty());
            for id in &ids {
                assert_eq!(manager.job_status(id).unwrap().status, JobStatus::Done);
            }
        }
    }

    #[test]
    fn test_concurrent_shutdown_waits_for_workers_to_exit() {
        let (manager, store) = manager(2);
        let manager = Arc::new(manager);
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let id = manager
            .submit(move || {
                release_rx.recv().map_err(|e| TaskError::Failed(e.to_string()))?;
                Ok(json!("released"))
            })
            .unwrap();

        // Cada worker guarda un clon del store; al salir lo suelta
        let store_refs = Arc::downgrade(&store);
        drop(store);

        let callers: Vec<_> = (0..2)
            .map(|_| {
                let caller_manager = Arc::clone(&manager);
                let store_refs = store_refs.clone();
                let handle = thread::spawn(move || {
                    caller_manager.shutdown();
                    (caller_manager.state(), store_refs.strong_count())
                });
                let deadline = Instant::now() + Duration::from_secs(5);
                while manager.state() == PoolState::Active && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(1));
                }
                handle
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();

        for caller in callers {
            assert_eq!(caller.join().unwrap(), (PoolState::Stopped, 0));
        }
        assert_eq!(manager.job_status(&id).unwrap().status, JobStatus::Done);
    }
}
