//! # Worker
//! src/jobs/worker.rs
//!
//! Hilo de larga vida que saca tareas de la cola, las ejecuta, persiste el
//! resultado y entrega la completación al registro.

use crate::jobs::job::{JobCompletion, QueueEntry, TaskError};
use crate::jobs::queue::TaskQueue;
use crate::jobs::registry::JobRegistry;
use crate::jobs::storage::ResultStore;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Señal de shutdown compartida por todos los workers
///
/// Monótona: una vez activada no vuelve a `false`.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activa la señal; retorna `true` solo la primera vez
    pub fn trigger(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Unidad de ejecución del pool
pub struct Worker {
    name: String,
    queue: Arc<TaskQueue>,
    registry: Arc<JobRegistry>,
    store: Arc<dyn ResultStore>,
    shutdown: ShutdownSignal,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        name: String,
        queue: Arc<TaskQueue>,
        registry: Arc<JobRegistry>,
        store: Arc<dyn ResultStore>,
        shutdown: ShutdownSignal,
        poll_interval: Duration,
    ) -> Self {
        Self {
            name,
            queue,
            registry,
            store,
            shutdown,
            poll_interval,
        }
    }

    /// Loop principal del worker
    ///
    /// Termina cuando la señal ya estaba activa antes de un `dequeue` que no
    /// entregó nada. Todo `enqueue` ocurre antes de activar la señal, así que
    /// en ese punto la cola está vacía de verdad.
    pub fn run(self) {
        info!(worker = %self.name, "worker started");

        loop {
            // Leer la señal antes de desencolar, nunca después
            let stopping = self.shutdown.is_set();

            match self.queue.dequeue(self.poll_interval) {
                Some(entry) => {
                    let completion = self.process(entry);
                    self.registry.complete(completion);
                    self.queue.task_done();
                }
                None if stopping => break,
                None => continue,
            }
        }

        info!(worker = %self.name, "worker stopped");
    }

    /// Ejecuta una entrada y persiste su resultado
    fn process(&self, entry: QueueEntry) -> JobCompletion {
        let QueueEntry { job_id, task } = entry;
        debug!(worker = %self.name, %job_id, "picked up job");

        let result = panic::catch_unwind(AssertUnwindSafe(task))
            .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)));

        match result {
            Ok(value) => match self.store.write(&job_id, &value) {
                Ok(()) => {
                    info!(worker = %self.name, %job_id, "job done");
                    JobCompletion::done(job_id, value)
                }
                Err(e) => {
                    error!(worker = %self.name, %job_id, error = %e, "failed to persist result");
                    JobCompletion::failed(job_id, format!("failed to persist result: {}", e))
                }
            },
            Err(e) => {
                warn!(worker = %self.name, %job_id, error = %e, "job failed");
                JobCompletion::failed(job_id, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::storage::{MemoryResultStore, StoreError};
    use crate::jobs::types::{JobId, JobStatus};
    use serde_json::{json, Value};
    use std::thread;

    struct BrokenStore;

    impl ResultStore for BrokenStore {
        fn write(&self, _job_id: &JobId, _value: &Value) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    fn worker_with(store: Arc<dyn ResultStore>) -> (Worker, Arc<TaskQueue>, Arc<JobRegistry>, ShutdownSignal) {
        worker_polling(store, Duration::from_millis(10))
    }

    fn worker_polling(
        store: Arc<dyn ResultStore>,
        poll_interval: Duration,
    ) -> (Worker, Arc<TaskQueue>, Arc<JobRegistry>, ShutdownSignal) {
        let queue = Arc::new(TaskQueue::new());
        let registry = Arc::new(JobRegistry::new());
        let shutdown = ShutdownSignal::new();
        let worker = Worker::new(
            "test-0".to_string(),
            Arc::clone(&queue),
            Arc::clone(&registry),
            store,
            shutdown.clone(),
            poll_interval,
        );
        (worker, queue, registry, shutdown)
    }

    #[test]
    fn test_shutdown_signal_is_monotonic() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_set());
        assert!(signal.trigger());
        assert!(!signal.trigger());
        assert!(signal.clone().is_set());
    }

    #[test]
    fn test_process_success_persists_result() {
        let store = Arc::new(MemoryResultStore::new());
        let (worker, _, _, _) = worker_with(store.clone());
        let id = JobId::new(1);

        let completion = worker.process(QueueEntry::new(id, Box::new(|| Ok(json!({"x": 1})))));

        assert_eq!(completion, JobCompletion::done(id, json!({"x": 1})));
        assert_eq!(store.get(&id), Some(json!({"x": 1})));
    }

    #[test]
    fn test_process_failure_is_not_persisted() {
        let store = Arc::new(MemoryResultStore::new());
        let (worker, _, _, _) = worker_with(store.clone());
        let id = JobId::new(1);

        let completion = worker.process(QueueEntry::new(
            id,
            Box::new(|| Err(TaskError::Failed("bad question".to_string()))),
        ));

        assert_eq!(completion, JobCompletion::failed(id, "bad question"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_process_captures_panic() {
        let (worker, _, _, _) = worker_with(Arc::new(MemoryResultStore::new()));
        let id = JobId::new(1);

        let completion = worker.process(QueueEntry::new(id, Box::new(|| panic!("exploded"))));

        assert_eq!(completion, JobCompletion::failed(id, "task panicked: exploded"));
    }

    #[test]
    fn test_persistence_failure_reports_error() {
        let (worker, _, _, _) = worker_with(Arc::new(BrokenStore));
        let id = JobId::new(1);

        let completion = worker.process(QueueEntry::new(id, Box::new(|| Ok(json!(1)))));

        assert!(!completion.is_done());
        assert!(matches!(
            completion.outcome,
            crate::jobs::job::Outcome::Failed(ref d) if d.starts_with("failed to persist result")
        ));
    }

    #[test]
    fn test_run_drains_queue_before_exiting() {
        let (worker, queue, registry, shutdown) = worker_with(Arc::new(MemoryResultStore::new()));

        let ids: Vec<_> = (0..3)
            .map(|i| {
                let id = registry.allocate();
                queue.enqueue(QueueEntry::new(id, Box::new(move || Ok(json!(i)))));
                id
            })
            .collect();

        // Señal activa antes de arrancar: igual debe procesar lo encolado
        shutdown.trigger();
        queue.close();
        thread::spawn(move || worker.run()).join().unwrap();

        for id in ids {
            assert_eq!(registry.get(&id).unwrap().status, JobStatus::Done);
        }
        queue.wait_drained();
    }

    #[test]
    fn test_run_never_exits_with_entry_enqueued_right_before_shutdown() {
        // Sin espera en dequeue el worker pasa casi todo el tiempo entre un
        // timeout y la siguiente lectura de la señal
        for round in 0..2000 {
            let (worker, queue, registry, shutdown) =
                worker_polling(Arc::new(MemoryResultStore::new()), Duration::ZERO);
            let handle = thread::spawn(move || worker.run());

            let id = registry.allocate();
            queue.enqueue(QueueEntry::new(id, Box::new(move || Ok(json!(round)))));
            shutdown.trigger();
            queue.close();
            handle.join().unwrap();

            assert!(queue.is_empty(), "entry stranded in round {}", round);
            assert_eq!(registry.get(&id).unwrap().status, JobStatus::Done);
            queue.wait_drained();
        }
    }
}
