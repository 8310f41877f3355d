//! # Cola de Tareas
//! src/jobs/queue.rs
//!
//! Cola FIFO thread-safe y sin límite entre quienes encolan y los workers.
//!
//! - `enqueue` nunca bloquea.
//! - `dequeue(timeout)` bloquea como máximo `timeout`, así los workers pueden
//!   revisar periódicamente la señal de shutdown.
//! - `task_done` + `wait_drained` permiten esperar a que todo lo encolado
//!   haya sido procesado.

use crate::jobs::job::QueueEntry;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

struct QueueState {
    entries: VecDeque<QueueEntry>,
    /// Entradas encoladas que aún no se marcaron con `task_done`
    unfinished: usize,
    /// Una vez cerrada, `dequeue` no espera si la cola está vacía
    closed: bool,
}

/// Cola FIFO de tareas
pub struct TaskQueue {
    state: Mutex<QueueState>,

    /// Notifica a los workers cuando hay nuevas entradas
    available: Condvar,

    /// Notifica cuando `unfinished` llega a 0
    drained: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                unfinished: 0,
                closed: false,
            }),
            available: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    /// Encola una entrada al final
    pub fn enqueue(&self, entry: QueueEntry) {
        let mut state = self.state.lock();
        state.entries.push_back(entry);
        state.unfinished += 1;

        // Notificar a un worker esperando
        self.available.notify_one();
    }

    /// Desencola la entrada más antigua
    ///
    /// Bloquea hasta `timeout`. Retorna `None` si no llegó nada, o de
    /// inmediato si la cola está cerrada y vacía.
    pub fn dequeue(&self, timeout: Duration) -> Option<QueueEntry> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        loop {
            if let Some(entry) = state.entries.pop_front() {
                return Some(entry);
            }

            if state.closed {
                return None;
            }

            if self.available.wait_until(&mut state, deadline).timed_out() {
                return state.entries.pop_front();
            }
        }
    }

    /// Marca una entrada desencolada como completamente procesada
    pub fn task_done(&self) {
        let mut state = self.state.lock();

        if state.unfinished == 0 {
            tracing::error!("task_done called more times than entries were enqueued");
            return;
        }

        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.drained.notify_all();
        }
    }

    /// Cierra la cola y despierta a todos los workers
    ///
    /// Las entradas pendientes se siguen entregando.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Bloquea hasta que todas las entradas encoladas hayan sido procesadas
    pub fn wait_drained(&self) {
        let mut state = self.state.lock();
        while state.unfinished > 0 {
            self.drained.wait(&mut state);
        }
    }

    /// Entradas esperando ser desencoladas
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::JobId;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn entry(seq: u64) -> QueueEntry {
        QueueEntry::new(JobId::new(seq), Box::new(move || Ok(json!(seq))))
    }

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new();
        for seq in 1..=3 {
            queue.enqueue(entry(seq));
        }

        let order: Vec<u64> = (0..3)
            .map(|_| queue.dequeue(Duration::from_millis(10)).unwrap().job_id.seq())
            .collect();

        assert_eq!(order, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_times_out_on_empty_queue() {
        let queue = TaskQueue::new();
        let start = Instant::now();

        assert!(queue.dequeue(Duration::from_millis(50)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_dequeue_wakes_up_on_enqueue() {
        let queue = Arc::new(TaskQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        queue.enqueue(entry(7));

        let got = consumer.join().unwrap().expect("entry");
        assert_eq!(got.job_id, JobId::new(7));
    }

    #[test]
    fn test_closed_queue_still_delivers_pending_entries() {
        let queue = TaskQueue::new();
        queue.enqueue(entry(1));
        queue.close();

        assert!(queue.is_closed());
        assert!(queue.dequeue(Duration::from_secs(5)).is_some());

        // Cerrada y vacía: retorna sin esperar el timeout
        let start = Instant::now();
        assert!(queue.dequeue(Duration::from_secs(5)).is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_close_wakes_blocked_consumer() {
        let queue = Arc::new(TaskQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let start = Instant::now();
                let got = queue.dequeue(Duration::from_secs(10));
                (got.is_none(), start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();

        let (empty, waited) = consumer.join().unwrap();
        assert!(empty);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_wait_drained() {
        let queue = Arc::new(TaskQueue::new());
        for seq in 1..=5 {
            queue.enqueue(entry(seq));
        }

        let worker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                while let Some(entry) = queue.dequeue(Duration::from_millis(50)) {
                    let _ = (entry.task)();
                    queue.task_done();
                }
            })
        };

        queue.wait_drained();
        assert!(queue.is_empty());
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_drained_on_empty_queue_returns() {
        let queue = TaskQueue::new();
        queue.wait_drained();
    }

    #[test]
    fn test_each_entry_delivered_once() {
        let queue = Arc::new(TaskQueue::new());
        for seq in 1..=200 {
            queue.enqueue(entry(seq));
        }
        queue.close();

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut got = Vec::new();
                    while let Some(entry) = queue.dequeue(Duration::from_millis(10)) {
                        got.push(entry.job_id.seq());
                        queue.task_done();
                    }
                    got
                })
            })
            .collect();

        let mut all: Vec<u64> = consumers
            .into_iter()
            .flat_map(|c| c.join().unwrap())
            .collect();
        all.sort_unstable();

        assert_eq!(all, (1..=200).collect::<Vec<_>>());
        queue.wait_drained();
    }
}
