//! Unbounded FIFO job queue: many producers, one consumer.
//!
//! Enqueueing never blocks and never rejects. The consumer side is held by
//! the worker alone; `recv` suspends while the queue is empty. The pending
//! count is approximate and exposed for user feedback only, never for flow
//! control.

use crate::task::Task;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Producer handle, cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Task>,
    pending: Arc<AtomicUsize>,
}

/// The single consumer end, moved into the worker.
pub struct JobConsumer {
    rx: mpsc::UnboundedReceiver<Task>,
    pending: Arc<AtomicUsize>,
}

/// Creates a connected producer/consumer pair.
pub fn job_queue() -> (JobQueue, JobConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));
    (
        JobQueue {
            tx,
            pending: pending.clone(),
        },
        JobConsumer { rx, pending },
    )
}

impl JobQueue {
    /// Adds a task to the back of the queue. Never blocks; only fails if
    /// the worker has gone away entirely.
    pub fn enqueue(&self, task: Task) -> bool {
        if self.tx.send(task).is_ok() {
            self.pending.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Approximate number of tasks waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobConsumer {
    /// Removes the next task in enqueue order, suspending while the queue
    /// is empty. Returns None once every producer has been dropped.
    pub async fn recv(&mut self) -> Option<Task> {
        let task = self.rx.recv().await;
        if task.is_some() {
            self.pending.fetch_sub(1, Ordering::Relaxed);
        }
        task
    }
}
