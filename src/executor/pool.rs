//! Fixed-size worker pool fed by a channel.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::{Executor, Task};

/// Statistics collected from the pool's workers on shutdown.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of tasks that ran to completion.
    pub tasks_completed: usize,
    /// Number of tasks that panicked.
    pub tasks_panicked: usize,
}

/// N background threads pulling tasks from a shared queue.
///
/// Dropping the pool closes the queue and joins every worker once queued
/// tasks have drained. Use [`WorkerPool::shutdown`] to collect stats.
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Task>>>,
    workers: Vec<JoinHandle<PoolStats>>,
}

impl WorkerPool {
    /// Spawn `threads` workers (at least one).
    pub fn new(threads: usize) -> Self {
        let (sender, receiver) = channel::<Task>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..threads.max(1))
            .filter_map(|i| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("docrepo-worker-{}", i))
                    .spawn(move || run_worker(i, receiver))
                    .map_err(|e| tracing::error!(worker = i, error = %e, "failed to spawn worker"))
                    .ok()
            })
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers,
        }
    }

    /// Number of live worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue, wait for the workers and return their combined stats.
    pub fn shutdown(mut self) -> PoolStats {
        self.close();
        self.join()
    }

    fn close(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }

    fn join(&mut self) -> PoolStats {
        self.workers
            .drain(..)
            .map(|worker| worker.join().unwrap_or_default())
            .fold(PoolStats::default(), |mut total, stats| {
                total.tasks_completed += stats.tasks_completed;
                total.tasks_panicked += stats.tasks_panicked;
                total
            })
    }
}

fn run_worker(id: usize, receiver: Arc<Mutex<Receiver<Task>>>) -> PoolStats {
    tracing::debug!(worker = id, "worker started");
    let mut stats = PoolStats::default();

    loop {
        let task = match receiver.lock() {
            Ok(queue) => queue.recv(),
            Err(_) => break,
        };
        let Ok(task) = task else {
            // Queue closed
            break;
        };

        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => stats.tasks_completed += 1,
            Err(_) => {
                stats.tasks_panicked += 1;
                tracing::error!(worker = id, "task panicked on worker");
            }
        }
    }

    tracing::debug!(
        worker = id,
        completed = stats.tasks_completed,
        panicked = stats.tasks_panicked,
        "worker stopped"
    );
    stats
}

impl Executor for WorkerPool {
    fn execute(&self, task: Task) {
        let sent = match self.sender.lock() {
            Ok(sender) => sender.as_ref().map(|s| s.send(task).is_ok()),
            Err(_) => None,
        };
        if sent != Some(true) {
            tracing::warn!("worker pool is shut down; task dropped");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
        self.join();
    }
}
