//! Executors run asynchronous repository calls off the caller's thread.
//!
//! The registry owns one `Arc<dyn Executor>` and hands every async call to
//! it as a boxed task. Completion is observed through an [`AsyncHandle`].
//!
//! ## Example
//!
//! ```ignore
//! use docrepo::{InMemoryDocumentStore, RepositoryRegistry, WorkerPool};
//! use std::sync::Arc;
//!
//! let registry = RepositoryRegistry::builder(Arc::new(InMemoryDocumentStore::new()))
//!     .executor(Arc::new(WorkerPool::new(4)))
//!     .build();
//! ```

mod handle;
mod pool;

use std::thread;

pub use handle::AsyncHandle;
pub use pool::{PoolStats, WorkerPool};

/// A unit of work submitted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks somewhere other than the calling thread.
///
/// No ordering between tasks is guaranteed.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Spawns one named thread per task.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn execute(&self, task: Task) {
        // The closure is moved into the builder, so a failed spawn cannot
        // give the task back; the handle then reports the dropped task.
        if let Err(e) = thread::Builder::new()
            .name("docrepo-task".to_string())
            .spawn(task)
        {
            tracing::error!(error = %e, "failed to spawn repository task thread");
        }
    }
}
