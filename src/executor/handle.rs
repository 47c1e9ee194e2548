use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crate::error::RepositoryError;

use super::Executor;

/// Completion handle for an asynchronous repository call.
///
/// Returned immediately by async contract methods. The call itself runs on
/// the registry's [`Executor`]; its result, error or panic is delivered
/// here exactly once.
pub struct AsyncHandle<T> {
    receiver: Receiver<Result<T, RepositoryError>>,
}

impl<T: Send + 'static> AsyncHandle<T> {
    /// Run `job` on `executor` and return a handle to its result.
    pub fn spawn<F>(executor: &dyn Executor, job: F) -> Self
    where
        F: FnOnce() -> Result<T, RepositoryError> + Send + 'static,
    {
        let (sender, receiver) = sync_channel(1);
        executor.execute(Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::error!(panic = %message, "asynchronous repository call panicked");
                Err(RepositoryError::Async(message))
            });
            // The caller may have dropped the handle.
            let _ = sender.send(result);
        }));
        Self { receiver }
    }

    /// A handle that is already complete.
    pub fn ready(result: Result<T, RepositoryError>) -> Self {
        let (sender, receiver) = sync_channel(1);
        let _ = sender.send(result);
        Self { receiver }
    }

    /// Block until the call completes.
    pub fn wait(self) -> Result<T, RepositoryError> {
        self.receiver.recv().unwrap_or_else(|_| Err(dropped()))
    }

    /// Block for at most `timeout`. `None` means the call is still running
    /// and the handle can be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, RepositoryError>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(dropped())),
        }
    }

    /// Poll without blocking.
    pub fn try_wait(&self) -> Option<Result<T, RepositoryError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(dropped())),
        }
    }
}

impl<T> fmt::Debug for AsyncHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncHandle").finish_non_exhaustive()
    }
}

fn dropped() -> RepositoryError {
    RepositoryError::Async("task was dropped before completing".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
