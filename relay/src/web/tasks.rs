//! Tracked background work.
//!
//! Reply sends and the cold-start registration are spawned here instead of
//! being awaited by the request. Shutdown drains the set so nothing scheduled
//! is dropped mid-flight.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn `task` without waiting for it. Must be called inside a tokio runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.lock();

        // Reap finished tasks so the set only holds in-flight work.
        while let Some(result) = set.try_join_next() {
            log_join_result(result);
        }

        set.spawn(task);
    }

    /// True when no spawned task is left unreaped.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait for every task spawned so far.
    pub async fn drain(&self) {
        let mut set = std::mem::take(&mut *self.lock());
        let pending = set.len();

        while let Some(result) = set.join_next().await {
            log_join_result(result);
        }

        info!(drained = pending, "background_tasks_drained");
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, panicked = e.is_panic(), "background_task_failed");
    }
}
