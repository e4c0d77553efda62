// Detached background work.
// Fire-and-forget tasks that the response path never waits on, drained at shutdown.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;

/// Set of detached tasks.
///
/// Each task runs inside its own error boundary: a panic is logged when the
/// task is reaped and never reaches the request that spawned it.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    set: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task without waiting for it.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(mut set) = self.set.lock() else {
            tracing::error!(task = name, "Background task set poisoned, dropping task");
            return;
        };

        // Reap whatever already finished so the set does not grow unbounded.
        while let Some(result) = set.try_join_next() {
            log_outcome(result);
        }

        set.spawn(async move {
            task.await;
            tracing::trace!(task = name, "Background task finished");
        });
    }

    /// Wait for every outstanding task to complete.
    pub async fn drain(&self) {
        let mut set = match self.set.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return,
        };

        if !set.is_empty() {
            tracing::info!(pending = set.len(), "Draining background tasks");
        }
        while let Some(result) = set.join_next().await {
            log_outcome(result);
        }
    }
}

fn log_outcome(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Background task failed");
    }
}
