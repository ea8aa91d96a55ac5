//! Tracking for fire-and-forget background work.
//!
//! # Design
//! - Callers get "scheduled", never "finished"; the tracker keeps the join handles so
//!   panics are logged and shutdown can wait for in-flight work.
//! - Finished tasks are reaped on every spawn so the set stays bounded by in-flight work.

use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, error, info_span};

/// Set of background tasks owned by the coordinator.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` on the current runtime under a span labelled `label`.
    pub fn spawn<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.set();
        while let Some(result) = set.try_join_next() {
            log_join(result);
        }
        set.spawn(task.instrument(info_span!("background", task = label)));
    }

    /// Tasks spawned and not yet reaped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set().len()
    }

    /// Whether no task is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every outstanding task, including tasks spawned while waiting.
    pub async fn shutdown(&self) {
        loop {
            let mut pending = mem::take(&mut *self.set());
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                log_join(result);
            }
        }
    }

    fn set(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(err) = result
        && err.is_panic()
    {
        error!(error = %err, "background task panicked");
    }
}
