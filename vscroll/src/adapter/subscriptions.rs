//! Registry of the background tasks a data source owns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Tasks spawned on behalf of one data source.
///
/// Closing the registry cancels its token and aborts every registered task.
/// Only the first close has any effect.
#[derive(Debug, Default)]
pub(crate) struct Subscriptions {
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Subscriptions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Token cancelled when the registry closes.
    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Register a task. Aborts it right away if the registry is closed.
    pub(crate) fn add(&self, task: JoinHandle<()>) {
        if self.is_closed() {
            task.abort();
            return;
        }
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    /// Number of registered tasks still running.
    pub(crate) fn active(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Cancel and abort everything. Returns `false` if already closed.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            task.abort();
        }
        true
    }
}
