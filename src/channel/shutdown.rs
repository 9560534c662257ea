//! Shutdown signal: the `done` flag plus a proactive wake of the worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    done: AtomicBool,
    wake: Notify,
}

/// Shared between the foreground (which triggers it) and the fetch worker
/// (which observes it).
///
/// A trigger that lands while the worker is between waits is not lost: the
/// wake is stored and completes the worker's next wait immediately.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `done` and wake the worker out of whatever it is waiting on.
    pub fn trigger(&self) {
        self.inner.done.store(true, Ordering::Release);
        self.inner.wake.notify_one();
    }

    /// Whether `trigger` has been called.
    pub fn is_triggered(&self) -> bool {
        self.inner.done.load(Ordering::Acquire)
    }

    /// Completes once [`trigger`](Self::trigger) has been called.
    pub async fn woken(&self) {
        self.inner.wake.notified().await;
    }
}
