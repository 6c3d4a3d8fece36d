//! Cooperative cancellation shared by every step of a run.

use crate::core::{InstallerError, InstallerResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Clonable cancellation flag threaded through the engine.
///
/// Long-running loops call [`CancelToken::check`] between units of work and
/// unwind with [`InstallerError::Cancelled`]. Async waits race
/// [`CancelToken::cancelled`] instead.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> InstallerResult<()> {
        if self.is_cancelled() {
            Err(InstallerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Completes once cancellation is requested.
    pub async fn cancelled(&self) {
        loop {
            // Registered before the flag is read, so a concurrent cancel is
            // never missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
