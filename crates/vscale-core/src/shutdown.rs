//! Cancellation handle for blocking loops.
//!
//! Wraps the daemon's `watch::Receiver<bool>` shutdown channel so that poll
//! loops deep inside a scale attempt can race their sleeps against it.

use std::time::Duration;

use tokio::sync::watch;

use crate::error::Cancelled;

/// Cloneable view of the process shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl ShutdownSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A signal that never fires. Used by tests and one-shot tools.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether shutdown has already been requested.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once shutdown is requested.
    ///
    /// A dropped sender counts as shutdown: the daemon only drops it on exit.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sleep for `duration` unless shutdown is requested first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancelled() => Err(Cancelled),
        }
    }
}
