//! Cancellation handle accepted by every mutating operation.

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Observes a caller-owned `watch::Sender<bool>`; `true` means cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// Token driven by a shutdown or request-deadline channel.
    #[must_use]
    pub const fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Token that never fires.
    #[must_use]
    pub const fn never() -> Self {
        Self { rx: None }
    }

    /// Create a sender and its token.
    #[must_use]
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self::new(rx))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        // A dropped sender leaves the last value in place.
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// `Err(Error::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}
