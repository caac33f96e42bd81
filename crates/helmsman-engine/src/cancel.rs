//! Cooperative cancellation.
//!
//! A cancellation signal is observed only between attempts: an in-flight
//! backend call is never interrupted, since backends are black boxes
//! that may not be safely interruptible.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cancellation token.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<watch::Sender<Option<String>>>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    /// Request cancellation with a reason. The first reason wins.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.inner.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason.into());
                true
            } else {
                false
            }
        });
    }

    /// The cancellation reason, if cancellation was requested.
    pub fn cancelled(&self) -> Option<String> {
        self.inner.borrow().clone()
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.borrow().is_some()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
