//! Cooperative cancellation for page renders.
//!
//! A render checks its token between units of work and gives up quietly
//! once it has been cancelled. [`RenderSlot`] holds the token of the one
//! render allowed in flight on a surface: claiming the slot cancels whoever
//! held it before.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent; every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True if both tokens share one flag.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

/// The single in-flight render of one raster surface.
#[derive(Debug, Default)]
pub struct RenderSlot {
    current: Mutex<Option<CancellationToken>>,
}

impl RenderSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the previous holder, if any, and hand out a fresh token.
    pub fn claim(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Clear the slot if `token` still holds it. A newer claim is left alone.
    pub fn release(&self, token: &CancellationToken) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|held| held.same_as(token)) {
            *current = None;
        }
    }

    /// Cancel whatever is in flight and leave the slot empty.
    pub fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.cancel();
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

#[cfg(test)]
#[path = "cancel_test.rs"]
mod cancel_test;
