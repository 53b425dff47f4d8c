//! Cooperative cancellation for long-running operations (§5).
//!
//! `process_in_chunks`, `stream_pages`, and `extract_range` each accept an
//! optional [`CancellationHandle`], checked between chunks and between pages.
//! There are no built-in timeouts; callers that want one spawn a thread (or
//! use a signal handler) that calls [`CancellationHandle::cancel`] after
//! their own deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag a caller can flip to ask a long-running operation to stop
/// at its next suspension point. Cheap to clone; clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        CancellationHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let handle = CancellationHandle::new();
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let handle = CancellationHandle::new();
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
    }
}
