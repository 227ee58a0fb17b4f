//! Cooperative cancellation for packing passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Returned by a packing pass that observed a cancelled token.
///
/// Not a failure: the pass was superseded and its partial output is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("layout pass cancelled")]
pub struct Cancelled;

/// Shared cancellation flag.
///
/// Packers call [`check`](Self::check) once per processed item, so
/// cancellation latency is bounded by the cost of one measurement.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone of this token observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Bail out with [`Cancelled`] if cancellation has been requested.
    #[inline]
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() { Err(Cancelled) } else { Ok(()) }
    }
}
