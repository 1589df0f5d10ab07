//! Cooperative cancellation for recompute runs.
//!
//! When a newer snapshot arrives while a run is in flight, the caller
//! cancels the old token and starts a fresh run. The pipeline polls the
//! token between stages; a completed stage is never rolled back, its output
//! is simply discarded with the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Cloning hands out another handle to the same
/// flag; cancellation is one-way and permanent for a given token.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
