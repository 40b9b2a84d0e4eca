//! Progress reporting for batch resolution.
//!
//! The lookup crate only reports progress through [`ProgressCallback`];
//! rendering (terminal bars, logging, nothing) is chosen by the caller.

use std::sync::Arc;

/// Receives progress updates from a running batch.
///
/// Shared across blocking worker tasks, so implementations must be
/// `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total number of locations in the batch.
    fn set_total(&self, total: u64);

    /// Advances by `delta` resolved locations.
    fn inc(&self, delta: u64);

    /// Replaces the status message.
    fn set_message(&self, msg: String);

    /// Marks the batch as complete.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
