//! Progress observer port
//!
//! Called synchronously after every action; implementations must not block.

use crate::domain::ActionOutcome;

/// Receives per-action progress notifications
pub trait IProgressObserver: Send + Sync {
    /// `index` is zero-based within a batch of `total` actions
    fn on_action_complete(&self, index: usize, total: usize, outcome: &ActionOutcome);
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl IProgressObserver for NoopProgress {
    fn on_action_complete(&self, _index: usize, _total: usize, _outcome: &ActionOutcome) {}
}
