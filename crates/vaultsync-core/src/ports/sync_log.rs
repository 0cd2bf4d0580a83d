//! Sync log port
//!
//! Fire-and-forget: implementations absorb their own failures so that
//! logging can never fail an action.

use crate::domain::LogStatus;

/// Records one line per attempted action
#[async_trait::async_trait]
pub trait ISyncLog: Send + Sync {
    /// Record an attempt of `action` on `path`
    async fn log(&self, action: &str, path: &str, status: LogStatus, error: Option<&str>);
}
