//! SyncLogger - per-action sync log
//!
//! Every attempt produces a tracing event. When persistence is enabled the
//! attempt is also stored as a [`SyncLogEntry`] through the state
//! repository. Persistence errors are logged via `tracing::warn!` and never
//! propagated, so the log can never fail an action.

use std::sync::Arc;

use vaultsync_core::{
    config::LoggingConfig,
    domain::{LogStatus, SyncLogEntry},
    ports::{IStateRepository, ISyncLog},
};

/// Sync log backed by tracing and the state repository
pub struct SyncLogger {
    state_repo: Arc<dyn IStateRepository>,
    persist: bool,
}

impl SyncLogger {
    /// Creates a logger that persists every entry.
    pub fn new(state_repo: Arc<dyn IStateRepository>) -> Self {
        Self {
            state_repo,
            persist: true,
        }
    }

    /// Creates a logger honouring `logging.enabled`.
    pub fn from_config(state_repo: Arc<dyn IStateRepository>, config: &LoggingConfig) -> Self {
        Self {
            state_repo,
            persist: config.enabled,
        }
    }

    /// Returns true if entries are written to the repository
    pub fn is_persisting(&self) -> bool {
        self.persist
    }

    /// Persist an entry, swallowing errors with a tracing warning.
    async fn save(&self, entry: &SyncLogEntry) {
        if let Err(e) = self.state_repo.save_log_entry(entry).await {
            tracing::warn!(error = %e, "Failed to save sync log entry");
        }
    }
}

#[async_trait::async_trait]
impl ISyncLog for SyncLogger {
    async fn log(&self, action: &str, path: &str, status: LogStatus, error: Option<&str>) {
        let entry = SyncLogEntry::new(action, path, status, error.map(str::to_string));

        match status {
            LogStatus::Success => tracing::info!(action, path, "{}", entry.message()),
            LogStatus::Failure => tracing::warn!(action, path, "{}", entry.message()),
        }

        if self.persist {
            self.save(&entry).await;
        }
    }
}
