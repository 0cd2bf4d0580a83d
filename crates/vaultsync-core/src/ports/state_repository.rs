//! State repository port (driven/secondary port)
//!
//! This module defines the interface for persisting sync state, the sync
//! log, pending failures and run history.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific.
//! - File records are written one at a time as actions succeed, so an
//!   interrupted run keeps everything it already completed.
//! - `replace_failures` swaps the whole pending-failure set; the retry
//!   path reads it back with `load_failures`.

use chrono::{DateTime, Utc};

use crate::domain::{
    newtypes::ObjectPath, ActionFailure, FileRecord, RunRecord, SyncLogEntry, SyncState,
};

/// Port for durable sync bookkeeping
#[async_trait::async_trait]
pub trait IStateRepository: Send + Sync {
    // --- sync state ---

    /// Load the full persisted state
    async fn load_state(&self) -> anyhow::Result<SyncState>;

    /// Insert or replace the last-known record of a path
    async fn record_file(&self, record: &FileRecord) -> anyhow::Result<()>;

    /// Remove a path from the state
    async fn forget_file(&self, path: &ObjectPath) -> anyhow::Result<()>;

    /// Store the completion time of the latest run
    async fn set_last_sync(&self, at: DateTime<Utc>) -> anyhow::Result<()>;

    // --- sync log ---

    /// Append a log entry, returning its row id
    async fn save_log_entry(&self, entry: &SyncLogEntry) -> anyhow::Result<i64>;

    /// Most recent entries, newest first
    async fn recent_log_entries(&self, limit: u32) -> anyhow::Result<Vec<SyncLogEntry>>;

    /// Delete all log entries, returning how many were removed
    async fn clear_log(&self) -> anyhow::Result<u64>;

    // --- pending failures ---

    /// Replace the stored failure set
    async fn replace_failures(&self, failures: &[ActionFailure]) -> anyhow::Result<()>;

    /// Load the stored failure set
    async fn load_failures(&self) -> anyhow::Result<Vec<ActionFailure>>;

    // --- run history ---

    /// Store the summary of a finished run
    async fn save_run(&self, run: &RunRecord) -> anyhow::Result<()>;

    /// Most recent runs, newest first
    async fn recent_runs(&self, limit: u32) -> anyhow::Result<Vec<RunRecord>>;
}
