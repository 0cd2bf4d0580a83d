//! Run reports and run history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::{ActionFailure, RemoteOrphan, SyncAction};
use super::newtypes::{ObjectPath, RunId};
use super::stats::SyncStatistics;

/// Outcome of one executed batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Counters and timing
    pub statistics: SyncStatistics,
    /// Actions that completed
    pub completed: Vec<SyncAction>,
    /// Actions that failed, in execution order
    pub failures: Vec<ActionFailure>,
    /// Actions not attempted because the run was cancelled
    pub not_attempted: Vec<SyncAction>,
    /// Orphans left in place this run
    pub skipped_orphans: Vec<ObjectPath>,
    /// True if cancellation stopped the batch early
    pub cancelled: bool,
    /// Set when the batch ran but its outcome could not be stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_error: Option<String>,
}

impl SyncReport {
    /// Start an empty report around fresh statistics
    #[must_use]
    pub fn new(statistics: SyncStatistics) -> Self {
        Self {
            statistics,
            completed: Vec::new(),
            failures: Vec::new(),
            not_attempted: Vec::new(),
            skipped_orphans: Vec::new(),
            cancelled: false,
            state_error: None,
        }
    }

    /// Returns true if any action failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns true if every planned action ran and succeeded
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Planned work of a run, before execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncPreview {
    /// Actions the reconciler emitted
    pub actions: Vec<SyncAction>,
    /// Remote objects with no local counterpart
    pub orphans: Vec<RemoteOrphan>,
}

impl SyncPreview {
    /// Returns true if there is nothing to do
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.orphans.is_empty()
    }
}

/// Persisted summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub files_processed: u64,
    pub files_uploaded: u64,
    pub files_downloaded: u64,
    pub files_deleted: u64,
    pub total_bytes: u64,
    pub failures: u64,
    pub cancelled: bool,
}

impl From<&SyncReport> for RunRecord {
    fn from(report: &SyncReport) -> Self {
        let stats = &report.statistics;
        Self {
            run_id: stats.run_id,
            started_at: stats.start_time,
            ended_at: stats.end_time,
            files_processed: stats.files_processed,
            files_uploaded: stats.files_uploaded,
            files_downloaded: stats.files_downloaded,
            files_deleted: stats.files_deleted,
            total_bytes: stats.total_bytes,
            failures: report.failures.len() as u64,
            cancelled: report.cancelled,
        }
    }
}
