//! Per-run statistics

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::action::{ActionKind, ActionOutcome};
use super::newtypes::RunId;

/// Counters and timing for one sync run
///
/// One instance per run; never reused. `files_processed` counts every
/// attempted action whether it succeeded or not, while the per-kind
/// counters and `total_bytes` only move on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatistics {
    pub run_id: RunId,
    pub files_processed: u64,
    pub files_uploaded: u64,
    pub files_downloaded: u64,
    pub files_deleted: u64,
    pub total_bytes: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl SyncStatistics {
    /// Start a new run
    #[must_use]
    pub fn start() -> Self {
        Self {
            run_id: RunId::new(),
            files_processed: 0,
            files_uploaded: 0,
            files_downloaded: 0,
            files_deleted: 0,
            total_bytes: 0,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Count an attempted action
    pub fn record_attempt(&mut self) {
        self.files_processed += 1;
    }

    /// Count a successful upload of `bytes`
    pub fn record_upload(&mut self, bytes: u64) {
        self.files_uploaded += 1;
        self.total_bytes += bytes;
    }

    /// Count a successful download of `bytes`
    pub fn record_download(&mut self, bytes: u64) {
        self.files_downloaded += 1;
        self.total_bytes += bytes;
    }

    /// Count a verified delete
    pub fn record_delete(&mut self) {
        self.files_deleted += 1;
    }

    /// Account for one applied action
    pub fn record_outcome(&mut self, outcome: &ActionOutcome) {
        self.record_attempt();
        if let ActionOutcome::Succeeded { action, bytes } = outcome {
            match action.kind() {
                ActionKind::Upload => self.record_upload(*bytes),
                ActionKind::Download => self.record_download(*bytes),
                ActionKind::Delete => self.record_delete(),
            }
        }
    }

    /// Mark the run finished
    pub fn finish(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
    }

    /// Returns true once `finish` has been called
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Elapsed time, measured to now while the run is still going
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }

    /// Number of successful actions
    #[must_use]
    pub fn files_succeeded(&self) -> u64 {
        self.files_uploaded + self.files_downloaded + self.files_deleted
    }
}

impl Default for SyncStatistics {
    fn default() -> Self {
        Self::start()
    }
}
