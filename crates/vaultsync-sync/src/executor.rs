//! Action executor
//!
//! Applies [`SyncAction`]s one at a time against the remote store, the vault
//! and the state repository.
//!
//! ## Failure isolation
//!
//! A failed action never stops the batch: the error is captured as an
//! [`ActionFailure`] and the next action runs. `files_processed` counts
//! every attempt; the per-kind counters count successes only.
//!
//! ## Deletes
//!
//! Every stored version whose name equals the path is deleted, then the
//! version listing is read again (with backoff) until no exact match is
//! left. A delete that still sees versions fails with
//! [`SyncError::IncompleteDelete`]; it is never reported as a success.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vaultsync_core::domain::{
    newtypes::ObjectPath, ActionFailure, ActionKind, ActionOutcome, ContentHasher, FileRecord,
    LogStatus, SyncAction, SyncError, SyncReport, SyncStatistics,
};
use vaultsync_core::ports::{
    Authorization, ILocalFileSystem, IProgressObserver, IRemoteStore, IStateRepository, ISyncLog,
    ObjectVersion,
};

use crate::retry::{with_backoff, VERIFY_DELAYS};

/// Applies actions sequentially
pub struct ActionExecutor {
    remote: Arc<dyn IRemoteStore>,
    local: Arc<dyn ILocalFileSystem>,
    state: Arc<dyn IStateRepository>,
    log: Arc<dyn ISyncLog>,
    verify_delays: Vec<Duration>,
}

impl ActionExecutor {
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        local: Arc<dyn ILocalFileSystem>,
        state: Arc<dyn IStateRepository>,
        log: Arc<dyn ISyncLog>,
    ) -> Self {
        Self {
            remote,
            local,
            state,
            log,
            verify_delays: VERIFY_DELAYS.to_vec(),
        }
    }

    /// Applies one action and logs the attempt
    #[tracing::instrument(skip(self, auth), fields(action = %action))]
    pub async fn apply(&self, action: &SyncAction, auth: &Authorization) -> ActionOutcome {
        let path = action.path();
        let result = match action.kind() {
            ActionKind::Upload => self.upload(path, auth).await,
            ActionKind::Download => self.download(path, auth).await,
            ActionKind::Delete => self.delete(path, auth).await,
        };

        match result {
            Ok(bytes) => {
                debug!(bytes, "Action succeeded");
                self.log
                    .log(action.kind().as_str(), path.as_str(), LogStatus::Success, None)
                    .await;
                ActionOutcome::Succeeded {
                    action: action.clone(),
                    bytes,
                }
            }
            Err(err) => {
                let failure = match SyncError::find_in(&err) {
                    Some(incomplete @ SyncError::IncompleteDelete { .. }) => incomplete.clone(),
                    _ => SyncError::ActionFailed {
                        path: path.to_string(),
                        cause: format!("{err:#}"),
                    },
                };
                let msg = failure.to_string();
                warn!(%msg);
                self.log
                    .log(
                        action.kind().as_str(),
                        path.as_str(),
                        LogStatus::Failure,
                        Some(&msg),
                    )
                    .await;
                ActionOutcome::Failed(ActionFailure::new(action, msg))
            }
        }
    }

    /// Applies every action in order, stopping early only on cancellation
    ///
    /// Cancellation is checked between actions; actions not yet started are
    /// reported as not attempted.
    pub async fn run_batch(
        &self,
        actions: &[SyncAction],
        auth: &Authorization,
        statistics: SyncStatistics,
        progress: &dyn IProgressObserver,
        cancel: &CancellationToken,
    ) -> SyncReport {
        let total = actions.len();
        let mut report = SyncReport::new(statistics);

        for (index, action) in actions.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(remaining = total - index, "Cancelled, leaving remaining actions");
                report.cancelled = true;
                report.not_attempted.extend(actions[index..].iter().cloned());
                break;
            }

            let outcome = self.apply(action, auth).await;
            report.statistics.record_outcome(&outcome);
            match &outcome {
                ActionOutcome::Succeeded { action, .. } => report.completed.push(action.clone()),
                ActionOutcome::Failed(failure) => report.failures.push(failure.clone()),
            }
            progress.on_action_complete(index, total, &outcome);
        }

        report.statistics.finish();
        info!(
            processed = report.statistics.files_processed,
            uploaded = report.statistics.files_uploaded,
            downloaded = report.statistics.files_downloaded,
            deleted = report.statistics.files_deleted,
            bytes = report.statistics.total_bytes,
            failures = report.failures.len(),
            cancelled = report.cancelled,
            "Batch finished"
        );
        report
    }

    // ========================================================================
    // Per-kind actions
    // ========================================================================

    async fn upload(&self, path: &ObjectPath, auth: &Authorization) -> Result<u64> {
        let local_modified = self
            .local
            .modified(path)
            .await
            .context("Failed to stat local file")?;
        let content = self
            .local
            .read(path)
            .await
            .context("Failed to read local file")?;
        let fingerprint = ContentHasher::fingerprint(&content);
        let size = content.len() as u64;

        let target = self.remote.get_upload_target(auth).await?;
        self.remote
            .upload_object(&target, path, &content, &fingerprint, local_modified)
            .await?;

        let modified = match self.local.touch(path).await {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to refresh modification time");
                Utc::now()
            }
        };
        self.state
            .record_file(&FileRecord::new(path.clone(), fingerprint, modified, size))
            .await
            .context("Failed to update sync state")?;
        Ok(size)
    }

    async fn download(&self, path: &ObjectPath, auth: &Authorization) -> Result<u64> {
        let content = self.remote.download_object(auth, path).await?;
        self.local
            .write(path, &content)
            .await
            .context("Failed to write local file")?;

        self.state
            .record_file(&FileRecord::from_content(path.clone(), &content, Utc::now()))
            .await
            .context("Failed to update sync state")?;
        Ok(content.len() as u64)
    }

    async fn delete(&self, path: &ObjectPath, auth: &Authorization) -> Result<u64> {
        let versions = self.exact_versions(path, auth).await?;
        if versions.is_empty() {
            anyhow::bail!("{path} not found in bucket");
        }

        for version in &versions {
            self.remote.delete_object_version(auth, version).await?;
        }
        debug!(versions = versions.len(), "Versions deleted, verifying");

        self.verify_deleted(path, auth).await?;
        self.state
            .forget_file(path)
            .await
            .context("Failed to update sync state")?;
        Ok(0)
    }

    /// Versions whose stored name equals `path` (the listing is by prefix)
    async fn exact_versions(
        &self,
        path: &ObjectPath,
        auth: &Authorization,
    ) -> Result<Vec<ObjectVersion>> {
        Ok(self
            .remote
            .list_object_versions(auth, path)
            .await?
            .into_iter()
            .filter(|version| version.file_name == path.as_str())
            .collect())
    }

    async fn verify_deleted(&self, path: &ObjectPath, auth: &Authorization) -> Result<()> {
        with_backoff("verify_delete", &self.verify_delays, || async move {
            let remaining = self.exact_versions(path, auth).await?.len();
            if remaining > 0 {
                return Err(SyncError::IncompleteDelete {
                    path: path.to_string(),
                    remaining,
                }
                .into());
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultsync_core::ports::NoopProgress;

    use crate::testing::{auth, path, FakeFs, FakeRemote, FakeState, RecordingLog, RecordingProgress};

    struct Fixture {
        remote: Arc<FakeRemote>,
        fs: Arc<FakeFs>,
        state: Arc<FakeState>,
        log: Arc<RecordingLog>,
        executor: ActionExecutor,
    }

    fn setup_with(remote: FakeRemote) -> Fixture {
        let remote = Arc::new(remote);
        let fs = Arc::new(FakeFs::new());
        let state = Arc::new(FakeState::new());
        let log = Arc::new(RecordingLog::default());
        let executor = ActionExecutor::new(remote.clone(), fs.clone(), state.clone(), log.clone());
        Fixture {
            remote,
            fs,
            state,
            log,
            executor,
        }
    }

    fn setup() -> Fixture {
        setup_with(FakeRemote::new())
    }

    #[tokio::test]
    async fn test_upload_records_state_and_touches() {
        let f = setup();
        f.fs.put("notes/a.md", b"hello");

        let outcome = f
            .executor
            .apply(&SyncAction::upload(path("notes/a.md")), &auth())
            .await;

        assert_eq!(
            outcome,
            ActionOutcome::Succeeded {
                action: SyncAction::upload(path("notes/a.md")),
                bytes: 5
            }
        );
        assert_eq!(f.remote.content("notes/a.md").unwrap(), b"hello");
        assert_eq!(f.fs.touches(), 1);
        let state = f.state.state.lock().unwrap();
        let record = state.get(&path("notes/a.md")).unwrap();
        assert_eq!(record.fingerprint, ContentHasher::fingerprint(b"hello"));
        assert_eq!(record.size, 5);

        let lines = f.log.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "upload");
        assert_eq!(lines[0].2, LogStatus::Success);
    }

    #[tokio::test]
    async fn test_upload_sends_local_mtime_not_clock() {
        let f = setup();
        let edited = Utc::now() - chrono::Duration::days(3);
        f.fs.put_with_mtime("a.md", b"old edit", edited);

        let outcome = f
            .executor
            .apply(&SyncAction::upload(path("a.md")), &auth())
            .await;

        assert!(outcome.is_success());
        assert_eq!(f.remote.src_modified("a.md"), Some(edited));
    }

    #[tokio::test]
    async fn test_download_writes_and_records() {
        let f = setup();
        f.remote.put("b.md", b"remote text");

        let outcome = f
            .executor
            .apply(&SyncAction::download(path("b.md")), &auth())
            .await;

        assert!(outcome.is_success());
        assert_eq!(f.fs.content("b.md").unwrap(), b"remote text");
        let state = f.state.state.lock().unwrap();
        assert_eq!(
            state.get(&path("b.md")).unwrap().fingerprint,
            ContentHasher::fingerprint(b"remote text")
        );
    }

    #[tokio::test]
    async fn test_delete_removes_every_version() {
        let f = setup();
        f.remote.put("b.md", b"v1");
        f.remote.put("b.md", b"v2");
        f.remote.put("b.md.bak", b"sibling");
        f.state
            .state
            .lock()
            .unwrap()
            .record(FileRecord::from_content(path("b.md"), b"v2", Utc::now()));

        let outcome = f
            .executor
            .apply(&SyncAction::delete(path("b.md")), &auth())
            .await;

        assert!(outcome.is_success());
        assert_eq!(f.remote.version_count("b.md"), 0);
        assert_eq!(f.remote.version_count("b.md.bak"), 1);
        assert!(f.state.state.lock().unwrap().get(&path("b.md")).is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_path_fails() {
        let f = setup();
        let outcome = f
            .executor
            .apply(&SyncAction::delete(path("nope.md")), &auth())
            .await;

        match outcome {
            ActionOutcome::Failed(failure) => {
                assert!(failure.error.contains("not found in bucket"));
                assert_eq!(failure.kind, ActionKind::Delete);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_incomplete_when_version_survives() {
        let f = setup_with(FakeRemote::new().with_sticky_delete());
        f.remote.put("b.md", b"v1");

        let mut statistics = SyncStatistics::start();
        let outcome = f
            .executor
            .apply(&SyncAction::delete(path("b.md")), &auth())
            .await;
        statistics.record_outcome(&outcome);

        match outcome {
            ActionOutcome::Failed(failure) => {
                assert!(failure.error.contains("Failed to delete all versions"));
                assert!(failure.error.contains("1 remaining"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(statistics.files_deleted, 0);
        assert_eq!(f.log.lines.lock().unwrap()[0].2, LogStatus::Failure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_succeeds_once_listing_catches_up() {
        let f = setup_with(FakeRemote::new().with_lagging_listing(2));
        f.remote.put("b.md", b"v1");
        f.remote.put("b.md", b"v2");

        let started = tokio::time::Instant::now();
        let mut statistics = SyncStatistics::start();
        let outcome = f
            .executor
            .apply(&SyncAction::delete(path("b.md")), &auth())
            .await;
        statistics.record_outcome(&outcome);

        assert!(outcome.is_success(), "{outcome:?}");
        assert_eq!(statistics.files_deleted, 1);
        assert_eq!(f.remote.version_count("b.md"), 0);
        // two stale reads: waited 500ms then 1s
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
        assert_eq!(f.log.lines.lock().unwrap()[0].2, LogStatus::Success);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let f = setup();
        let names = ["a.md", "b.md", "c.md", "d.md", "e.md"];
        for name in names {
            f.fs.put(name, name.as_bytes());
        }
        f.remote.fail_path("c.md");
        let actions: Vec<SyncAction> = names.iter().map(|n| SyncAction::upload(path(n))).collect();
        let progress = RecordingProgress::default();

        let report = f
            .executor
            .run_batch(
                &actions,
                &auth(),
                SyncStatistics::start(),
                &progress,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, path("c.md"));
        assert_eq!(report.completed.len(), 4);
        assert_eq!(report.statistics.files_processed, 5);
        assert_eq!(report.statistics.files_uploaded, 4);
        assert!(report.statistics.is_finished());
        assert!(f.remote.content("d.md").is_some());
        assert!(f.remote.content("e.md").is_some());

        let calls = progress.calls.lock().unwrap();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[2], (2, 5, false));
        assert_eq!(f.log.lines.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_batch_statistics_count_attempts_and_bytes() {
        let f = setup();
        f.fs.put("small.md", &[b'a'; 100]);
        f.fs.put("large.md", &[b'b'; 250]);
        let actions = vec![
            SyncAction::upload(path("small.md")),
            SyncAction::upload(path("large.md")),
            SyncAction::download(path("missing.md")),
        ];

        let report = f
            .executor
            .run_batch(
                &actions,
                &auth(),
                SyncStatistics::start(),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await;

        let stats = &report.statistics;
        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_uploaded, 2);
        assert_eq!(stats.files_downloaded, 0);
        assert_eq!(stats.total_bytes, 350);
    }

    #[tokio::test]
    async fn test_batch_stops_between_actions_on_cancel() {
        let f = setup();
        for name in ["a.md", "b.md", "c.md", "d.md"] {
            f.fs.put(name, b"x");
        }
        let actions: Vec<SyncAction> = ["a.md", "b.md", "c.md", "d.md"]
            .iter()
            .map(|n| SyncAction::upload(path(n)))
            .collect();
        let cancel = CancellationToken::new();
        let progress = RecordingProgress::cancelling_after(1, cancel.clone());

        let report = f
            .executor
            .run_batch(&actions, &auth(), SyncStatistics::start(), &progress, &cancel)
            .await;

        assert!(report.cancelled);
        assert_eq!(report.completed.len(), 2);
        assert_eq!(
            report.not_attempted,
            vec![SyncAction::upload(path("c.md")), SyncAction::upload(path("d.md"))]
        );
        assert_eq!(report.statistics.files_processed, 2);
        assert!(f.remote.content("c.md").is_none());
    }
}
