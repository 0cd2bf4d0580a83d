//! Retry of failed actions
//!
//! [`RetryCoordinator`] runs one more pass over the failures of an earlier
//! batch. Each failure is rebuilt into an action of its original kind, so a
//! failed delete is retried as a delete and a failed download as a download.
//! Only one pass runs per call; nothing recurses.
//!
//! [`with_backoff`] is the bounded backoff used for reads that may lag
//! behind writes on the provider side (delete verification).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vaultsync_core::domain::{ActionFailure, SyncAction, SyncReport, SyncStatistics};
use vaultsync_core::ports::{Credentials, IProgressObserver, IRemoteStore};

use crate::executor::ActionExecutor;

/// Backoff schedule for delete verification: 500ms, 1s, 2s
pub const VERIFY_DELAYS: [Duration; 3] = [
    Duration::from_millis(500),
    Duration::from_secs(1),
    Duration::from_secs(2),
];

/// Runs `f`, retrying after each delay in `delays` while it fails
///
/// Makes at most `delays.len() + 1` attempts and returns the last error.
pub async fn with_backoff<F, Fut, T>(operation_name: &str, delays: &[Duration], f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0usize;
    loop {
        match f().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt, "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => match delays.get(attempt) {
                Some(delay) => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after backoff"
                    );
                    tokio::time::sleep(*delay).await;
                    attempt += 1;
                }
                None => return Err(err),
            },
        }
    }
}

/// Re-runs failed actions with a fresh session
pub struct RetryCoordinator {
    remote: Arc<dyn IRemoteStore>,
    executor: Arc<ActionExecutor>,
}

impl RetryCoordinator {
    pub fn new(remote: Arc<dyn IRemoteStore>, executor: Arc<ActionExecutor>) -> Self {
        Self { remote, executor }
    }

    /// Retries every failure once, preserving its action kind
    ///
    /// # Errors
    /// Returns an error if authorization fails; per-action failures are
    /// reported in the returned [`SyncReport`].
    #[tracing::instrument(skip_all, fields(failures = failures.len()))]
    pub async fn retry(
        &self,
        credentials: &Credentials,
        failures: &[ActionFailure],
        progress: &dyn IProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let statistics = SyncStatistics::start();
        let auth = self.remote.authorize(credentials).await?;

        let actions: Vec<SyncAction> = failures.iter().map(ActionFailure::to_action).collect();
        info!(actions = actions.len(), "Retrying failed actions");

        Ok(self
            .executor
            .run_batch(&actions, &auth, statistics, progress, cancel)
            .await)
    }
}
