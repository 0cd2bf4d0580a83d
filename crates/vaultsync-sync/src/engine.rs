//! Reconciliation engine
//!
//! The [`SyncEngine`] runs one full reconciliation between the local vault
//! and the bucket, plus the supplementary operations (push all, pull all,
//! retry, listing, remote content, dry run).
//!
//! ## Sync Flow
//!
//! 1. **Guard**: at most one run per engine; a second caller gets
//!    [`SyncError::AlreadyRunning`]
//! 2. **Credentials**: checked before any network call
//! 3. **Authorize**, **scan** the vault, take a **snapshot** of the bucket
//! 4. **Diff**: local-wins uploads plus remote orphans
//! 5. **Decide**: orphans go to the decision provider, then the resolver
//! 6. **Execute** the batch sequentially, cancellable between actions
//! 7. **Bookkeeping**: pending failures, run record, last sync time
//!
//! Steps 2-5 abort the run on error. Per-action failures in step 6 are
//! collected in the returned [`SyncReport`]. A failed bookkeeping write is
//! reported in [`SyncReport::state_error`]; the report is still returned.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use vaultsync_conflict::ConflictResolver;
use vaultsync_core::config::Config;
use vaultsync_core::domain::{
    newtypes::ObjectPath, FileRecord, RemoteObject, RemoteSnapshot, RunRecord, SyncAction,
    SyncError, SyncPreview, SyncReport, SyncStatistics,
};
use vaultsync_core::ports::{
    Authorization, Credentials, IDecisionProvider, ILocalFileSystem, IProgressObserver,
    IRemoteStore, IStateRepository, ISyncLog,
};

use crate::catalog::RemoteCatalog;
use crate::executor::ActionExecutor;
use crate::filter::PathFilter;
use crate::reconciler::Reconciler;
use crate::retry::RetryCoordinator;

/// Orchestrates reconciliation runs for one vault and one bucket
pub struct SyncEngine {
    config: Config,
    /// Application key from the system keyring, used when the config has none
    stored_key: Option<String>,
    remote: Arc<dyn IRemoteStore>,
    local: Arc<dyn ILocalFileSystem>,
    state: Arc<dyn IStateRepository>,
    filter: PathFilter,
    catalog: RemoteCatalog,
    executor: Arc<ActionExecutor>,
    retry: RetryCoordinator,
    resolver: ConflictResolver,
    run_guard: Mutex<()>,
}

impl SyncEngine {
    /// Creates a new engine
    ///
    /// # Errors
    /// Returns an error if an include or exclude pattern does not compile.
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        local: Arc<dyn ILocalFileSystem>,
        state: Arc<dyn IStateRepository>,
        log: Arc<dyn ISyncLog>,
        config: &Config,
    ) -> Result<Self> {
        let filter = PathFilter::from_config(&config.sync)?;
        let executor = Arc::new(ActionExecutor::new(
            remote.clone(),
            local.clone(),
            state.clone(),
            log,
        ));

        Ok(Self {
            config: config.clone(),
            stored_key: None,
            catalog: RemoteCatalog::new(remote.clone()),
            retry: RetryCoordinator::new(remote.clone(), executor.clone()),
            remote,
            local,
            state,
            filter,
            executor,
            resolver: ConflictResolver::new(),
            run_guard: Mutex::new(()),
        })
    }

    /// Supplies the application key loaded from the keyring
    pub fn with_stored_key(mut self, key: Option<String>) -> Self {
        self.stored_key = key;
        self
    }

    /// Returns true while a run holds the guard
    pub fn is_running(&self) -> bool {
        self.run_guard.try_lock().is_err()
    }

    // ========================================================================
    // Full run
    // ========================================================================

    /// Runs one full reconciliation
    ///
    /// # Errors
    /// Returns a fatal [`SyncError`] (missing configuration, authorization,
    /// listing, concurrent run) or a local scan error.
    #[tracing::instrument(skip_all)]
    pub async fn run(
        &self,
        decider: &dyn IDecisionProvider,
        progress: &dyn IProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let _guard = self.acquire()?;
        let statistics = SyncStatistics::start();
        info!(run_id = %statistics.run_id, "Starting sync run");

        let (auth, local_files, mut snapshot) = self.prepare().await.map_err(|e| {
            let reason = format!("{e:#}");
            error!(%reason, "Sync run aborted");
            e
        })?;

        let mut preview = Reconciler::diff(&local_files, &snapshot);
        let decisions = if preview.orphans.is_empty() {
            BTreeMap::new()
        } else {
            decider
                .resolve_orphans(&preview.orphans)
                .await
                .context("Failed to obtain orphan decisions")?
        };
        let resolution = self
            .resolver
            .resolve(&mut preview.orphans, &decisions, &mut snapshot);
        let skipped = resolution.skipped.clone();
        let actions = Reconciler::finalize(preview.actions, resolution);
        info!(actions = actions.len(), skipped = skipped.len(), "Plan ready");

        let mut report = self
            .executor
            .run_batch(&actions, &auth, statistics, progress, cancel)
            .await;
        report.skipped_orphans = skipped;

        self.persist(&mut report).await;
        Ok(report)
    }

    /// Computes the plan of a run without executing it
    #[tracing::instrument(skip_all)]
    pub async fn preview(&self) -> Result<SyncPreview> {
        let (_, local_files, snapshot) = self.prepare().await?;
        Ok(Reconciler::diff(&local_files, &snapshot))
    }

    // ========================================================================
    // Supplementary operations
    // ========================================================================

    /// Uploads every included local file regardless of the remote state
    #[tracing::instrument(skip_all)]
    pub async fn push_all(
        &self,
        progress: &dyn IProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let _guard = self.acquire()?;
        let statistics = SyncStatistics::start();
        let auth = self.authorize().await?;

        let actions: Vec<SyncAction> = self
            .local
            .enumerate()
            .await
            .context("Failed to scan vault")?
            .into_iter()
            .filter(|entry| self.filter.is_included(entry.path.as_str()))
            .map(|entry| SyncAction::upload(entry.path))
            .collect();
        info!(actions = actions.len(), "Uploading all local files");

        let mut report = self
            .executor
            .run_batch(&actions, &auth, statistics, progress, cancel)
            .await;
        self.persist(&mut report).await;
        Ok(report)
    }

    /// Downloads every included remote object
    #[tracing::instrument(skip_all)]
    pub async fn pull_all(
        &self,
        progress: &dyn IProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let _guard = self.acquire()?;
        let statistics = SyncStatistics::start();
        let auth = self.authorize().await?;

        let snapshot = self.catalog.list_filtered(&auth, &self.filter).await?;
        let actions: Vec<SyncAction> = snapshot
            .iter()
            .map(|object| SyncAction::download(object.path.clone()))
            .collect();
        info!(actions = actions.len(), "Downloading all remote objects");

        let mut report = self
            .executor
            .run_batch(&actions, &auth, statistics, progress, cancel)
            .await;
        self.persist(&mut report).await;
        Ok(report)
    }

    /// Retries the failures persisted by the previous batch
    ///
    /// The stored failure set is replaced by whatever fails again.
    #[tracing::instrument(skip_all)]
    pub async fn retry_failed(
        &self,
        progress: &dyn IProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let _guard = self.acquire()?;
        let failures = self
            .state
            .load_failures()
            .await
            .context("Failed to load pending failures")?;

        if failures.is_empty() {
            info!("No failed actions to retry");
            let mut report = SyncReport::new(SyncStatistics::start());
            report.statistics.finish();
            return Ok(report);
        }

        let credentials = self.credentials()?;
        let mut report = self
            .retry
            .retry(&credentials, &failures, progress, cancel)
            .await?;
        self.persist(&mut report).await;
        Ok(report)
    }

    /// Lists every live object in the bucket, unfiltered
    pub async fn list_remote(&self) -> Result<Vec<RemoteObject>> {
        let auth = self.authorize().await?;
        let snapshot = self.catalog.list(&auth).await?;
        Ok(snapshot.iter().cloned().collect())
    }

    /// Fetches the current remote content of `path`
    pub async fn fetch_remote(&self, path: &ObjectPath) -> Result<Vec<u8>> {
        let auth = self.authorize().await?;
        self.remote
            .download_object(&auth, path)
            .await
            .with_context(|| format!("Failed to fetch {path}"))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn acquire(&self) -> Result<MutexGuard<'_, ()>, SyncError> {
        self.run_guard
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)
    }

    fn credentials(&self) -> Result<Credentials, SyncError> {
        self.config.credentials(self.stored_key.clone())
    }

    async fn authorize(&self) -> Result<Authorization> {
        let credentials = self.credentials()?;
        self.remote.authorize(&credentials).await
    }

    /// Authorizes, scans the vault and snapshots the bucket
    async fn prepare(&self) -> Result<(Authorization, Vec<FileRecord>, RemoteSnapshot)> {
        let auth = self.authorize().await?;
        let local_files = self.scan_local().await?;
        let snapshot = self.catalog.list_filtered(&auth, &self.filter).await?;
        Ok((auth, local_files, snapshot))
    }

    /// Reads and fingerprints every included local file
    ///
    /// Content is hashed on every scan; size and mtime never stand in for it.
    async fn scan_local(&self) -> Result<Vec<FileRecord>> {
        let entries = self
            .local
            .enumerate()
            .await
            .context("Failed to scan vault")?;

        let mut records = Vec::new();
        for entry in entries
            .into_iter()
            .filter(|entry| self.filter.is_included(entry.path.as_str()))
        {
            let content = self
                .local
                .read(&entry.path)
                .await
                .with_context(|| format!("Failed to read {}", entry.path))?;
            records.push(FileRecord::from_content(
                entry.path,
                &content,
                entry.modified,
            ));
        }

        debug!(files = records.len(), "Local scan complete");
        Ok(records)
    }

    /// Stores pending failures, the run record and the completion time
    ///
    /// Every write is attempted. Failures end up in `report.state_error`.
    async fn persist(&self, report: &mut SyncReport) {
        let mut problems = Vec::new();

        if let Err(e) = self.state.replace_failures(&report.failures).await {
            problems.push(format!("pending failures: {e:#}"));
        }
        if let Err(e) = self.state.save_run(&RunRecord::from(&*report)).await {
            problems.push(format!("run record: {e:#}"));
        }
        if let Err(e) = self.state.set_last_sync(Utc::now()).await {
            problems.push(format!("last sync time: {e:#}"));
        }

        if !problems.is_empty() {
            let problem = problems.join("; ");
            error!(error = %problem, "Failed to store run outcome");
            report.state_error = Some(problem);
        }
    }
}
