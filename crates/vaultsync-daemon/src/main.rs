//! vaultsyncd - unattended periodic sync
//!
//! Meant to run as a systemd user unit. Each cycle reconciles the vault with
//! the bucket; remote-only files are handled by the configured orphan policy
//! alone, since nobody is there to answer a prompt. SIGTERM or SIGINT stops
//! the loop.
//!
//! # Architecture
//!
//! The daemon wires the same adapters as the CLI, then enters a loop that
//! runs the SyncEngine every `sync.interval_minutes`. The loop is
//! controlled by a `CancellationToken` that is triggered on receipt of
//! SIGTERM or SIGINT. The token is also handed to the running batch, which
//! stops before its next action.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vaultsync_audit::{SizeRotatingWriter, SyncLogger};
use vaultsync_b2::{client::B2Client, credentials::KeyringKeyStorage, provider::B2RemoteStore};
use vaultsync_cache::{DatabasePool, SqliteStateRepository};
use vaultsync_conflict::{OrphanPolicy, PolicyDecisionProvider};
use vaultsync_core::{config::Config, domain::SyncError, ports::NoopProgress};
use vaultsync_sync::{filesystem::LocalFileSystemAdapter, SyncEngine};

/// Environment variable overriding the configuration file path
const CONFIG_ENV: &str = "VAULTSYNC_CONFIG";

// ============================================================================
// DaemonService
// ============================================================================

/// Main daemon service that owns the engine and the shutdown token
struct DaemonService {
    config: Config,
    engine: SyncEngine,
    /// Policy-only decisions; `ask` degrades to skip
    decider: PolicyDecisionProvider,
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Opens the database and wires the adapters
    async fn new(config: Config, shutdown: CancellationToken) -> Result<Self> {
        let pool = DatabasePool::new(&config.state.database)
            .await
            .context("Cannot open state database")?;
        let state = Arc::new(SqliteStateRepository::new(pool.pool().clone()));
        let log = Arc::new(SyncLogger::from_config(state.clone(), &config.logging));

        let remote = &config.remote;
        let client = B2Client::with_base_url(
            remote.bucket_id.clone().unwrap_or_default(),
            remote.bucket_name.clone().unwrap_or_default(),
            remote.auth_url.clone(),
        )
        .with_page_size(remote.page_size);
        let store = Arc::new(B2RemoteStore::new(client));
        let local = Arc::new(LocalFileSystemAdapter::new(config.sync.root.clone()));

        let engine = SyncEngine::new(store, local, state, log, &config)
            .context("Invalid sync configuration")?
            .with_stored_key(stored_key(&config));

        let policy = OrphanPolicy::new(&config.orphans);
        if !policy.is_unattended() {
            info!("Orphan default is 'ask'; unmatched remote-only files will be skipped");
        }

        Ok(Self {
            decider: PolicyDecisionProvider::new(policy),
            config,
            engine,
            shutdown,
        })
    }

    /// Runs the periodic loop until shutdown
    async fn run(&self) -> Result<()> {
        if !self.config.sync.auto_sync {
            warn!("sync.auto_sync is disabled; nothing to do");
            return Ok(());
        }

        let period = interval_duration(&self.config);
        info!(
            interval_minutes = self.config.sync.interval_minutes,
            root = %self.config.sync.root.display(),
            "Starting sync loop"
        );

        run_periodically(period, &self.shutdown, || self.sync_cycle()).await;
        Ok(())
    }

    /// One reconciliation; errors are logged, never propagated
    async fn sync_cycle(&self) {
        info!("Sync cycle starting");
        match self
            .engine
            .run(&self.decider, &NoopProgress, &self.shutdown)
            .await
        {
            Ok(report) => {
                let stats = &report.statistics;
                info!(
                    uploaded = stats.files_uploaded,
                    downloaded = stats.files_downloaded,
                    deleted = stats.files_deleted,
                    bytes = stats.total_bytes,
                    failures = report.failures.len(),
                    skipped_orphans = report.skipped_orphans.len(),
                    cancelled = report.cancelled,
                    "Sync cycle finished"
                );
            }
            Err(e) => match SyncError::find_in(&e) {
                Some(SyncError::ConfigurationMissing(field)) => {
                    error!(field = %field, "Sync skipped: configuration incomplete");
                }
                Some(fatal) => error!(error = %fatal, "Sync cycle aborted"),
                None => error!(error = %format!("{e:#}"), "Sync cycle failed"),
            },
        }
    }
}

/// Calls `cycle` immediately and then once per `period` until `shutdown`
///
/// A cycle that overruns the period delays the next one instead of
/// triggering a burst.
async fn run_periodically<F, Fut>(period: Duration, shutdown: &CancellationToken, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Sync loop cancelled");
                break;
            }
            _ = interval.tick() => cycle().await,
        }
    }
}

fn interval_duration(config: &Config) -> Duration {
    Duration::from_secs(config.sync.interval_minutes.max(1) * 60)
}

// ============================================================================
// Startup helpers
// ============================================================================

fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .map(|p| expand_tilde(&p))
        .unwrap_or_else(Config::default_path)
}

fn load_config(path: &std::path::Path) -> Config {
    let mut config = Config::load_or_default(path);
    config.sync.root = expand_tilde(&config.sync.root.to_string_lossy());
    config.state.database = expand_tilde(&config.state.database.to_string_lossy());
    config.logging.file = expand_tilde(&config.logging.file.to_string_lossy());
    config
}

fn stored_key(config: &Config) -> Option<String> {
    let key_id = config.remote.key_id.as_deref()?;
    KeyringKeyStorage::load(key_id).unwrap_or_else(|e| {
        warn!(error = %e, "Keyring unavailable");
        None
    })
}

/// `~` and `~/...` resolve against the home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Console output plus, when enabled, the size-capped log file
fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let (file_layer, file_error) = if config.logging.log_to_file {
        match SizeRotatingWriter::new(&config.logging.file, config.logging.max_size_mb) {
            Ok(writer) => (
                Some(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(false),
                ),
                None,
            ),
            Err(e) => (None, Some(e)),
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!(
            file = %config.logging.file.display(),
            error = %e,
            "Log file unavailable, logging to console only"
        );
    }
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!(signal = "SIGINT", "Stopping");
        }
        _ = terminate => {
            info!(signal = "SIGTERM", "Stopping");
        }
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path();
    let config = load_config(&config_path);
    init_tracing(&config);

    info!(config_path = %config_path.display(), "VaultSync daemon starting (vaultsyncd)");

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token.clone()).await?;
    let result = service.run().await;

    match &result {
        Ok(()) => info!("VaultSync daemon shut down gracefully"),
        Err(e) => error!(error = %e, "VaultSync daemon exiting with error"),
    }

    result
}
