//! Adapter wiring shared by the commands
//!
//! Loads the configuration once and builds the SQLite repository, the B2
//! store, the filesystem adapter and the [`SyncEngine`] on demand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use vaultsync_audit::SyncLogger;
use vaultsync_b2::{client::B2Client, credentials::KeyringKeyStorage, provider::B2RemoteStore};
use vaultsync_cache::{DatabasePool, SqliteStateRepository};
use vaultsync_core::config::Config;
use vaultsync_sync::{filesystem::LocalFileSystemAdapter, SyncEngine};

/// Configuration plus the path it was loaded from
pub struct AppContext {
    pub config_path: PathBuf,
    pub config: Config,
}

impl AppContext {
    /// Loads `config_arg` or the default path, falling back to defaults
    pub fn load(config_arg: Option<&str>) -> Self {
        let config_path = config_arg
            .map(expand_tilde)
            .unwrap_or_else(Config::default_path);
        let mut config = Config::load_or_default(&config_path);
        config.sync.root = expand_tilde(&config.sync.root.to_string_lossy());
        config.state.database = expand_tilde(&config.state.database.to_string_lossy());
        config.logging.file = expand_tilde(&config.logging.file.to_string_lossy());

        info!(config_path = %config_path.display(), "Loaded configuration");
        Self {
            config_path,
            config,
        }
    }

    /// Opens (creating if needed) the state database
    pub async fn open_state(&self) -> Result<Arc<SqliteStateRepository>> {
        let pool = DatabasePool::new(&self.config.state.database)
            .await
            .context("Failed to open database")?;
        Ok(Arc::new(SqliteStateRepository::new(pool.pool().clone())))
    }

    /// Returns true if the state database file exists
    pub fn has_state(&self) -> bool {
        self.config.state.database.exists()
    }

    /// Application key stored in the keyring for the configured key ID
    pub fn stored_key(&self) -> Option<String> {
        let key_id = self.config.remote.key_id.as_deref()?;
        match KeyringKeyStorage::load(key_id) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Keyring unavailable");
                None
            }
        }
    }

    /// B2 store for the configured bucket
    pub fn remote_store(&self) -> B2RemoteStore {
        let remote = &self.config.remote;
        let client = B2Client::with_base_url(
            remote.bucket_id.clone().unwrap_or_default(),
            remote.bucket_name.clone().unwrap_or_default(),
            remote.auth_url.clone(),
        )
        .with_page_size(remote.page_size);
        B2RemoteStore::new(client)
    }

    /// Fully wired engine
    pub async fn engine(&self) -> Result<SyncEngine> {
        let state = self.open_state().await?;
        let log = Arc::new(SyncLogger::from_config(state.clone(), &self.config.logging));
        let remote = Arc::new(self.remote_store());
        let local = Arc::new(LocalFileSystemAdapter::new(self.config.sync.root.clone()));

        let engine = SyncEngine::new(remote, local, state, log, &self.config)
            .context("Invalid sync configuration")?;
        Ok(engine.with_stored_key(self.stored_key()))
    }
}

/// Expand tilde (~) in a path string to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
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

/// Returns `path` if it is a file, otherwise `None`
pub fn existing_file(path: &Path) -> Option<&Path> {
    path.is_file().then_some(path)
}
