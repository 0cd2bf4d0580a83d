//! VaultSync configuration
//!
//! One YAML file with five sections (`remote`, `sync`, `orphans`, `logging`,
//! `state`). Every section has defaults, so a partial file is valid. The
//! resulting [`Config`] value is handed to each component at construction.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::SyncError;
use crate::ports::Credentials;

/// Environment variable consulted for the application key when the
/// configuration file does not carry one.
pub const APPLICATION_KEY_ENV: &str = "VAULTSYNC_APPLICATION_KEY";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// The whole configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub orphans: OrphansConfig,
    pub logging: LoggingConfig,
    pub state: StateConfig,
}

/// Bucket and credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Bucket identifier used by list and upload calls.
    pub bucket_id: Option<String>,
    /// Bucket name used in download URLs.
    pub bucket_name: Option<String>,
    /// Application key ID.
    pub key_id: Option<String>,
    /// Application key. Prefer the keyring or the environment.
    pub application_key: Option<String>,
    /// Base URL of the authorization endpoint.
    pub auth_url: String,
    /// Objects requested per listing page.
    pub page_size: u32,
}

/// Which part of the vault is synced and how often
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directory of the local vault.
    pub root: PathBuf,
    /// Whether the daemon runs periodic syncs.
    pub auto_sync: bool,
    /// Minutes between automatic syncs.
    pub interval_minutes: u64,
    /// Glob patterns of vault-relative paths to sync.
    pub include: Vec<String>,
    /// Glob patterns excluded even when included.
    pub exclude: Vec<String>,
}

/// A glob rule mapping matching orphan paths to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanRule {
    pub pattern: String,
    pub decision: String,
}

/// Remote orphan handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrphansConfig {
    /// `ask`, `skip`, `delete` or `download`.
    pub default_decision: String,
    /// First matching rule wins.
    pub rules: Vec<OrphanRule>,
}

/// Sync log persistence and tracing output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether sync log entries are persisted.
    pub enabled: bool,
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub level: String,
    /// Whether tracing output is also written to `file`.
    pub log_to_file: bool,
    /// Destination of the tracing output.
    pub file: PathBuf,
    /// Size (in MiB) at which the log file is rotated.
    pub max_size_mb: u64,
}

/// Persistent state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// SQLite database file.
    pub database: PathBuf,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Parses the YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Like [`Config::load`], but any read or parse failure yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// `<config_dir>/vaultsync/config.yaml`, e.g. `~/.config/vaultsync/config.yaml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("vaultsync")
            .join("config.yaml")
    }

    /// Application key from the file, falling back to the environment.
    pub fn application_key(&self) -> Option<String> {
        self.remote
            .application_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(APPLICATION_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
    }

    /// Assemble bucket credentials.
    ///
    /// `stored_key` is consulted when neither the file nor the environment
    /// carries an application key (typically the system keyring).
    ///
    /// # Errors
    /// Returns [`SyncError::ConfigurationMissing`] naming the first absent field.
    pub fn credentials(&self, stored_key: Option<String>) -> Result<Credentials, SyncError> {
        fn required(value: &Option<String>, field: &str) -> Result<String, SyncError> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| SyncError::ConfigurationMissing(field.to_string()))
        }

        let bucket_id = required(&self.remote.bucket_id, "remote.bucket_id")?;
        let bucket_name = required(&self.remote.bucket_name, "remote.bucket_name")?;
        let key_id = required(&self.remote.key_id, "remote.key_id")?;
        let application_key = required(
            &self.application_key().or(stored_key),
            "remote.application_key",
        )?;

        Ok(Credentials {
            key_id,
            application_key,
            bucket_id,
            bucket_name,
        })
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            bucket_id: None,
            bucket_name: None,
            key_id: None,
            application_key: None,
            auth_url: "https://api.backblazeb2.com".to_string(),
            page_size: 1000,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Vault"),
            auto_sync: false,
            interval_minutes: 60,
            include: vec!["**/*.md".to_string()],
            exclude: vec![".obsidian/**".to_string(), ".trash/**".to_string()],
        }
    }
}

impl Default for OrphansConfig {
    fn default() -> Self {
        Self {
            default_decision: "ask".to_string(),
            rules: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let file = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("vaultsync")
            .join("sync.log");
        Self {
            enabled: true,
            level: "info".to_string(),
            log_to_file: true,
            file,
            max_size_mb: 5,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            database: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("vaultsync")
                .join("state.db"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// One problem found by [`Config::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_minutes"`.
    pub field: String,
    /// What is wrong with the value.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `orphans.default_decision`.
pub const VALID_DEFAULT_DECISIONS: &[&str] = &["ask", "skip", "delete", "download"];

/// Valid values for `orphans.rules[].decision`.
const VALID_RULE_DECISIONS: &[&str] = &["skip", "delete", "download"];

impl Config {
    /// Collects every problem instead of stopping at the first one.
    ///
    /// An empty vector means the file is usable. Missing credentials
    /// are not reported here; they surface as `ConfigurationMissing` when a
    /// run starts.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        if !self.remote.auth_url.starts_with("http://")
            && !self.remote.auth_url.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "remote.auth_url".into(),
                message: format!("must be an http(s) URL: {}", self.remote.auth_url),
            });
        }
        if self.remote.page_size == 0 || self.remote.page_size > 10_000 {
            errors.push(ValidationError {
                field: "remote.page_size".into(),
                message: "must be in range 1..=10000".into(),
            });
        }

        // --- sync ---
        if self.sync.interval_minutes == 0 {
            errors.push(ValidationError {
                field: "sync.interval_minutes".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.include.is_empty() {
            errors.push(ValidationError {
                field: "sync.include".into(),
                message: "must contain at least one pattern".into(),
            });
        }
        for (field, patterns) in [
            ("sync.include", &self.sync.include),
            ("sync.exclude", &self.sync.exclude),
        ] {
            for pattern in patterns {
                if let Err(e) = glob::Pattern::new(pattern) {
                    errors.push(ValidationError {
                        field: field.into(),
                        message: format!("invalid glob '{pattern}': {e}"),
                    });
                }
            }
        }

        // `~` is expanded by the binaries
        let vault = &self.sync.root;
        if !vault.starts_with("~") && !vault.is_dir() {
            errors.push(ValidationError {
                field: "sync.root".into(),
                message: format!("not a directory: {}", vault.display()),
            });
        }

        // --- orphans ---
        if !VALID_DEFAULT_DECISIONS.contains(&self.orphans.default_decision.as_str()) {
            errors.push(ValidationError {
                field: "orphans.default_decision".into(),
                message: format!(
                    "invalid decision '{}'; valid options: {}",
                    self.orphans.default_decision,
                    VALID_DEFAULT_DECISIONS.join(", ")
                ),
            });
        }
        for (i, rule) in self.orphans.rules.iter().enumerate() {
            if let Err(e) = glob::Pattern::new(&rule.pattern) {
                errors.push(ValidationError {
                    field: format!("orphans.rules[{i}].pattern"),
                    message: format!("invalid glob '{}': {e}", rule.pattern),
                });
            }
            if !VALID_RULE_DECISIONS.contains(&rule.decision.as_str()) {
                errors.push(ValidationError {
                    field: format!("orphans.rules[{i}].decision"),
                    message: format!(
                        "invalid decision '{}'; valid options: {}",
                        rule.decision,
                        VALID_RULE_DECISIONS.join(", ")
                    ),
                });
            }
        }

        // --- logging ---
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "unknown level '{}' (expected one of {})",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        if self.logging.max_size_mb == 0 {
            errors.push(ValidationError {
                field: "logging.max_size_mb".into(),
                message: "must be greater than 0".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Fluent construction of a [`Config`] on top of the defaults, mostly for tests
///
/// # Example
///
/// ```rust,no_run
/// use vaultsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .sync_root(PathBuf::from("/home/user/Vault"))
///     .bucket("4a48fe8875c6214145260818", "my-vault")
///     .key_id("0014a48fe8875c60000000001")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn bucket(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.remote.bucket_id = Some(id.into());
        self.config.remote.bucket_name = Some(name.into());
        self
    }

    pub fn key_id(mut self, key_id: impl Into<String>) -> Self {
        self.config.remote.key_id = Some(key_id.into());
        self
    }

    pub fn application_key(mut self, key: impl Into<String>) -> Self {
        self.config.remote.application_key = Some(key.into());
        self
    }

    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.auth_url = url.into();
        self
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.config.remote.page_size = n;
        self
    }

    // --- sync ---

    pub fn sync_root(mut self, vault: PathBuf) -> Self {
        self.config.sync.root = vault;
        self
    }

    pub fn auto_sync(mut self, enabled: bool) -> Self {
        self.config.sync.auto_sync = enabled;
        self
    }

    pub fn interval_minutes(mut self, minutes: u64) -> Self {
        self.config.sync.interval_minutes = minutes;
        self
    }

    pub fn include(mut self, patterns: Vec<String>) -> Self {
        self.config.sync.include = patterns;
        self
    }

    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.config.sync.exclude = patterns;
        self
    }

    // --- orphans ---

    pub fn orphan_default(mut self, decision: impl Into<String>) -> Self {
        self.config.orphans.default_decision = decision.into();
        self
    }

    pub fn orphan_rule(mut self, pattern: impl Into<String>, decision: impl Into<String>) -> Self {
        self.config.orphans.rules.push(OrphanRule {
            pattern: pattern.into(),
            decision: decision.into(),
        });
        self
    }

    // --- logging ---

    pub fn logging_enabled(mut self, enabled: bool) -> Self {
        self.config.logging.enabled = enabled;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.config.logging.file = path;
        self
    }

    pub fn log_max_size_mb(mut self, size: u64) -> Self {
        self.config.logging.max_size_mb = size;
        self
    }

    // --- state ---

    pub fn database(mut self, path: PathBuf) -> Self {
        self.config.state.database = path;
        self
    }

    // --- build ---

    pub fn build(self) -> Config {
        self.config
    }

    /// [`ConfigBuilder::build`] followed by [`Config::validate`]
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
