//! Auth commands - Login, Logout, and Status for the B2 application key
//!
//! Provides the `vaultsync auth` CLI subcommands which:
//! 1. `login`  - Stores the application key in the system keyring and
//!    records the key ID in the configuration file.
//! 2. `logout` - Removes the application key from the keyring.
//! 3. `status` - Reports where the key comes from and performs an
//!    authorization against the bucket.

use anyhow::{Context, Result};
use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use vaultsync_b2::credentials::KeyringKeyStorage;
use vaultsync_core::config::{Config, APPLICATION_KEY_ENV};
use vaultsync_core::ports::IRemoteStore;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store an application key in the system keyring
    Login {
        /// Application key ID
        #[arg(long)]
        key_id: String,
    },
    /// Remove the stored application key
    Logout,
    /// Check that the configured credentials authorize
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let fmt = get_formatter(format);
        match self {
            AuthCommand::Login { key_id } => self.execute_login(ctx, key_id, &*fmt).await,
            AuthCommand::Logout => self.execute_logout(ctx, &*fmt),
            AuthCommand::Status => self.execute_status(ctx, &*fmt, format).await,
        }
    }

    /// Store the key, then record the key ID in the config file
    async fn execute_login(
        &self,
        ctx: &AppContext,
        key_id: &str,
        fmt: &dyn OutputFormatter,
    ) -> Result<()> {
        let application_key = match std::env::var(APPLICATION_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => read_key_from_stdin().await?,
        };
        if application_key.is_empty() {
            fmt.error("No application key given");
            return Ok(());
        }

        KeyringKeyStorage::store(key_id, &application_key)
            .context("Failed to store application key in keyring")?;
        info!(key_id = %key_id, "Stored application key");

        // A broken file must not be replaced by defaults
        let mut config = if ctx.config_path.exists() {
            Config::load(&ctx.config_path).context("Failed to parse configuration file")?
        } else {
            Config::default()
        };
        if config.remote.key_id.as_deref() != Some(key_id) {
            config.remote.key_id = Some(key_id.to_string());
            config
                .save(&ctx.config_path)
                .context("Failed to update configuration file")?;
            fmt.info(&format!(
                "Recorded key ID in {}",
                ctx.config_path.display()
            ));
        }

        fmt.success(&format!("Application key stored for key ID {}", key_id));
        Ok(())
    }

    fn execute_logout(&self, ctx: &AppContext, fmt: &dyn OutputFormatter) -> Result<()> {
        let Some(key_id) = ctx.config.remote.key_id.as_deref() else {
            fmt.info("No key ID configured. Nothing to log out.");
            return Ok(());
        };

        info!(key_id = %key_id, "Logging out");
        KeyringKeyStorage::clear(key_id).context("Failed to clear application key")?;

        fmt.success("Logged out successfully");
        fmt.info("Application key removed from keyring");
        Ok(())
    }

    async fn execute_status(
        &self,
        ctx: &AppContext,
        fmt: &dyn OutputFormatter,
        format: OutputFormat,
    ) -> Result<()> {
        let stored_key = ctx.stored_key();
        let key_source = if ctx.config.application_key().is_some() {
            "config or environment"
        } else if stored_key.is_some() {
            "keyring"
        } else {
            "not found"
        };

        let credentials = match ctx.config.credentials(stored_key) {
            Ok(credentials) => credentials,
            Err(e) => {
                if format.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "authenticated": false,
                        "key_source": key_source,
                        "error": e.to_string(),
                    }));
                } else {
                    fmt.error(&e.to_string());
                    fmt.info("Run 'vaultsync auth login --key-id <id>' and set the bucket in the config");
                }
                return Ok(());
            }
        };

        let result = ctx.remote_store().authorize(&credentials).await;

        if format.is_json() {
            fmt.print_json(&serde_json::json!({
                "authenticated": result.is_ok(),
                "key_id": credentials.key_id,
                "bucket": credentials.bucket_name,
                "key_source": key_source,
                "api_url": result.as_ref().ok().map(|a| a.api_url.clone()),
                "error": result.as_ref().err().map(|e| format!("{e:#}")),
            }));
            return Ok(());
        }

        match result {
            Ok(auth) => {
                fmt.success(&format!(
                    "Authorized for bucket {}",
                    credentials.bucket_name
                ));
                fmt.info(&format!("Key ID:     {}", credentials.key_id));
                fmt.info(&format!("Key source: {}", key_source));
                fmt.info(&format!("API URL:    {}", auth.api_url));
            }
            Err(e) => {
                fmt.error(&format!("{e:#}"));
                fmt.info(&format!("Key ID:     {}", credentials.key_id));
                fmt.info(&format!("Key source: {}", key_source));
            }
        }
        Ok(())
    }
}

async fn read_key_from_stdin() -> Result<String> {
    let mut out = tokio::io::stdout();
    out.write_all(b"Application key: ").await?;
    out.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read application key")?;
    Ok(line.trim().to_string())
}
