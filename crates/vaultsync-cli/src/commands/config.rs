//! `vaultsync config` - inspect, check and create the YAML file
//!
//! `show` redacts an inline application key; `validate` lists every
//! problem it finds; `init` refuses to replace a file without `--force`.

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use vaultsync_core::config::Config;

use crate::context::{existing_file, AppContext};
use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Report every problem in the configuration file
    Validate,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx, format),
            ConfigCommand::Validate => self.execute_validate(ctx, format),
            ConfigCommand::Init { force } => self.execute_init(ctx, *force, format),
            ConfigCommand::Path => self.execute_path(ctx, format),
        }
    }

    fn execute_show(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let mut config = ctx.config.clone();
        if config.remote.application_key.is_some() {
            config.remote.application_key = Some("<redacted>".to_string());
        }

        if format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Cannot render configuration as JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Cannot render configuration as YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    fn execute_validate(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let config_path = &ctx.config_path;

        // Load explicitly so parse errors are reported, not defaulted
        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = if config_path.exists() {
                    format!("Failed to parse configuration: {}", e)
                } else {
                    "Configuration file not found. Run 'vaultsync config init'.".to_string()
                };
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [message],
                    }));
                } else {
                    formatter.error(&message);
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };

        info!(path = %config_path.display(), "Checking configuration");
        let errors = config.validate();

        if format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("No problems found");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "{} problem{} found:",
                errors.len(),
                plural(errors.len() as u64)
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }
        Ok(())
    }

    fn execute_init(&self, ctx: &AppContext, force: bool, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let config_path = &ctx.config_path;

        if existing_file(config_path).is_some() && !force {
            formatter.error(&format!(
                "{} already exists. Use --force to overwrite.",
                config_path.display()
            ));
            return Ok(());
        }

        Config::default()
            .save(config_path)
            .context("Cannot write configuration file")?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Wrote {}", config_path.display()));
            formatter.info("Set remote.bucket_id, remote.bucket_name and remote.key_id,");
            formatter.info("then run 'vaultsync auth login --key-id <id>'.");
        }
        Ok(())
    }

    fn execute_path(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        if format.is_json() {
            get_formatter(format).print_json(&serde_json::json!({
                "config_path": ctx.config_path.display().to_string(),
                "exists": existing_file(&ctx.config_path).is_some(),
            }));
        } else {
            println!("{}", ctx.config_path.display());
        }
        Ok(())
    }
}
