//! Logs command - View or clear the sync log
//!
//! Entries are shown newest first, one rendered line each:
//! `[2024-01-01 12:00:00] [INFO] ✓ upload: notes/a.md`

use anyhow::{Context, Result};
use clap::Args;

use vaultsync_core::ports::IStateRepository;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct LogsCommand {
    /// Maximum number of entries to show
    #[arg(long, default_value = "50")]
    pub limit: u32,

    /// Delete all log entries
    #[arg(long)]
    pub clear: bool,
}

impl LogsCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        if !ctx.has_state() {
            formatter.error("No state database found. Run 'vaultsync sync' first.");
            return Ok(());
        }
        let repo = ctx.open_state().await?;

        if self.clear {
            let removed = repo.clear_log().await.context("Failed to clear sync log")?;
            if format.is_json() {
                formatter.print_json(&serde_json::json!({ "cleared": removed }));
            } else {
                formatter.success(&format!("Cleared {} log entries", removed));
            }
            return Ok(());
        }

        let entries = repo
            .recent_log_entries(self.limit)
            .await
            .context("Failed to query sync log")?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({ "entries": entries }));
            return Ok(());
        }

        if entries.is_empty() {
            formatter.success("Sync log is empty");
            return Ok(());
        }
        for entry in &entries {
            println!("{}", entry.format_line());
        }
        Ok(())
    }
}
