//! Status command - Display synchronization status
//!
//! Reads only the local state database; no network access.
//! Shows the last sync time, tracked files, recent runs and the failures
//! waiting for `vaultsync retry`.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::Args;

use vaultsync_core::ports::IStateRepository;

use crate::context::AppContext;
use crate::output::{format_bytes, get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Number of recent runs to show
    #[arg(long, default_value = "5")]
    pub runs: u32,
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        if !ctx.has_state() {
            formatter.error("No state database found. Run 'vaultsync sync' first.");
            return Ok(());
        }

        let repo = ctx.open_state().await?;
        let state = repo.load_state().await.context("Failed to load sync state")?;
        let runs = repo
            .recent_runs(self.runs)
            .await
            .context("Failed to load run history")?;
        let failures = repo
            .load_failures()
            .await
            .context("Failed to load pending failures")?;

        let last_sync = state
            .last_sync
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        let tracked_bytes: u64 = state.files.values().map(|r| r.size).sum();

        if format.is_json() {
            let json = serde_json::json!({
                "bucket": ctx.config.remote.bucket_name,
                "root": ctx.config.sync.root.display().to_string(),
                "last_sync": last_sync,
                "tracked_files": state.len(),
                "tracked_bytes": tracked_bytes,
                "recent_runs": runs,
                "pending_failures": failures,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!(
            "Vault {} -> bucket {}",
            ctx.config.sync.root.display(),
            ctx.config.remote.bucket_name.as_deref().unwrap_or("(not configured)")
        ));
        formatter.info(&format!(
            "Last sync:     {}",
            state
                .last_sync
                .map(|t| describe_time(t, Utc::now()))
                .unwrap_or(last_sync)
        ));
        formatter.info(&format!(
            "Tracked files: {} ({})",
            state.len(),
            format_bytes(tracked_bytes)
        ));

        if !runs.is_empty() {
            formatter.info("");
            formatter.info("Recent runs:");
            for run in &runs {
                let outcome = if run.cancelled {
                    "cancelled"
                } else if run.failures > 0 {
                    "with failures"
                } else {
                    "ok"
                };
                formatter.info(&format!(
                    "  {}  up {} / down {} / del {}  {} failed  [{}]",
                    run.started_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S"),
                    run.files_uploaded,
                    run.files_downloaded,
                    run.files_deleted,
                    run.failures,
                    outcome
                ));
            }
        }

        if !failures.is_empty() {
            formatter.warn(&format!(
                "{} pending failure(s); run 'vaultsync retry'",
                failures.len()
            ));
            for failure in &failures {
                formatter.info(&format!(
                    "  - {} {}: {}",
                    failure.kind, failure.path, failure.error
                ));
            }
        }

        Ok(())
    }
}

/// Local wall-clock time plus a coarse age
fn describe_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(at);
    let ago = if age.num_minutes() < 1 {
        "just now".to_string()
    } else if age.num_hours() < 1 {
        format!("{} min ago", age.num_minutes())
    } else if age.num_days() < 1 {
        format!("{} h ago", age.num_hours())
    } else {
        format!("{} d ago", age.num_days())
    };
    format!(
        "{} ({})",
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        ago
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_describe_time_age() {
        let now = Utc::now();
        assert!(describe_time(now, now).ends_with("(just now)"));
        assert!(describe_time(now - Duration::minutes(5), now).ends_with("(5 min ago)"));
        assert!(describe_time(now - Duration::hours(3), now).ends_with("(3 h ago)"));
        assert!(describe_time(now - Duration::days(2), now).ends_with("(2 d ago)"));
    }
}
