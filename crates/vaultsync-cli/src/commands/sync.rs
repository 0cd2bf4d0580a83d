//! Sync command - Reconcile the vault with the bucket
//!
//! Provides the `vaultsync sync` CLI command which:
//! 1. Wires the engine from the configuration
//! 2. Picks the orphan decision source (`--orphans`, policy, prompt)
//! 3. Runs the engine, or only previews with `--dry-run`
//! 4. Optionally retries failures once with `--retry`

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tracing::info;

use vaultsync_conflict::{FixedDecisionProvider, OrphanPolicy, PolicyDecisionProvider};
use vaultsync_core::domain::{OrphanDecision, SyncPreview};
use vaultsync_core::ports::IDecisionProvider;

use crate::context::AppContext;
use crate::output::{format_bytes, get_formatter, print_report, ConsoleProgress, OutputFormat};
use crate::prompt::PromptDecisionProvider;

/// How remote-only files are handled for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrphansArg {
    /// Prompt for every remote-only file
    Ask,
    Skip,
    Delete,
    Download,
}

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Override the configured orphan policy for this run
    #[arg(long, value_enum)]
    pub orphans: Option<OrphansArg>,

    /// Retry failed actions once before returning
    #[arg(long)]
    pub retry: bool,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let engine = ctx.engine().await?;

        if self.dry_run {
            let preview = engine.preview().await?;
            print_preview(&preview, format);
            return Ok(());
        }

        let interactive = !format.is_json() && std::io::stdin().is_terminal();
        let decider = decision_provider(self.orphans, ctx, interactive);
        let progress = ConsoleProgress::new(format);
        let cancel = super::cancel_on_ctrl_c();

        let report = engine.run(decider.as_ref(), &progress, &cancel).await?;
        print_report(&report, format);

        if self.retry && report.has_failures() && !report.cancelled {
            info!(failures = report.failures.len(), "Retrying failed actions");
            get_formatter(format).info("Retrying failed actions...");
            let retried = engine.retry_failed(&progress, &cancel).await?;
            print_report(&retried, format);
        }

        Ok(())
    }
}

/// Orphan decisions: explicit flag, else policy with an optional prompt
fn decision_provider(
    orphans: Option<OrphansArg>,
    ctx: &AppContext,
    interactive: bool,
) -> Box<dyn IDecisionProvider> {
    let fixed = |decision| -> Box<dyn IDecisionProvider> {
        Box::new(FixedDecisionProvider::uniform(decision))
    };
    match orphans {
        Some(OrphansArg::Skip) => fixed(OrphanDecision::Skip),
        Some(OrphansArg::Delete) => fixed(OrphanDecision::Delete),
        Some(OrphansArg::Download) => fixed(OrphanDecision::Download),
        Some(OrphansArg::Ask) if interactive => Box::new(PolicyDecisionProvider::with_fallback(
            OrphanPolicy::ask_always(),
            Arc::new(PromptDecisionProvider),
        )),
        Some(OrphansArg::Ask) => Box::new(PolicyDecisionProvider::new(OrphanPolicy::ask_always())),
        None => {
            let policy = OrphanPolicy::new(&ctx.config.orphans);
            if interactive {
                Box::new(PolicyDecisionProvider::with_fallback(
                    policy,
                    Arc::new(PromptDecisionProvider),
                ))
            } else {
                Box::new(PolicyDecisionProvider::new(policy))
            }
        }
    }
}

fn print_preview(preview: &SyncPreview, format: OutputFormat) {
    let formatter = get_formatter(format);

    if format.is_json() {
        let json = serde_json::json!({
            "actions": preview
                .actions
                .iter()
                .map(|a| serde_json::json!({"kind": a.kind().as_str(), "path": a.path().as_str()}))
                .collect::<Vec<_>>(),
            "orphans": preview
                .orphans
                .iter()
                .map(|o| serde_json::json!({
                    "path": o.path().as_str(),
                    "size": o.object.size,
                    "uploaded_at": o.object.uploaded_at.to_rfc3339(),
                }))
                .collect::<Vec<_>>(),
        });
        formatter.print_json(&json);
        return;
    }

    if preview.is_empty() {
        formatter.success("Dry run: already up to date");
        return;
    }

    formatter.success(&format!(
        "Dry run: {} action(s), {} remote-only file(s)",
        preview.actions.len(),
        preview.orphans.len()
    ));
    for action in &preview.actions {
        formatter.info(&format!("{}", action));
    }
    for orphan in &preview.orphans {
        formatter.info(&format!(
            "orphan: {} ({})",
            orphan.path(),
            format_bytes(orphan.object.size)
        ));
    }
}
