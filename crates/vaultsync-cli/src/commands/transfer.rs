//! Push and pull commands - one-directional bulk transfers
//!
//! `vaultsync push` uploads every included local file and `vaultsync pull`
//! downloads every included remote file, regardless of what the other side
//! holds. Neither deletes anything.

use anyhow::Result;
use clap::Args;

use crate::context::AppContext;
use crate::output::{get_formatter, print_report, ConsoleProgress, OutputFormat};

#[derive(Debug, Args)]
pub struct PushCommand {}

impl PushCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let engine = ctx.engine().await?;
        get_formatter(format).info(&format!(
            "Uploading {} to the bucket...",
            ctx.config.sync.root.display()
        ));

        let report = engine
            .push_all(&ConsoleProgress::new(format), &super::cancel_on_ctrl_c())
            .await?;
        print_report(&report, format);
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct PullCommand {}

impl PullCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let engine = ctx.engine().await?;
        get_formatter(format).info(&format!(
            "Downloading the bucket into {}...",
            ctx.config.sync.root.display()
        ));

        let report = engine
            .pull_all(&ConsoleProgress::new(format), &super::cancel_on_ctrl_c())
            .await?;
        print_report(&report, format);
        Ok(())
    }
}
