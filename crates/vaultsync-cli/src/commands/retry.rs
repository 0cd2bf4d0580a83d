//! Retry command - re-run the actions that failed in the last batch
//!
//! Each failure is retried with its original action kind under a fresh
//! authorization. Whatever fails again becomes the new pending set.

use anyhow::Result;
use clap::Args;

use crate::context::AppContext;
use crate::output::{get_formatter, print_report, ConsoleProgress, OutputFormat};

#[derive(Debug, Args)]
pub struct RetryCommand {}

impl RetryCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let engine = ctx.engine().await?;
        let report = engine
            .retry_failed(&ConsoleProgress::new(format), &super::cancel_on_ctrl_c())
            .await?;

        if report.statistics.files_processed == 0 && !format.is_json() {
            get_formatter(format).success("No failed actions to retry");
            return Ok(());
        }
        print_report(&report, format);
        Ok(())
    }
}
