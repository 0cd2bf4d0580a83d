//! VaultSync CLI - Command-line interface for VaultSync
//!
//! Provides commands for:
//! - Reconciling the vault with the bucket (sync, push, pull, retry)
//! - Browsing the bucket (list, show)
//! - Viewing status, run history and the sync log
//! - Managing configuration and the stored application key

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod output;
mod prompt;

use commands::{
    auth::AuthCommand,
    completions::CompletionsCommand,
    config::ConfigCommand,
    logs::LogsCommand,
    remote::{ListCommand, ShowCommand},
    retry::RetryCommand,
    status::StatusCommand,
    sync::SyncCommand,
    transfer::{PullCommand, PushCommand},
};
use context::AppContext;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "vaultsync",
    version,
    about = "Synchronize a notes vault with a Backblaze B2 bucket"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile the vault with the bucket
    Sync(SyncCommand),
    /// Upload every included local file
    Push(PushCommand),
    /// Download every included remote file
    Pull(PullCommand),
    /// Retry the actions that failed in the last batch
    Retry(RetryCommand),
    /// List the files in the bucket
    List(ListCommand),
    /// Print the remote content of a file
    Show(ShowCommand),
    /// Show last sync, tracked files, recent runs and pending failures
    Status(StatusCommand),
    /// View or clear the sync log
    Logs(LogsCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the stored application key
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = match (cli.json, cli.quiet) {
        (true, _) => OutputFormat::Json,
        (false, true) => OutputFormat::Quiet,
        (false, false) => OutputFormat::Human,
    };
    let ctx = AppContext::load(cli.config.as_deref());

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx, format).await,
        Commands::Push(cmd) => cmd.execute(&ctx, format).await,
        Commands::Pull(cmd) => cmd.execute(&ctx, format).await,
        Commands::Retry(cmd) => cmd.execute(&ctx, format).await,
        Commands::List(cmd) => cmd.execute(&ctx, format).await,
        Commands::Show(cmd) => cmd.execute(&ctx, format).await,
        Commands::Status(cmd) => cmd.execute(&ctx, format).await,
        Commands::Logs(cmd) => cmd.execute(&ctx, format).await,
        Commands::Config(cmd) => cmd.execute(&ctx, format).await,
        Commands::Auth(cmd) => cmd.execute(&ctx, format).await,
        Commands::Completions(cmd) => cmd.execute(format).await,
    }
}
