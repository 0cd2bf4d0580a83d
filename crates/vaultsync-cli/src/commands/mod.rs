//! CLI command implementations

pub mod auth;
pub mod completions;
pub mod config;
pub mod logs;
pub mod remote;
pub mod retry;
pub mod status;
pub mod sync;
pub mod transfer;

use tokio_util::sync::CancellationToken;

/// Token cancelled on the first Ctrl-C
///
/// The running batch stops before its next action and reports what was
/// not attempted.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current action");
            child.cancel();
        }
    });
    token
}
