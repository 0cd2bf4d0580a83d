//! VaultSync Sync - Reconciliation engine
//!
//! Provides:
//! - Paginated remote catalog snapshots
//! - Local-wins reconciliation with remote orphan detection
//! - Sequential action execution with failure isolation
//! - Retry of failed actions
//!
//! ## Modules
//!
//! - [`engine`] - Orchestrates a full run and the supplementary operations
//! - [`catalog`] - Complete bucket snapshot from paged listings
//! - [`reconciler`] - Diff of local files against a remote snapshot
//! - [`executor`] - Applies upload/download/delete actions
//! - [`retry`] - Re-runs failed actions and bounded backoff
//! - [`filter`] - Include/exclude glob filter
//! - [`filesystem`] - Local filesystem adapter (walkdir scan, atomic writes)

pub mod catalog;
pub mod engine;
pub mod executor;
pub mod filesystem;
pub mod filter;
pub mod reconciler;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

use thiserror::Error;

pub use engine::SyncEngine;

/// Errors raised by the local side of the sync
#[derive(Debug, Error)]
pub enum LocalError {
    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The vault root is missing or not a directory
    #[error("Vault root not found: {0}")]
    RootMissing(PathBuf),

    /// An include or exclude pattern failed to compile
    #[error("Invalid filter pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A domain-level error propagated from vaultsync-core
    #[error("Domain error: {0}")]
    DomainError(#[from] vaultsync_core::domain::DomainError),
}
