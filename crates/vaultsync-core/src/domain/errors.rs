//! Domain error types
//!
//! This module defines two error families:
//! - [`DomainError`] for validation failures when constructing domain values
//! - [`SyncError`] for the failure kinds a sync run can surface
//!
//! Port implementations return `anyhow::Result`; adapters wrap a `SyncError`
//! inside the `anyhow::Error` when the failure has sync-level meaning so the
//! engine can classify it with `downcast_ref`.

use thiserror::Error;

/// Errors that can occur when constructing or validating domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid object path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid content fingerprint (expected 64 lowercase hex characters)
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// Invalid remote object identifier
    #[error("Invalid object ID: {0}")]
    InvalidObjectId(String),

    /// Unknown orphan decision or action kind
    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Failure kinds surfaced by a sync run
///
/// `ActionFailed` and `IncompleteDelete` are isolated per action and
/// collected into the run report. Every other kind aborts the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A required bucket or credential field is absent
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Bad credentials or a non-success authorization response
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Listing or transport failure
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// A single action failed
    #[error("Action failed for {path}: {cause}")]
    ActionFailed {
        /// Target path of the action
        path: String,
        /// Underlying cause
        cause: String,
    },

    /// Post-delete verification still found versions
    #[error("Failed to delete all versions of {path}: {remaining} remaining")]
    IncompleteDelete {
        /// Target path of the delete
        path: String,
        /// Number of versions still present after verification
        remaining: usize,
    },

    /// A run was requested while another run is in progress
    #[error("A sync run is already in progress")]
    AlreadyRunning,
}

impl SyncError {
    /// Returns true if this error aborts the whole run
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ActionFailed { .. } | Self::IncompleteDelete { .. }
        )
    }

    /// Find a `SyncError` anywhere in an `anyhow` error chain
    #[must_use]
    pub fn find_in(error: &anyhow::Error) -> Option<&SyncError> {
        error.chain().find_map(|cause| cause.downcast_ref::<SyncError>())
    }
}
