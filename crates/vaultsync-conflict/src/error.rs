//! Error types for orphan policy evaluation

use thiserror::Error;

/// Errors raised while building or applying an orphan policy
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    /// Invalid glob pattern in an orphan rule
    #[error("invalid glob pattern: {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Unknown decision name in an orphan rule or default
    #[error("invalid orphan decision '{0}'; valid: ask, skip, delete, download")]
    InvalidDecision(String),
}
