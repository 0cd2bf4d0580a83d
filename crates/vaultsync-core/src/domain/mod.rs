//! Domain entities and business logic
//!
//! This module contains the core domain types for VaultSync:
//! - Newtypes for validated paths, fingerprints and identifiers
//! - Local file records and the remote object snapshot
//! - Sync actions, orphan decisions and per-action outcomes
//! - Run statistics, persisted sync state and the run report
//! - Sync log entries
//! - Domain-specific error types

pub mod action;
pub mod errors;
pub mod file_record;
pub mod hasher;
pub mod log;
pub mod newtypes;
pub mod remote;
pub mod report;
pub mod state;
pub mod stats;

// Re-export commonly used types
pub use action::{
    ActionFailure, ActionKind, ActionOutcome, OrphanDecision, RemoteOrphan, SyncAction,
};
pub use errors::{DomainError, SyncError};
pub use file_record::FileRecord;
pub use hasher::ContentHasher;
pub use log::{LogStatus, SyncLogEntry};
pub use newtypes::*;
pub use remote::{RemoteObject, RemoteSnapshot};
pub use report::{RunRecord, SyncPreview, SyncReport};
pub use state::SyncState;
pub use stats::SyncStatistics;
