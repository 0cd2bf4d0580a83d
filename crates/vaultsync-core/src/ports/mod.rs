//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Bucket operations (Backblaze B2)
//! - [`ILocalFileSystem`] - Vault directory access
//! - [`IStateRepository`] - Persistent sync state, log, failures and run history
//! - [`IDecisionProvider`] - Orphan decisions (policy, canned map or prompt)
//! - [`ISyncLog`] - Per-action sync log
//! - [`IProgressObserver`] - Per-action progress notifications

pub mod decision;
pub mod local_filesystem;
pub mod progress;
pub mod remote_store;
pub mod state_repository;
pub mod sync_log;

pub use decision::IDecisionProvider;
pub use local_filesystem::{ILocalFileSystem, LocalEntry};
pub use progress::{IProgressObserver, NoopProgress};
pub use remote_store::{
    Authorization, Credentials, IRemoteStore, ObjectPage, ObjectVersion, UploadTarget,
};
pub use state_repository::IStateRepository;
pub use sync_log::ISyncLog;
