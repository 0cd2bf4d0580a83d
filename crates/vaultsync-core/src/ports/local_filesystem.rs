//! Local filesystem port (driven/secondary port)
//!
//! Abstracts the vault directory so the sync core never touches `std::fs`
//! directly.
//!
//! ## Design Notes
//!
//! - Paths are vault-relative [`ObjectPath`]s; the adapter owns the root.
//! - `write` creates missing parent directories and replaces the file
//!   atomically.
//! - `enumerate` returns every regular file; filtering is the caller's job.

use chrono::{DateTime, Utc};

use crate::domain::newtypes::ObjectPath;

/// A regular file found while enumerating the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub path: ObjectPath,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Port for vault filesystem access
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// List all regular files, sorted by path
    async fn enumerate(&self) -> anyhow::Result<Vec<LocalEntry>>;

    /// Read the full content of a file
    async fn read(&self, path: &ObjectPath) -> anyhow::Result<Vec<u8>>;

    /// Write content, creating parent directories as needed
    async fn write(&self, path: &ObjectPath, content: &[u8]) -> anyhow::Result<()>;

    /// Current modification time of a file
    async fn modified(&self, path: &ObjectPath) -> anyhow::Result<DateTime<Utc>>;

    /// Refresh the modification time to now, returning the new value
    async fn touch(&self, path: &ObjectPath) -> anyhow::Result<DateTime<Utc>>;

    /// Returns true if a file exists at the path
    async fn exists(&self, path: &ObjectPath) -> anyhow::Result<bool>;
}
