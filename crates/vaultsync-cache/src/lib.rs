//! VaultSync Cache - SQLite implementation of `IStateRepository`
//!
//! One database file holds everything that outlives a run: the fingerprint
//! recorded for every synced file, the last sync time, the sync log, the
//! failures waiting for `vaultsync retry` and the history of runs.
//!
//! ```no_run
//! use std::path::Path;
//! use vaultsync_cache::{DatabasePool, SqliteStateRepository};
//!
//! # async fn open() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/var/lib/vaultsync/state.db")).await?;
//! let state = SqliteStateRepository::new(pool.pool().clone());
//! # let _ = state;
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::SqliteStateRepository;

use vaultsync_core::domain::DomainError;

/// State database failures
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cannot open state database: {0}")]
    ConnectionFailed(String),

    #[error("state query failed: {0}")]
    QueryFailed(String),

    #[error("schema setup failed: {0}")]
    MigrationFailed(String),

    /// A stored value no longer parses into its domain type
    #[error("corrupt state row: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(err: sqlx::Error) -> Self {
        Self::QueryFailed(err.to_string())
    }
}

impl From<DomainError> for CacheError {
    fn from(e: DomainError) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}
