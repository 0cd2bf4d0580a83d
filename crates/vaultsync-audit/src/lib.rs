//! VaultSync Audit - Sync log and log-file output
//!
//! Provides:
//! - `SyncLogger`: the `ISyncLog` implementation, one tracing event and one
//!   persisted `SyncLogEntry` per attempted action
//! - `SizeRotatingWriter`: a size-capped `MakeWriter` for the tracing file
//!   layer, keeping one `.log.old` generation

pub mod logger;
pub mod writer;

pub use logger::SyncLogger;
pub use writer::SizeRotatingWriter;
