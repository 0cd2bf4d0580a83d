//! VaultSync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `FileRecord`, `RemoteObject`, `SyncAction`, `SyncState`, `SyncReport`
//! - **Integrity bookkeeping** - `ContentHasher` fingerprints and `SyncStatistics`
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `IStateRepository`,
//!   `ILocalFileSystem`, `IDecisionProvider`, `ISyncLog`, `IProgressObserver`
//! - **Configuration** - YAML-backed `Config` with validation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.

pub mod config;
pub mod domain;
pub mod ports;
