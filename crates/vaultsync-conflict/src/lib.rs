//! VaultSync Conflict - Remote orphan handling
//!
//! Provides:
//! - Glob-rule orphan policy with a configurable default
//! - Decision providers (policy-driven and canned)
//! - Resolution of decisions into sync actions

pub mod error;
pub mod policy;
pub mod provider;
pub mod resolver;

pub use error::ConflictError;
pub use policy::OrphanPolicy;
pub use provider::{FixedDecisionProvider, PolicyDecisionProvider};
pub use resolver::{ConflictResolver, Resolution};
