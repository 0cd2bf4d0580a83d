//! Decision provider port (driving side of orphan resolution)
//!
//! Replaces interactive UI callbacks: the engine hands over every orphan of
//! a run in one call and receives a decision map back. Implementations may
//! consult a policy, a canned map or a human at a terminal.

use std::collections::BTreeMap;

use crate::domain::{newtypes::ObjectPath, OrphanDecision, RemoteOrphan};

/// Port supplying per-path decisions for remote orphans
#[async_trait::async_trait]
pub trait IDecisionProvider: Send + Sync {
    /// Decide what to do with each orphan
    ///
    /// Paths missing from the returned map are skipped.
    async fn resolve_orphans(
        &self,
        orphans: &[RemoteOrphan],
    ) -> anyhow::Result<BTreeMap<ObjectPath, OrphanDecision>>;
}
