//! Decision providers
//!
//! [`PolicyDecisionProvider`] answers from the configured [`OrphanPolicy`]
//! and hands `ask` paths to an optional interactive fallback. Without a
//! fallback those paths are left undecided, which the resolver treats as
//! skip. [`FixedDecisionProvider`] returns canned answers.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use vaultsync_core::domain::{newtypes::ObjectPath, OrphanDecision, RemoteOrphan};
use vaultsync_core::ports::IDecisionProvider;

use crate::policy::OrphanPolicy;

/// Decides from the glob policy, deferring `ask` paths to a fallback
pub struct PolicyDecisionProvider {
    policy: OrphanPolicy,
    fallback: Option<Arc<dyn IDecisionProvider>>,
}

impl PolicyDecisionProvider {
    /// Non-interactive provider; `ask` degrades to skip
    pub fn new(policy: OrphanPolicy) -> Self {
        Self {
            policy,
            fallback: None,
        }
    }

    /// Provider that forwards `ask` paths to `fallback`
    pub fn with_fallback(policy: OrphanPolicy, fallback: Arc<dyn IDecisionProvider>) -> Self {
        Self {
            policy,
            fallback: Some(fallback),
        }
    }
}

#[async_trait::async_trait]
impl IDecisionProvider for PolicyDecisionProvider {
    async fn resolve_orphans(
        &self,
        orphans: &[RemoteOrphan],
    ) -> anyhow::Result<BTreeMap<ObjectPath, OrphanDecision>> {
        let mut decisions = BTreeMap::new();
        let mut undecided = Vec::new();

        for orphan in orphans {
            match self.policy.evaluate(orphan.path().as_str()) {
                Some(decision) => {
                    decisions.insert(orphan.path().clone(), decision);
                }
                None => undecided.push(orphan.clone()),
            }
        }

        if undecided.is_empty() {
            return Ok(decisions);
        }

        match &self.fallback {
            Some(fallback) => {
                debug!(count = undecided.len(), "Forwarding orphans to fallback");
                let answered = fallback.resolve_orphans(&undecided).await?;
                decisions.extend(answered);
            }
            None => {
                debug!(
                    count = undecided.len(),
                    "No interactive fallback, skipping undecided orphans"
                );
            }
        }
        Ok(decisions)
    }
}

/// Returns canned decisions, with a default for unlisted paths
#[derive(Debug, Clone, Default)]
pub struct FixedDecisionProvider {
    decisions: BTreeMap<ObjectPath, OrphanDecision>,
    default_decision: OrphanDecision,
}

impl FixedDecisionProvider {
    /// Applies `decision` to every orphan
    pub fn uniform(decision: OrphanDecision) -> Self {
        Self {
            decisions: BTreeMap::new(),
            default_decision: decision,
        }
    }

    /// Uses `decisions` per path; unlisted paths are skipped
    pub fn from_map(decisions: BTreeMap<ObjectPath, OrphanDecision>) -> Self {
        Self {
            decisions,
            default_decision: OrphanDecision::Skip,
        }
    }
}

#[async_trait::async_trait]
impl IDecisionProvider for FixedDecisionProvider {
    async fn resolve_orphans(
        &self,
        orphans: &[RemoteOrphan],
    ) -> anyhow::Result<BTreeMap<ObjectPath, OrphanDecision>> {
        Ok(orphans
            .iter()
            .map(|orphan| {
                let decision = self
                    .decisions
                    .get(orphan.path())
                    .copied()
                    .unwrap_or(self.default_decision);
                (orphan.path().clone(), decision)
            })
            .collect())
    }
}
