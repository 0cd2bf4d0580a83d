//! Orphan resolution
//!
//! Turns per-path decisions into sync actions and updates the working
//! remote view:
//! - `Delete`: append a delete action, drop the path from the view
//! - `Download`: append a download action, keep the path in the view
//! - `Skip`: no action, drop the path from the view
//!
//! A path without a decision is skipped. Skipped paths are not persisted
//! anywhere, so they show up as orphans again on the next run.

use std::collections::BTreeMap;

use tracing::{debug, info};

use vaultsync_core::domain::{
    newtypes::ObjectPath, OrphanDecision, RemoteOrphan, RemoteSnapshot, SyncAction,
};

/// Outcome of resolving one run's orphans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Actions to append after the reconciler's uploads, in orphan order
    pub actions: Vec<SyncAction>,
    /// Orphans left alone this run
    pub skipped: Vec<ObjectPath>,
}

/// Applies orphan decisions
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves every orphan, recording the chosen decision on each
    ///
    /// All orphans are resolved before anything is executed.
    pub fn resolve(
        &self,
        orphans: &mut [RemoteOrphan],
        decisions: &BTreeMap<ObjectPath, OrphanDecision>,
        view: &mut RemoteSnapshot,
    ) -> Resolution {
        let mut resolution = Resolution::default();

        for orphan in orphans.iter_mut() {
            let decision = decisions.get(orphan.path()).copied().unwrap_or_default();
            orphan.decision = decision;
            let path = orphan.path().clone();
            debug!(path = %path, decision = %decision, "Resolving orphan");

            match decision {
                OrphanDecision::Delete => {
                    view.remove(&path);
                    resolution.actions.push(SyncAction::delete(path));
                }
                OrphanDecision::Download => {
                    resolution.actions.push(SyncAction::download(path));
                }
                OrphanDecision::Skip => {
                    view.remove(&path);
                    resolution.skipped.push(path);
                }
            }
        }

        info!(
            orphans = orphans.len(),
            actions = resolution.actions.len(),
            skipped = resolution.skipped.len(),
            "Orphans resolved"
        );
        resolution
    }
}
