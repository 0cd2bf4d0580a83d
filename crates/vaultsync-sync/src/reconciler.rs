//! Reconciler
//!
//! Compares the local file set with a remote snapshot. Local always wins:
//! a local file that is missing remotely, or whose fingerprint differs from
//! the remote one, is uploaded. A remote object without a local counterpart
//! is never downloaded or deleted automatically; it becomes an orphan and
//! waits for a decision.
//!
//! Both inputs are walked in lexicographic path order, so the same inputs
//! always give the same output.

use std::collections::BTreeMap;

use tracing::debug;

use vaultsync_conflict::Resolution;
use vaultsync_core::domain::{
    newtypes::ObjectPath, FileRecord, RemoteOrphan, RemoteSnapshot, SyncAction, SyncPreview,
};

/// Stateless diff of local files against a remote snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    /// Computes uploads and orphans
    pub fn diff(local: &[FileRecord], remote: &RemoteSnapshot) -> SyncPreview {
        let local: BTreeMap<&ObjectPath, &FileRecord> =
            local.iter().map(|record| (&record.path, record)).collect();

        let actions: Vec<SyncAction> = local
            .values()
            .filter(|record| match remote.get(&record.path) {
                None => true,
                Some(object) => !object.matches(&record.fingerprint),
            })
            .map(|record| SyncAction::upload(record.path.clone()))
            .collect();

        let orphans: Vec<RemoteOrphan> = remote
            .iter()
            .filter(|object| !local.contains_key(&object.path))
            .cloned()
            .map(RemoteOrphan::new)
            .collect();

        debug!(
            local = local.len(),
            remote = remote.len(),
            uploads = actions.len(),
            orphans = orphans.len(),
            "Diff computed"
        );

        SyncPreview { actions, orphans }
    }

    /// Appends the resolved orphan actions after the uploads
    pub fn finalize(mut actions: Vec<SyncAction>, resolution: Resolution) -> Vec<SyncAction> {
        actions.extend(resolution.actions);
        actions
    }
}
