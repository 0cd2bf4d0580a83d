//! Remote object metadata and bucket snapshots

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{Fingerprint, ObjectId, ObjectPath};

/// Metadata of one live object in the remote bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Object name, which doubles as the vault-relative path
    pub path: ObjectPath,
    /// Provider identifier of the current version
    pub object_id: ObjectId,
    /// Content fingerprint, absent when the provider has none recorded
    pub fingerprint: Option<Fingerprint>,
    /// When the current version was uploaded
    pub uploaded_at: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
    /// Always false for entries coming from a live listing
    pub deleted: bool,
}

impl RemoteObject {
    /// Create a live remote object
    #[must_use]
    pub fn new(
        path: ObjectPath,
        object_id: ObjectId,
        fingerprint: Option<Fingerprint>,
        uploaded_at: DateTime<Utc>,
        size: u64,
    ) -> Self {
        Self {
            path,
            object_id,
            fingerprint,
            uploaded_at,
            size,
            deleted: false,
        }
    }

    /// Returns true if the remote content is known to equal the given fingerprint
    #[must_use]
    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprint.as_ref() == Some(fingerprint)
    }
}

/// Point-in-time view of the bucket, keyed by path
///
/// A snapshot describes the bucket as it was listed. Once any mutating action
/// runs it no longer reflects the bucket and is marked stale; callers take a
/// fresh snapshot for the next run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    objects: BTreeMap<ObjectPath, RemoteObject>,
    taken_at: DateTime<Utc>,
    stale: bool,
}

impl RemoteSnapshot {
    /// Build a snapshot from listed objects
    pub fn new(objects: impl IntoIterator<Item = RemoteObject>) -> Self {
        Self {
            objects: objects
                .into_iter()
                .map(|object| (object.path.clone(), object))
                .collect(),
            taken_at: Utc::now(),
            stale: false,
        }
    }

    /// Build an empty snapshot
    #[must_use]
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Look up an object by path
    #[must_use]
    pub fn get(&self, path: &ObjectPath) -> Option<&RemoteObject> {
        self.objects.get(path)
    }

    /// Returns true if an object exists at the path
    #[must_use]
    pub fn contains(&self, path: &ObjectPath) -> bool {
        self.objects.contains_key(path)
    }

    /// Remove an object from this working view
    pub fn remove(&mut self, path: &ObjectPath) -> Option<RemoteObject> {
        self.objects.remove(path)
    }

    /// Keep only objects matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&RemoteObject) -> bool) {
        self.objects.retain(|_, object| keep(object));
    }

    /// Iterate objects in lexicographic path order
    pub fn iter(&self) -> impl Iterator<Item = &RemoteObject> {
        self.objects.values()
    }

    /// Number of objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the snapshot holds no objects
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// When the listing was taken
    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Total bytes across all objects
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.objects.values().map(|o| o.size).sum()
    }

    /// Flag that a mutating action has run since the listing
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Returns true once a mutating action has run since the listing
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl Default for RemoteSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
