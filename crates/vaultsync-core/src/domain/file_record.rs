//! Local file record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hasher::ContentHasher;
use super::newtypes::{Fingerprint, ObjectPath};

/// Metadata for one file in the local tree
///
/// Recomputed from the live tree on every run. The last-known record per
/// path is persisted as part of [`super::SyncState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Vault-relative path, unique key
    pub path: ObjectPath,
    /// SHA-256 fingerprint of the content
    pub fingerprint: Fingerprint,
    /// Local modification time
    pub modified: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Create a record with an explicit fingerprint
    #[must_use]
    pub fn new(
        path: ObjectPath,
        fingerprint: Fingerprint,
        modified: DateTime<Utc>,
        size: u64,
    ) -> Self {
        Self {
            path,
            fingerprint,
            modified,
            size,
        }
    }

    /// Create a record by fingerprinting the given content
    #[must_use]
    pub fn from_content(path: ObjectPath, content: &[u8], modified: DateTime<Utc>) -> Self {
        Self {
            path,
            fingerprint: ContentHasher::fingerprint(content),
            modified,
            size: content.len() as u64,
        }
    }
}
