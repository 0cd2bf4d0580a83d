//! Persisted sync state

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::file_record::FileRecord;
use super::newtypes::ObjectPath;

/// Last-known state of the vault as of the most recent run
///
/// A path is recorded only after an action on it succeeds; a verified
/// delete removes the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub last_sync: Option<DateTime<Utc>>,
    pub files: BTreeMap<ObjectPath, FileRecord>,
}

impl SyncState {
    /// Create an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the last-known file for its path
    pub fn record(&mut self, record: FileRecord) {
        self.files.insert(record.path.clone(), record);
    }

    /// Forget a path
    pub fn forget(&mut self, path: &ObjectPath) -> Option<FileRecord> {
        self.files.remove(path)
    }

    /// Look up the last-known record of a path
    #[must_use]
    pub fn get(&self, path: &ObjectPath) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// Stamp the completion time of a run
    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.last_sync = Some(at);
    }

    /// Number of tracked files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no file is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_forget() {
        let mut state = SyncState::new();
        let path: ObjectPath = "a.md".parse().unwrap();
        state.record(FileRecord::from_content(path.clone(), b"x", Utc::now()));

        assert_eq!(state.len(), 1);
        assert!(state.get(&path).is_some());

        assert!(state.forget(&path).is_some());
        assert!(state.is_empty());
    }

    #[test]
    fn test_record_replaces_existing() {
        let mut state = SyncState::new();
        let path: ObjectPath = "a.md".parse().unwrap();
        state.record(FileRecord::from_content(path.clone(), b"v1", Utc::now()));
        state.record(FileRecord::from_content(path.clone(), b"v22", Utc::now()));

        assert_eq!(state.len(), 1);
        assert_eq!(state.get(&path).unwrap().size, 3);
    }

    #[test]
    fn test_mark_synced() {
        let mut state = SyncState::new();
        assert!(state.last_sync.is_none());
        let now = Utc::now();
        state.mark_synced(now);
        assert_eq!(state.last_sync, Some(now));
    }
}
