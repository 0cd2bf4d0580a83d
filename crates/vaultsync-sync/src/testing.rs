//! In-memory fakes of the ports, shared by the unit tests of this crate

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use vaultsync_core::domain::{
    newtypes::{Fingerprint, ObjectId, ObjectPath},
    ActionFailure, ActionOutcome, ContentHasher, FileRecord, LogStatus, RemoteObject, RunRecord,
    SyncError, SyncLogEntry, SyncState,
};
use vaultsync_core::ports::{
    Authorization, Credentials, ILocalFileSystem, IProgressObserver, IRemoteStore,
    IStateRepository, ISyncLog, LocalEntry, ObjectPage, ObjectVersion, UploadTarget,
};

pub fn path(s: &str) -> ObjectPath {
    ObjectPath::new(s.to_string()).unwrap()
}

pub fn auth() -> Authorization {
    Authorization {
        api_url: "https://api.test".to_string(),
        download_url: "https://dl.test".to_string(),
        auth_token: "token".to_string(),
        authorized_at: Utc::now(),
    }
}

// ============================================================================
// FakeRemote
// ============================================================================

#[derive(Debug, Clone)]
struct StoredVersion {
    id: String,
    content: Vec<u8>,
    fingerprint: Option<Fingerprint>,
}

/// Bucket kept in memory; the last version of a name is the live one
pub struct FakeRemote {
    files: Mutex<BTreeMap<String, Vec<StoredVersion>>>,
    page_size: usize,
    stuck_token: Option<String>,
    listing_error: Mutex<Option<String>>,
    auth_error: Mutex<Option<String>>,
    failing_paths: Mutex<HashSet<String>>,
    /// Local modification time sent with the latest upload of each name
    src_modified: Mutex<BTreeMap<String, DateTime<Utc>>>,
    sticky_delete: bool,
    /// Version listings that still show a deleted version
    listing_lag: usize,
    /// Deleted versions not yet gone from listings, with reads left
    ghosts: Mutex<BTreeMap<String, (Vec<StoredVersion>, usize)>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
    authorize_calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            page_size: 1000,
            stuck_token: None,
            listing_error: Mutex::new(None),
            auth_error: Mutex::new(None),
            failing_paths: Mutex::new(HashSet::new()),
            src_modified: Mutex::new(BTreeMap::new()),
            sticky_delete: false,
            listing_lag: 0,
            ghosts: Mutex::new(BTreeMap::new()),
            next_id: AtomicUsize::new(1),
            list_calls: AtomicUsize::new(0),
            authorize_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Every listing page points at the same next token
    pub fn with_stuck_token(mut self, token: &str) -> Self {
        self.stuck_token = Some(token.to_string());
        self
    }

    /// Deletes never remove the last remaining version of a name
    pub fn with_sticky_delete(mut self) -> Self {
        self.sticky_delete = true;
        self
    }

    /// Deleted versions keep showing up in the next `reads` version listings
    pub fn with_lagging_listing(mut self, reads: usize) -> Self {
        self.listing_lag = reads;
        self
    }

    fn new_id(&self) -> String {
        format!("fid-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Adds a version carrying the content fingerprint
    pub fn put(&self, name: &str, content: &[u8]) {
        self.put_version(name, content, Some(ContentHasher::fingerprint(content)));
    }

    /// Adds a version with no fingerprint metadata
    pub fn put_without_fingerprint(&self, name: &str, content: &[u8]) {
        self.put_version(name, content, None);
    }

    fn put_version(&self, name: &str, content: &[u8], fingerprint: Option<Fingerprint>) {
        let version = StoredVersion {
            id: self.new_id(),
            content: content.to_vec(),
            fingerprint,
        };
        self.files
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push(version);
    }

    pub fn content(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .and_then(|versions| versions.last())
            .map(|v| v.content.clone())
    }

    pub fn version_count(&self, name: &str) -> usize {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .map_or(0, Vec::len)
    }

    pub fn src_modified(&self, name: &str) -> Option<DateTime<Utc>> {
        self.src_modified.lock().unwrap().get(name).copied()
    }

    pub fn fail_listing(&self, message: &str) {
        *self.listing_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_authorization(&self, message: &str) {
        *self.auth_error.lock().unwrap() = Some(message.to_string());
    }

    /// Transfers and deletes of `name` fail until `heal` is called
    pub fn fail_path(&self, name: &str) {
        self.failing_paths.lock().unwrap().insert(name.to_string());
    }

    pub fn heal(&self, name: &str) {
        self.failing_paths.lock().unwrap().remove(name);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    fn check_path(&self, name: &str) -> Result<()> {
        if self.failing_paths.lock().unwrap().contains(name) {
            return Err(anyhow!("simulated failure for {name}"));
        }
        Ok(())
    }

    fn object(name: &str, version: &StoredVersion) -> RemoteObject {
        RemoteObject::new(
            path(name),
            ObjectId::new(version.id.clone()).unwrap(),
            version.fingerprint.clone(),
            Utc::now(),
            version.content.len() as u64,
        )
    }
}

#[async_trait::async_trait]
impl IRemoteStore for FakeRemote {
    async fn authorize(&self, _credentials: &Credentials) -> Result<Authorization> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.auth_error.lock().unwrap().clone() {
            return Err(SyncError::AuthorizationFailed(message).into());
        }
        Ok(auth())
    }

    async fn list_objects(
        &self,
        _auth: &Authorization,
        page_token: Option<&str>,
    ) -> Result<ObjectPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.listing_error.lock().unwrap().clone() {
            return Err(anyhow!(message));
        }

        let files = self.files.lock().unwrap();
        let live: Vec<(&String, &StoredVersion)> = files
            .iter()
            .filter_map(|(name, versions)| versions.last().map(|v| (name, v)))
            .filter(|(name, _)| page_token.map_or(true, |t| name.as_str() >= t))
            .collect();

        if let Some(stuck) = &self.stuck_token {
            return Ok(ObjectPage {
                objects: live.iter().map(|(n, v)| Self::object(n, v)).collect(),
                next_page_token: Some(stuck.clone()),
            });
        }

        let objects = live
            .iter()
            .take(self.page_size)
            .map(|(n, v)| Self::object(n, v))
            .collect();
        let next_page_token = live.get(self.page_size).map(|(n, _)| n.to_string());
        Ok(ObjectPage {
            objects,
            next_page_token,
        })
    }

    async fn get_upload_target(&self, _auth: &Authorization) -> Result<UploadTarget> {
        Ok(UploadTarget {
            upload_url: "https://upload.test".to_string(),
            auth_token: "upload-token".to_string(),
        })
    }

    async fn upload_object(
        &self,
        _target: &UploadTarget,
        path: &ObjectPath,
        content: &[u8],
        fingerprint: &Fingerprint,
        modified: DateTime<Utc>,
    ) -> Result<RemoteObject> {
        self.check_path(path.as_str())?;
        self.put_version(path.as_str(), content, Some(fingerprint.clone()));
        self.src_modified
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), modified);
        let files = self.files.lock().unwrap();
        let version = files
            .get(path.as_str())
            .and_then(|v| v.last())
            .ok_or_else(|| anyhow!("upload vanished"))?;
        Ok(Self::object(path.as_str(), version))
    }

    async fn download_object(&self, _auth: &Authorization, path: &ObjectPath) -> Result<Vec<u8>> {
        self.check_path(path.as_str())?;
        self.content(path.as_str())
            .ok_or_else(|| anyhow!("not_found: {path}"))
    }

    async fn list_object_versions(
        &self,
        _auth: &Authorization,
        prefix: &ObjectPath,
    ) -> Result<Vec<ObjectVersion>> {
        let files = self.files.lock().unwrap();
        let mut ghosts = self.ghosts.lock().unwrap();
        let mut listed: Vec<ObjectVersion> = files
            .iter()
            .chain(ghosts.iter().map(|(name, (versions, _))| (name, versions)))
            .filter(|(name, _)| name.starts_with(prefix.as_str()))
            .flat_map(|(name, versions)| {
                versions.iter().map(move |v| ObjectVersion {
                    object_id: ObjectId::new(v.id.clone()).unwrap(),
                    file_name: name.clone(),
                    uploaded_at: Utc::now(),
                })
            })
            .collect();
        listed.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        for (_, reads_left) in ghosts.values_mut() {
            *reads_left -= 1;
        }
        ghosts.retain(|_, (_, reads_left)| *reads_left > 0);
        Ok(listed)
    }

    async fn delete_object_version(
        &self,
        _auth: &Authorization,
        version: &ObjectVersion,
    ) -> Result<()> {
        self.check_path(&version.file_name)?;
        let mut files = self.files.lock().unwrap();
        let versions = files
            .get_mut(&version.file_name)
            .ok_or_else(|| anyhow!("file_not_present: {}", version.file_name))?;
        if self.sticky_delete && versions.len() == 1 {
            return Ok(());
        }
        let (gone, kept): (Vec<_>, Vec<_>) = versions
            .drain(..)
            .partition(|v| v.id == version.object_id.as_str());
        *versions = kept;
        if versions.is_empty() {
            files.remove(&version.file_name);
        }
        if self.listing_lag > 0 && !gone.is_empty() {
            let mut ghosts = self.ghosts.lock().unwrap();
            let entry = ghosts
                .entry(version.file_name.clone())
                .or_insert_with(|| (Vec::new(), 0));
            entry.0.extend(gone);
            entry.1 = self.listing_lag;
        }
        Ok(())
    }
}

// ============================================================================
// FakeFs
// ============================================================================

/// Vault kept in memory
pub struct FakeFs {
    files: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
    unreadable: Mutex<HashSet<String>>,
    touches: AtomicUsize,
}

impl FakeFs {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            unreadable: Mutex::new(HashSet::new()),
            touches: AtomicUsize::new(0),
        }
    }

    pub fn put(&self, name: &str, content: &[u8]) {
        self.put_with_mtime(name, content, Utc::now());
    }

    /// Replaces the file while keeping a chosen modification time
    pub fn put_with_mtime(&self, name: &str, content: &[u8], modified: DateTime<Utc>) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), (content.to_vec(), modified));
    }

    pub fn mtime_of(&self, name: &str) -> Option<DateTime<Utc>> {
        self.files.lock().unwrap().get(name).map(|(_, m)| *m)
    }

    pub fn content(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).map(|(c, _)| c.clone())
    }

    pub fn make_unreadable(&self, name: &str) {
        self.unreadable.lock().unwrap().insert(name.to_string());
    }

    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ILocalFileSystem for FakeFs {
    async fn enumerate(&self) -> Result<Vec<LocalEntry>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|(name, (content, modified))| LocalEntry {
                path: path(name),
                size: content.len() as u64,
                modified: *modified,
            })
            .collect())
    }

    async fn read(&self, p: &ObjectPath) -> Result<Vec<u8>> {
        if self.unreadable.lock().unwrap().contains(p.as_str()) {
            return Err(anyhow!("permission denied: {p}"));
        }
        self.content(p.as_str())
            .ok_or_else(|| anyhow!("no such file: {p}"))
    }

    async fn write(&self, p: &ObjectPath, content: &[u8]) -> Result<()> {
        self.put(p.as_str(), content);
        Ok(())
    }

    async fn modified(&self, p: &ObjectPath) -> Result<DateTime<Utc>> {
        self.mtime_of(p.as_str())
            .ok_or_else(|| anyhow!("no such file: {p}"))
    }

    async fn touch(&self, p: &ObjectPath) -> Result<DateTime<Utc>> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let mut files = self.files.lock().unwrap();
        let entry = files
            .get_mut(p.as_str())
            .ok_or_else(|| anyhow!("no such file: {p}"))?;
        entry.1 = now;
        Ok(now)
    }

    async fn exists(&self, p: &ObjectPath) -> Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(p.as_str()))
    }
}

// ============================================================================
// FakeState
// ============================================================================

#[derive(Default)]
pub struct FakeState {
    pub state: Mutex<SyncState>,
    pub log: Mutex<Vec<SyncLogEntry>>,
    pub failures: Mutex<Vec<ActionFailure>>,
    pub runs: Mutex<Vec<RunRecord>>,
    /// Makes `save_run` fail
    pub fail_run_history: AtomicBool,
}

impl FakeState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IStateRepository for FakeState {
    async fn load_state(&self) -> Result<SyncState> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn record_file(&self, record: &FileRecord) -> Result<()> {
        self.state.lock().unwrap().record(record.clone());
        Ok(())
    }

    async fn forget_file(&self, p: &ObjectPath) -> Result<()> {
        self.state.lock().unwrap().forget(p);
        Ok(())
    }

    async fn set_last_sync(&self, at: DateTime<Utc>) -> Result<()> {
        self.state.lock().unwrap().mark_synced(at);
        Ok(())
    }

    async fn save_log_entry(&self, entry: &SyncLogEntry) -> Result<i64> {
        let mut log = self.log.lock().unwrap();
        log.push(entry.clone());
        Ok(log.len() as i64)
    }

    async fn recent_log_entries(&self, limit: u32) -> Result<Vec<SyncLogEntry>> {
        Ok(self
            .log
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn clear_log(&self) -> Result<u64> {
        let mut log = self.log.lock().unwrap();
        let n = log.len() as u64;
        log.clear();
        Ok(n)
    }

    async fn replace_failures(&self, failures: &[ActionFailure]) -> Result<()> {
        *self.failures.lock().unwrap() = failures.to_vec();
        Ok(())
    }

    async fn load_failures(&self) -> Result<Vec<ActionFailure>> {
        Ok(self.failures.lock().unwrap().clone())
    }

    async fn save_run(&self, run: &RunRecord) -> Result<()> {
        if self.fail_run_history.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        self.runs.lock().unwrap().push(run.clone());
        Ok(())
    }

    async fn recent_runs(&self, limit: u32) -> Result<Vec<RunRecord>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Log / progress recorders
// ============================================================================

#[derive(Default)]
pub struct RecordingLog {
    pub lines: Mutex<Vec<(String, String, LogStatus, Option<String>)>>,
}

#[async_trait::async_trait]
impl ISyncLog for RecordingLog {
    async fn log(&self, action: &str, path: &str, status: LogStatus, error: Option<&str>) {
        self.lines.lock().unwrap().push((
            action.to_string(),
            path.to_string(),
            status,
            error.map(str::to_string),
        ));
    }
}

/// Records `(index, total, success)` and optionally cancels after an index
#[derive(Default)]
pub struct RecordingProgress {
    pub calls: Mutex<Vec<(usize, usize, bool)>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingProgress {
    pub fn cancelling_after(index: usize, token: CancellationToken) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            cancel_after: Some((index, token)),
        }
    }
}

impl IProgressObserver for RecordingProgress {
    fn on_action_complete(&self, index: usize, total: usize, outcome: &ActionOutcome) {
        self.calls
            .lock()
            .unwrap()
            .push((index, total, outcome.is_success()));
        if let Some((after, token)) = &self.cancel_after {
            if index == *after {
                token.cancel();
            }
        }
    }
}
