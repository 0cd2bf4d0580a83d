//! Remote store port (driven/secondary port)
//!
//! This module defines the interface for talking to the object-storage
//! bucket. The implementation targets the Backblaze B2 native API, but the
//! trait carries no B2 wire types.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result`; adapters wrap a [`SyncError`](crate::domain::SyncError)
//!   when a failure has sync-level meaning (authorization, listing).
//! - Listing is one page per call. Exhausting pagination is the caller's job.
//! - Every call after `authorize` is authenticated with the returned token.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::newtypes::{Fingerprint, ObjectId, ObjectPath};
use crate::domain::RemoteObject;

// ============================================================================
// Credentials / Authorization
// ============================================================================

/// Account credentials for the bucket
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key_id: String,
    pub application_key: String,
    pub bucket_id: String,
    pub bucket_name: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("application_key", &"<redacted>")
            .field("bucket_id", &self.bucket_id)
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

/// Session obtained from a successful authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Base URL for API calls
    pub api_url: String,
    /// Base URL for downloads
    pub download_url: String,
    /// Token for the `Authorization` header
    pub auth_token: String,
    pub authorized_at: DateTime<Utc>,
}

/// Upload endpoint handed out by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub upload_url: String,
    pub auth_token: String,
}

// ============================================================================
// Listing types
// ============================================================================

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<RemoteObject>,
    /// Token for the next page, `None` on the last page
    pub next_page_token: Option<String>,
}

/// One stored version of an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectVersion {
    pub object_id: ObjectId,
    /// Exact stored name, which may differ from the requested prefix
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

// ============================================================================
// IRemoteStore trait
// ============================================================================

/// Port for bucket operations
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Exchange credentials for an authorized session
    async fn authorize(&self, credentials: &Credentials) -> anyhow::Result<Authorization>;

    /// List one page of live objects, starting after `page_token`
    async fn list_objects(
        &self,
        auth: &Authorization,
        page_token: Option<&str>,
    ) -> anyhow::Result<ObjectPage>;

    /// Obtain an upload endpoint
    async fn get_upload_target(&self, auth: &Authorization) -> anyhow::Result<UploadTarget>;

    /// Upload `content` as `path`, attaching `fingerprint` and the local
    /// modification time as object metadata
    async fn upload_object(
        &self,
        target: &UploadTarget,
        path: &ObjectPath,
        content: &[u8],
        fingerprint: &Fingerprint,
        modified: DateTime<Utc>,
    ) -> anyhow::Result<RemoteObject>;

    /// Download the current version of `path`
    async fn download_object(
        &self,
        auth: &Authorization,
        path: &ObjectPath,
    ) -> anyhow::Result<Vec<u8>>;

    /// List every stored version whose name starts with `prefix`
    async fn list_object_versions(
        &self,
        auth: &Authorization,
        prefix: &ObjectPath,
    ) -> anyhow::Result<Vec<ObjectVersion>>;

    /// Delete one stored version
    async fn delete_object_version(
        &self,
        auth: &Authorization,
        version: &ObjectVersion,
    ) -> anyhow::Result<()>;
}
