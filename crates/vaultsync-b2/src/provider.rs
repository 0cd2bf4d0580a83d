//! B2RemoteStore - IRemoteStore implementation for Backblaze B2
//!
//! Wraps the [`B2Client`] and maps wire types onto the port contract.
//!
//! ## Design Notes
//!
//! - No interior mutability: the session lives in the
//!   [`Authorization`] handed in by the caller, not in the client.
//! - Authorization failures are wrapped as [`SyncError::AuthorizationFailed`]
//!   and listing failures as [`SyncError::RemoteUnavailable`], so the engine
//!   can abort the run on them.
//! - Listing entries whose names are not valid vault paths (e.g. folder
//!   placeholders ending in `/`) are skipped with a warning.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use vaultsync_core::domain::{Fingerprint, ObjectId, ObjectPath, RemoteObject, SyncError};
use vaultsync_core::ports::{
    Authorization, Credentials, IRemoteStore, ObjectPage, ObjectVersion, UploadTarget,
};

use crate::client::B2Client;
use crate::types::{B2File, GetUploadUrlResponse};

/// Remote store backed by one B2 bucket
#[derive(Debug, Clone)]
pub struct B2RemoteStore {
    client: B2Client,
}

impl B2RemoteStore {
    /// Creates a store over an existing client
    pub fn new(client: B2Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying client
    pub fn client(&self) -> &B2Client {
        &self.client
    }
}

/// Converts a listed upload entry into a remote object
///
/// Returns `None` for entries that cannot be represented as vault paths.
pub(crate) fn to_remote_object(file: B2File) -> Option<RemoteObject> {
    let path = match ObjectPath::new(file.file_name.clone()) {
        Ok(path) => path,
        Err(e) => {
            warn!(file_name = %file.file_name, error = %e, "Skipping remote entry");
            return None;
        }
    };
    let object_id = match ObjectId::new(file.file_id.clone()) {
        Ok(id) => id,
        Err(e) => {
            warn!(file_name = %file.file_name, error = %e, "Skipping remote entry");
            return None;
        }
    };
    let fingerprint = file
        .content_sha256()
        .and_then(|hex| Fingerprint::new(hex.to_ascii_lowercase()).ok());
    if fingerprint.is_none() {
        debug!(file_name = %file.file_name, "Remote entry has no usable fingerprint");
    }

    Some(RemoteObject::new(
        path,
        object_id,
        fingerprint,
        file.uploaded_at(),
        file.content_length,
    ))
}

#[async_trait::async_trait]
impl IRemoteStore for B2RemoteStore {
    async fn authorize(&self, credentials: &Credentials) -> Result<Authorization> {
        let auth = self
            .client
            .authorize_account(&credentials.key_id, &credentials.application_key)
            .await
            .map_err(|e| {
                SyncError::AuthorizationFailed(format!("Failed to authorize with B2: {e}"))
            })?;

        Ok(Authorization {
            api_url: auth.api_url,
            download_url: auth.download_url,
            auth_token: auth.authorization_token,
            authorized_at: Utc::now(),
        })
    }

    async fn list_objects(
        &self,
        auth: &Authorization,
        page_token: Option<&str>,
    ) -> Result<ObjectPage> {
        let page = self
            .client
            .list_file_names(&auth.api_url, &auth.auth_token, page_token)
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?;

        let objects = page
            .files
            .into_iter()
            .filter(B2File::is_upload)
            .filter_map(to_remote_object)
            .collect();

        Ok(ObjectPage {
            objects,
            next_page_token: page.next_file_name,
        })
    }

    async fn get_upload_target(&self, auth: &Authorization) -> Result<UploadTarget> {
        let upload = self
            .client
            .get_upload_url(&auth.api_url, &auth.auth_token)
            .await
            .context("Failed to get upload URL")?;

        Ok(UploadTarget {
            upload_url: upload.upload_url,
            auth_token: upload.authorization_token,
        })
    }

    async fn upload_object(
        &self,
        target: &UploadTarget,
        path: &ObjectPath,
        content: &[u8],
        fingerprint: &Fingerprint,
        modified: DateTime<Utc>,
    ) -> Result<RemoteObject> {
        debug!(path = %path, "B2RemoteStore::upload_object");
        let upload = GetUploadUrlResponse {
            upload_url: target.upload_url.clone(),
            authorization_token: target.auth_token.clone(),
        };
        let file = self
            .client
            .upload_file(
                &upload,
                path.as_str(),
                content,
                fingerprint.as_str(),
                modified.timestamp_millis(),
            )
            .await
            .with_context(|| format!("Failed to upload {path}"))?;

        let object_id = ObjectId::new(file.file_id.clone())
            .context("Upload response carried an invalid file ID")?;
        Ok(RemoteObject::new(
            path.clone(),
            object_id,
            Some(fingerprint.clone()),
            file.uploaded_at(),
            content.len() as u64,
        ))
    }

    async fn download_object(&self, auth: &Authorization, path: &ObjectPath) -> Result<Vec<u8>> {
        debug!(path = %path, "B2RemoteStore::download_object");
        self.client
            .download_file_by_name(&auth.download_url, &auth.auth_token, path.as_str())
            .await
            .with_context(|| format!("Failed to download {path}"))
    }

    async fn list_object_versions(
        &self,
        auth: &Authorization,
        prefix: &ObjectPath,
    ) -> Result<Vec<ObjectVersion>> {
        let files = self
            .client
            .list_file_versions(&auth.api_url, &auth.auth_token, prefix.as_str())
            .await
            .with_context(|| format!("Failed to list versions of {prefix}"))?;

        files
            .into_iter()
            .map(|file| -> Result<ObjectVersion> {
                Ok(ObjectVersion {
                    uploaded_at: file.uploaded_at(),
                    object_id: ObjectId::new(file.file_id)
                        .context("Version listing carried an invalid file ID")?,
                    file_name: file.file_name,
                })
            })
            .collect()
    }

    async fn delete_object_version(
        &self,
        auth: &Authorization,
        version: &ObjectVersion,
    ) -> Result<()> {
        debug!(
            file_name = %version.file_name,
            id = %version.object_id,
            "B2RemoteStore::delete_object_version"
        );
        self.client
            .delete_file_version(
                &auth.api_url,
                &auth.auth_token,
                &version.file_name,
                version.object_id.as_str(),
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to delete version {} of {}",
                    version.object_id, version.file_name
                )
            })
    }
}
