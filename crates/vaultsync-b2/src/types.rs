//! B2 native API wire types
//!
//! Request bodies serialize to camelCase JSON; responses ignore unknown
//! fields so newer API revisions keep parsing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File info key holding the hex SHA-256 of the uploaded content
pub const SHA256_INFO_KEY: &str = "content_sha256";

/// File info key B2 tools use for the source modification time
pub const SRC_LAST_MODIFIED_INFO_KEY: &str = "src_last_modified_millis";

/// Value of `X-Bz-Content-Sha1` that skips provider-side checksum verification
pub const SHA1_DO_NOT_VERIFY: &str = "do_not_verify";

// ============================================================================
// Authorization
// ============================================================================

/// Response of `b2_authorize_account`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeAccountResponse {
    pub account_id: String,
    pub api_url: String,
    pub download_url: String,
    pub authorization_token: String,
}

// ============================================================================
// Listing
// ============================================================================

/// Body of `b2_list_file_names`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileNamesRequest<'a> {
    pub bucket_id: &'a str,
    pub max_file_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_file_name: Option<&'a str>,
}

/// Response of `b2_list_file_names`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileNamesResponse {
    #[serde(default)]
    pub files: Vec<B2File>,
    pub next_file_name: Option<String>,
}

/// Body of `b2_list_file_versions`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileVersionsRequest<'a> {
    pub bucket_id: &'a str,
    pub start_file_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_file_id: Option<&'a str>,
    pub prefix: &'a str,
    pub max_file_count: u32,
}

/// Response of `b2_list_file_versions`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileVersionsResponse {
    #[serde(default)]
    pub files: Vec<B2File>,
    pub next_file_name: Option<String>,
    pub next_file_id: Option<String>,
}

/// A file (version) entry as returned by listing and upload calls
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct B2File {
    pub file_id: String,
    pub file_name: String,
    #[serde(default)]
    pub content_length: u64,
    #[serde(default)]
    pub content_sha1: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub upload_timestamp: i64,
    /// `upload`, `hide`, `start` or `folder`
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub file_info: HashMap<String, String>,
}

fn default_action() -> String {
    "upload".to_string()
}

impl B2File {
    /// Returns true for a stored file version (not a hide marker or folder)
    pub fn is_upload(&self) -> bool {
        self.action == "upload"
    }

    /// The SHA-256 fingerprint recorded at upload time, if any
    pub fn content_sha256(&self) -> Option<&str> {
        self.file_info.get(SHA256_INFO_KEY).map(String::as_str)
    }

    /// Upload time as a UTC timestamp
    pub fn uploaded_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.upload_timestamp).unwrap_or_default()
    }
}

// ============================================================================
// Upload / delete
// ============================================================================

/// Body of `b2_get_upload_url`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUploadUrlRequest<'a> {
    pub bucket_id: &'a str,
}

/// Response of `b2_get_upload_url`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUploadUrlResponse {
    pub upload_url: String,
    pub authorization_token: String,
}

/// Body of `b2_delete_file_version`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileVersionRequest<'a> {
    pub file_name: &'a str,
    pub file_id: &'a str,
}

/// Error body returned with every non-2xx API response
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[allow(dead_code)]
    pub status: u16,
    pub code: String,
    pub message: String,
}
