//! Backblaze B2 native API client
//!
//! Provides a typed HTTP client for the B2 v2 API. Handles authorization
//! headers, file-name encoding, JSON (de)serialization and transient
//! throttling.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vaultsync_b2::client::B2Client;
//!
//! # async fn example() -> Result<(), vaultsync_b2::B2Error> {
//! let client = B2Client::new("bucket-id", "my-vault");
//! let auth = client.authorize_account("key-id", "application-key").await?;
//! let page = client
//!     .list_file_names(&auth.api_url, &auth.authorization_token, None)
//!     .await?;
//! println!("{} files on the first page", page.files.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::types::{
    AuthorizeAccountResponse, B2File, DeleteFileVersionRequest, GetUploadUrlRequest,
    GetUploadUrlResponse, ListFileNamesRequest, ListFileNamesResponse, ListFileVersionsRequest,
    ListFileVersionsResponse, SHA1_DO_NOT_VERIFY, SHA256_INFO_KEY, SRC_LAST_MODIFIED_INFO_KEY,
};
use crate::B2Error;

/// Default authorization endpoint
pub const DEFAULT_AUTH_URL: &str = "https://api.backblazeb2.com";

/// Default page size for listings (the free-transaction maximum)
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Default wait when a throttled response carries no Retry-After header
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Longest Retry-After honoured before giving up on the request
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Maximum number of retries for 429/503 responses
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Characters percent-encoded in file names; `/` and unreserved marks stay literal
const FILE_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a file name for headers and download URLs
pub fn encode_file_name(name: &str) -> String {
    utf8_percent_encode(name, FILE_NAME_ENCODE_SET).to_string()
}

/// Pick a content type from the file extension
pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "md" || ext == "markdown" => "text/markdown",
        _ => "b2/x-auto",
    }
}

// ============================================================================
// B2Client
// ============================================================================

/// HTTP client for B2 API calls against one bucket
///
/// The client holds no session state: every call takes the API URL and
/// token from a prior [`B2Client::authorize_account`], so a fresh
/// authorization never requires rebuilding the client.
#[derive(Debug, Clone)]
pub struct B2Client {
    /// The underlying HTTP client
    client: Client,
    /// Base URL of the authorization endpoint
    auth_url: String,
    bucket_id: String,
    bucket_name: String,
    page_size: u32,
    max_retries: u32,
}

impl B2Client {
    /// Creates a client for the given bucket using the public B2 endpoint
    pub fn new(bucket_id: impl Into<String>, bucket_name: impl Into<String>) -> Self {
        Self::with_base_url(bucket_id, bucket_name, DEFAULT_AUTH_URL)
    }

    /// Creates a client with a custom authorization URL (useful for testing)
    pub fn with_base_url(
        bucket_id: impl Into<String>,
        bucket_name: impl Into<String>,
        auth_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            bucket_id: bucket_id.into(),
            bucket_name: bucket_name.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the number of entries requested per listing page
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the retry limit for throttled responses
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    // ========================================================================
    // Authorization
    // ========================================================================

    /// Exchanges an application key for an account authorization
    ///
    /// `GET {auth_url}/b2api/v2/b2_authorize_account` with HTTP Basic auth.
    pub async fn authorize_account(
        &self,
        key_id: &str,
        application_key: &str,
    ) -> Result<AuthorizeAccountResponse, B2Error> {
        let url = format!("{}/b2api/v2/b2_authorize_account", self.auth_url);
        debug!(key_id, "Authorizing B2 account");

        let response = self
            .execute_with_retry("b2_authorize_account", || {
                self.client
                    .get(&url)
                    .basic_auth(key_id, Some(application_key))
            })
            .await?;

        let auth: AuthorizeAccountResponse = response
            .json()
            .await
            .map_err(|e| B2Error::InvalidResponse(format!("authorize response: {e}")))?;

        info!(api_url = %auth.api_url, "Authorized B2 account");
        Ok(auth)
    }

    // ========================================================================
    // Listing
    // ========================================================================

    /// Lists one page of file names, starting at `start_file_name`
    pub async fn list_file_names(
        &self,
        api_url: &str,
        token: &str,
        start_file_name: Option<&str>,
    ) -> Result<ListFileNamesResponse, B2Error> {
        let body = ListFileNamesRequest {
            bucket_id: &self.bucket_id,
            max_file_count: self.page_size,
            start_file_name,
        };
        let page: ListFileNamesResponse = self
            .api_call(api_url, token, "b2_list_file_names", &body)
            .await?;

        debug!(
            files = page.files.len(),
            has_more = page.next_file_name.is_some(),
            "Fetched file name page"
        );
        Ok(page)
    }

    /// Lists every stored version whose name starts with `prefix`
    ///
    /// Follows `nextFileName`/`nextFileId` until the listing is exhausted.
    pub async fn list_file_versions(
        &self,
        api_url: &str,
        token: &str,
        prefix: &str,
    ) -> Result<Vec<B2File>, B2Error> {
        let mut versions = Vec::new();
        let mut start_name = prefix.to_string();
        let mut start_id: Option<String> = None;
        let mut page_count = 0u32;

        loop {
            page_count += 1;
            let body = ListFileVersionsRequest {
                bucket_id: &self.bucket_id,
                start_file_name: &start_name,
                start_file_id: start_id.as_deref(),
                prefix,
                max_file_count: self.page_size,
            };
            let page: ListFileVersionsResponse = self
                .api_call(api_url, token, "b2_list_file_versions", &body)
                .await?;
            versions.extend(page.files);

            match (page.next_file_name, page.next_file_id) {
                (Some(name), id) if name.starts_with(prefix) => {
                    if name == start_name && id == start_id {
                        return Err(B2Error::InvalidResponse(format!(
                            "version listing for {prefix} did not advance"
                        )));
                    }
                    start_name = name;
                    start_id = id;
                }
                _ => break,
            }
        }

        debug!(prefix, versions = versions.len(), page_count, "Listed file versions");
        Ok(versions)
    }

    // ========================================================================
    // Upload / download / delete
    // ========================================================================

    /// Obtains an upload URL and its dedicated token
    pub async fn get_upload_url(
        &self,
        api_url: &str,
        token: &str,
    ) -> Result<GetUploadUrlResponse, B2Error> {
        let body = GetUploadUrlRequest {
            bucket_id: &self.bucket_id,
        };
        self.api_call(api_url, token, "b2_get_upload_url", &body)
            .await
    }

    /// Uploads `content` under `file_name` in one request
    ///
    /// Provider-side SHA-1 verification is skipped; the SHA-256 fingerprint
    /// travels as file info instead.
    pub async fn upload_file(
        &self,
        upload: &GetUploadUrlResponse,
        file_name: &str,
        content: &[u8],
        content_sha256: &str,
        src_last_modified_millis: i64,
    ) -> Result<B2File, B2Error> {
        let encoded = encode_file_name(file_name);
        debug!(file_name, bytes = content.len(), "Uploading file");

        let response = self
            .execute_with_retry("upload", || {
                self.client
                    .post(&upload.upload_url)
                    .header("Authorization", &upload.authorization_token)
                    .header("X-Bz-File-Name", &encoded)
                    .header("Content-Type", content_type_for(file_name))
                    .header("X-Bz-Content-Sha1", SHA1_DO_NOT_VERIFY)
                    .header(format!("X-Bz-Info-{SHA256_INFO_KEY}"), content_sha256)
                    .header(
                        format!("X-Bz-Info-{SRC_LAST_MODIFIED_INFO_KEY}"),
                        src_last_modified_millis.to_string(),
                    )
                    .body(content.to_vec())
            })
            .await?;

        response
            .json()
            .await
            .map_err(|e| B2Error::InvalidResponse(format!("upload response: {e}")))
    }

    /// Downloads the current version of `file_name`
    ///
    /// `GET {download_url}/file/{bucket_name}/{encoded file_name}`
    pub async fn download_file_by_name(
        &self,
        download_url: &str,
        token: &str,
        file_name: &str,
    ) -> Result<Vec<u8>, B2Error> {
        let url = format!(
            "{}/file/{}/{}",
            download_url.trim_end_matches('/'),
            encode_file_name(&self.bucket_name),
            encode_file_name(file_name)
        );
        debug!(file_name, "Downloading file");

        let response = self
            .execute_with_retry("download", || {
                self.client.get(&url).header("Authorization", token)
            })
            .await?;

        let bytes = response.bytes().await?;
        debug!(file_name, bytes = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }

    /// Deletes one stored version
    pub async fn delete_file_version(
        &self,
        api_url: &str,
        token: &str,
        file_name: &str,
        file_id: &str,
    ) -> Result<(), B2Error> {
        let body = DeleteFileVersionRequest { file_name, file_id };
        let _: serde_json::Value = self
            .api_call(api_url, token, "b2_delete_file_version", &body)
            .await?;
        debug!(file_name, file_id, "Deleted file version");
        Ok(())
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    /// POSTs a JSON body to `{api_url}/b2api/v2/{endpoint}` and parses the reply
    async fn api_call<B, R>(
        &self,
        api_url: &str,
        token: &str,
        endpoint: &str,
        body: &B,
    ) -> Result<R, B2Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/b2api/v2/{endpoint}", api_url.trim_end_matches('/'));
        let response = self
            .execute_with_retry(endpoint, || {
                self.client
                    .post(&url)
                    .header("Authorization", token)
                    .json(body)
            })
            .await?;

        response
            .json()
            .await
            .map_err(|e| B2Error::InvalidResponse(format!("{endpoint} response: {e}")))
    }

    /// Sends a request, retrying 429 and 503 responses.
    ///
    /// `build` is called once per attempt. Other non-success statuses are
    /// classified into [`B2Error`] without retrying.
    async fn execute_with_retry<F>(&self, label: &str, build: F) -> Result<Response, B2Error>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            let response = build().send().await?;
            let status = response.status();

            if status.is_success() {
                if attempt > 0 {
                    info!(label, attempt, "Request succeeded after retry");
                }
                return Ok(response);
            }

            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .map(parse_retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            let body = response.text().await.unwrap_or_default();

            let throttled = matches!(
                status,
                StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
            );
            if !throttled {
                return Err(B2Error::from_response(status, &body, retry_after));
            }

            if attempt >= self.max_retries {
                warn!(label, attempts = attempt + 1, "Throttle retry limit exhausted");
                return Err(B2Error::from_response(status, &body, retry_after));
            }

            info!(
                label,
                attempt,
                status = status.as_u16(),
                retry_after_ms = retry_after.as_millis() as u64,
                "Throttled by B2, backing off"
            );
            tokio::time::sleep(retry_after).await;
            attempt += 1;
        }
    }
}

/// Parses a Retry-After value in whole seconds, capped at one minute
fn parse_retry_after(value: &str) -> Duration {
    match value.trim().parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs).min(MAX_RETRY_AFTER),
        Err(_) => {
            warn!(value, "Could not parse Retry-After header, using default");
            DEFAULT_RETRY_AFTER
        }
    }
}
