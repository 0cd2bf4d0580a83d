//! Shared test helpers for B2 API integration tests
//!
//! Provides wiremock-based mock server setup for B2 endpoints. The
//! authorization response points both the API and download URLs back at
//! the mock server.

use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vaultsync_b2::client::B2Client;
use vaultsync_b2::provider::B2RemoteStore;
use vaultsync_core::ports::{Authorization, Credentials, IRemoteStore};

pub const KEY_ID: &str = "0014a48fe8875c60000000001";
pub const APP_KEY: &str = "K001testapplicationkey";
pub const BUCKET_ID: &str = "4a48fe8875c6214145260818";
pub const BUCKET_NAME: &str = "test-vault";
pub const API_TOKEN: &str = "4_test_account_token";
pub const UPLOAD_TOKEN: &str = "4_test_upload_token";

pub const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

pub fn credentials() -> Credentials {
    Credentials {
        key_id: KEY_ID.to_string(),
        application_key: APP_KEY.to_string(),
        bucket_id: BUCKET_ID.to_string(),
        bucket_name: BUCKET_NAME.to_string(),
    }
}

/// Sets up a mock server with the authorization endpoint and returns a
/// (MockServer, B2RemoteStore) tuple.
pub async fn setup_b2_mock() -> (MockServer, B2RemoteStore) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b2api/v2/b2_authorize_account"))
        .and(basic_auth(KEY_ID, APP_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accountId": "4a48fe8875c6",
            "apiUrl": server.uri(),
            "downloadUrl": server.uri(),
            "authorizationToken": API_TOKEN,
            "recommendedPartSize": 100000000,
            "absoluteMinimumPartSize": 5000000
        })))
        .mount(&server)
        .await;

    let client = B2Client::with_base_url(BUCKET_ID, BUCKET_NAME, server.uri())
        .with_page_size(2)
        .with_max_retries(2);

    (server, B2RemoteStore::new(client))
}

/// Authorizes against the mock server
pub async fn authorize(store: &B2RemoteStore) -> Authorization {
    store
        .authorize(&credentials())
        .await
        .expect("authorization against mock should succeed")
}

/// Builds a B2 file entry as returned by listings and uploads
pub fn file_json(name: &str, id: &str, sha256: Option<&str>, size: u64) -> serde_json::Value {
    let mut info = serde_json::Map::new();
    if let Some(sha) = sha256 {
        info.insert("content_sha256".into(), serde_json::Value::String(sha.into()));
    }
    serde_json::json!({
        "accountId": "4a48fe8875c6",
        "action": "upload",
        "bucketId": BUCKET_ID,
        "contentLength": size,
        "contentSha1": "none",
        "contentType": "text/markdown",
        "fileId": id,
        "fileInfo": info,
        "fileName": name,
        "uploadTimestamp": 1_700_000_000_000_i64
    })
}
