//! Integration tests for account authorization

use vaultsync_b2::{client::B2Client, provider::B2RemoteStore};
use vaultsync_core::domain::SyncError;
use vaultsync_core::ports::IRemoteStore;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_authorize_returns_session() {
    let (server, store) = common::setup_b2_mock().await;

    let auth = common::authorize(&store).await;

    assert_eq!(auth.api_url, server.uri());
    assert_eq!(auth.download_url, server.uri());
    assert_eq!(auth.auth_token, common::API_TOKEN);
}

#[tokio::test]
async fn test_authorize_failure_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b2api/v2/b2_authorize_account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": 401,
            "code": "unauthorized",
            "message": "The applicationKeyId and/or the applicationKey are wrong."
        })))
        .mount(&server)
        .await;

    let store = B2RemoteStore::new(B2Client::with_base_url(
        common::BUCKET_ID,
        common::BUCKET_NAME,
        server.uri(),
    ));

    let err = store
        .authorize(&common::credentials())
        .await
        .expect_err("401 must fail");

    match SyncError::find_in(&err) {
        Some(SyncError::AuthorizationFailed(msg)) => {
            assert!(msg.starts_with("Failed to authorize with B2"));
            assert!(msg.contains("unauthorized"));
        }
        other => panic!("expected AuthorizationFailed, got {other:?}"),
    }
}
