//! Integration tests for bucket listings

use vaultsync_core::domain::SyncError;
use vaultsync_core::ports::IRemoteStore;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_list_objects_follows_page_token() {
    let (server, store) = common::setup_b2_mock().await;

    // Second page, requested with startFileName
    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_names"))
        .and(body_partial_json(serde_json::json!({"startFileName": "c.md"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [common::file_json("c.md", "id-c", None, 3)],
            "nextFileName": null
        })))
        .mount(&server)
        .await;

    // First page
    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_names"))
        .and(header("Authorization", common::API_TOKEN))
        .and(body_partial_json(serde_json::json!({
            "bucketId": common::BUCKET_ID,
            "maxFileCount": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [
                common::file_json("a.md", "id-a", Some(common::HELLO_SHA256), 5),
                common::file_json("b/nested.md", "id-b", None, 7)
            ],
            "nextFileName": "c.md"
        })))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;

    let first = store.list_objects(&auth, None).await.expect("page 1");
    assert_eq!(first.objects.len(), 2);
    assert_eq!(first.objects[0].path.as_str(), "a.md");
    assert_eq!(
        first.objects[0].fingerprint.as_ref().map(|f| f.as_str()),
        Some(common::HELLO_SHA256)
    );
    assert!(first.objects[1].fingerprint.is_none());
    assert_eq!(first.next_page_token.as_deref(), Some("c.md"));

    let second = store
        .list_objects(&auth, first.next_page_token.as_deref())
        .await
        .expect("page 2");
    assert_eq!(second.objects.len(), 1);
    assert_eq!(second.objects[0].path.as_str(), "c.md");
    assert!(second.next_page_token.is_none());
}

#[tokio::test]
async fn test_list_objects_skips_non_upload_entries() {
    let (server, store) = common::setup_b2_mock().await;

    let mut folder = common::file_json("folder/", "id-folder", None, 0);
    folder["action"] = serde_json::json!("folder");

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_names"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [common::file_json("a.md", "id-a", None, 1), folder],
            "nextFileName": null
        })))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let page = store.list_objects(&auth, None).await.unwrap();

    assert_eq!(page.objects.len(), 1);
    assert_eq!(page.objects[0].path.as_str(), "a.md");
}

#[tokio::test]
async fn test_list_failure_is_remote_unavailable() {
    let (server, store) = common::setup_b2_mock().await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_names"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "status": 400,
            "code": "bad_request",
            "message": "Invalid bucketId"
        })))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let err = store.list_objects(&auth, None).await.unwrap_err();

    match SyncError::find_in(&err) {
        Some(SyncError::RemoteUnavailable(msg)) => assert!(msg.contains("Invalid bucketId")),
        other => panic!("expected RemoteUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_retries_after_throttle() {
    let (server, store) = common::setup_b2_mock().await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_names"))
        .respond_with(
            ResponseTemplate::new(429)
                .append_header("Retry-After", "0")
                .set_body_json(serde_json::json!({
                    "status": 429,
                    "code": "too_many_requests",
                    "message": "slow down"
                })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_names"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [common::file_json("a.md", "id-a", None, 1)],
            "nextFileName": null
        })))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let page = store.list_objects(&auth, None).await.expect("retry should succeed");
    assert_eq!(page.objects.len(), 1);
}
