//! Integration tests for uploads and downloads

use chrono::{TimeZone, Utc};
use vaultsync_core::domain::{ContentHasher, ObjectPath};
use vaultsync_core::ports::IRemoteStore;
use wiremock::{
    matchers::{body_bytes, header, method, path},
    Mock, ResponseTemplate,
};

use crate::common;

// ============================================================================
// Upload tests
// ============================================================================

async fn mount_upload_url(server: &wiremock::MockServer) {
    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_get_upload_url"))
        .and(header("Authorization", common::API_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "bucketId": common::BUCKET_ID,
            "uploadUrl": format!("{}/upload/pod-000-1007-13", server.uri()),
            "authorizationToken": common::UPLOAD_TOKEN
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_sends_fingerprint_and_encoded_name() {
    let (server, store) = common::setup_b2_mock().await;
    mount_upload_url(&server).await;

    let content = b"hello";
    let fingerprint = ContentHasher::fingerprint(content);

    Mock::given(method("POST"))
        .and(path("/upload/pod-000-1007-13"))
        .and(header("Authorization", common::UPLOAD_TOKEN))
        .and(header("X-Bz-File-Name", "daily%20notes/a.md"))
        .and(header("Content-Type", "text/markdown"))
        .and(header("X-Bz-Content-Sha1", "do_not_verify"))
        .and(header("X-Bz-Info-content_sha256", common::HELLO_SHA256))
        .and(header("X-Bz-Info-src_last_modified_millis", "1700000000123"))
        .and(body_bytes(content.to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            "daily notes/a.md",
            "id-uploaded",
            Some(common::HELLO_SHA256),
            5,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let target = store.get_upload_target(&auth).await.expect("upload url");
    assert_eq!(target.auth_token, common::UPLOAD_TOKEN);

    let path: ObjectPath = "daily notes/a.md".parse().unwrap();
    let modified = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let object = store
        .upload_object(&target, &path, content, &fingerprint, modified)
        .await
        .expect("upload should succeed");

    assert_eq!(object.path, path);
    assert_eq!(object.object_id.as_str(), "id-uploaded");
    assert_eq!(object.fingerprint, Some(fingerprint));
    assert_eq!(object.size, 5);
}

#[tokio::test]
async fn test_upload_error_propagates() {
    let (server, store) = common::setup_b2_mock().await;
    mount_upload_url(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload/pod-000-1007-13"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": 401,
            "code": "expired_auth_token",
            "message": "Authorization token has expired"
        })))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let target = store.get_upload_target(&auth).await.unwrap();
    let path: ObjectPath = "a.md".parse().unwrap();

    let err = store
        .upload_object(
            &target,
            &path,
            b"x",
            &ContentHasher::fingerprint(b"x"),
            Utc::now(),
        )
        .await
        .unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("Failed to upload a.md"));
    assert!(rendered.contains("expired_auth_token"));
}

// ============================================================================
// Download tests
// ============================================================================

#[tokio::test]
async fn test_download_by_name() {
    let (server, store) = common::setup_b2_mock().await;

    let content = b"# Remote note\n";
    Mock::given(method("GET"))
        .and(path(format!("/file/{}/notes/b.md", common::BUCKET_NAME)))
        .and(header("Authorization", common::API_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let data = store
        .download_object(&auth, &"notes/b.md".parse().unwrap())
        .await
        .expect("download should succeed");

    assert_eq!(data, content);
}

#[tokio::test]
async fn test_download_missing_file_fails() {
    let (_server, store) = common::setup_b2_mock().await;

    let auth = common::authorize(&store).await;
    let result = store
        .download_object(&auth, &"missing.md".parse().unwrap())
        .await;

    assert!(result.is_err());
}
