//! Integration tests for version listings and per-version deletes

use vaultsync_core::domain::ObjectPath;
use vaultsync_core::ports::IRemoteStore;
use wiremock::{
    matchers::{body_json, body_partial_json, method, path},
    Mock, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_list_versions_follows_pagination() {
    let (server, store) = common::setup_b2_mock().await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_versions"))
        .and(body_partial_json(serde_json::json!({"startFileId": "id-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [common::file_json("b.md", "id-2", None, 1)],
            "nextFileName": null,
            "nextFileId": null
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_versions"))
        .and(body_partial_json(serde_json::json!({
            "bucketId": common::BUCKET_ID,
            "startFileName": "b.md",
            "prefix": "b.md"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [
                common::file_json("b.md", "id-0", None, 1),
                common::file_json("b.md", "id-1", None, 1)
            ],
            "nextFileName": "b.md",
            "nextFileId": "id-2"
        })))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let path: ObjectPath = "b.md".parse().unwrap();
    let versions = store.list_object_versions(&auth, &path).await.unwrap();

    let ids: Vec<&str> = versions.iter().map(|v| v.object_id.as_str()).collect();
    assert_eq!(ids, vec!["id-0", "id-1", "id-2"]);
    assert!(versions.iter().all(|v| v.file_name == "b.md"));
}

#[tokio::test]
async fn test_list_versions_includes_prefix_matches() {
    let (server, store) = common::setup_b2_mock().await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_versions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [
                common::file_json("b.md", "id-0", None, 1),
                common::file_json("b.md.bak", "id-9", None, 1)
            ],
            "nextFileName": null,
            "nextFileId": null
        })))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let versions = store
        .list_object_versions(&auth, &"b.md".parse().unwrap())
        .await
        .unwrap();

    // exact-name filtering is the caller's job
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1].file_name, "b.md.bak");
}

#[tokio::test]
async fn test_delete_version_sends_name_and_id() {
    let (server, store) = common::setup_b2_mock().await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_list_file_versions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [common::file_json("b.md", "id-0", None, 1)],
            "nextFileName": null,
            "nextFileId": null
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_delete_file_version"))
        .and(body_json(serde_json::json!({"fileName": "b.md", "fileId": "id-0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileId": "id-0",
            "fileName": "b.md"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let versions = store
        .list_object_versions(&auth, &"b.md".parse().unwrap())
        .await
        .unwrap();

    store
        .delete_object_version(&auth, &versions[0])
        .await
        .expect("delete should succeed");
}

#[tokio::test]
async fn test_delete_version_not_found() {
    let (server, store) = common::setup_b2_mock().await;

    Mock::given(method("POST"))
        .and(path("/b2api/v2/b2_delete_file_version"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "status": 400,
            "code": "file_not_present",
            "message": "File not present: b.md id-0"
        })))
        .mount(&server)
        .await;

    let auth = common::authorize(&store).await;
    let version = vaultsync_core::ports::ObjectVersion {
        object_id: "id-0".parse().unwrap(),
        file_name: "b.md".to_string(),
        uploaded_at: chrono::Utc::now(),
    };

    let err = store.delete_object_version(&auth, &version).await.unwrap_err();
    assert!(format!("{err:#}").contains("file_not_present"));
}
