//! Integration tests for SqliteStateRepository
//!
//! Every test gets a fresh in-memory database.

use chrono::{Duration, TimeZone, Utc};

use vaultsync_cache::{DatabasePool, SqliteStateRepository};
use vaultsync_core::domain::{
    newtypes::ObjectPath, ActionFailure, ActionKind, FileRecord, LogStatus, RunRecord,
    SyncAction, SyncLogEntry, SyncReport, SyncStatistics,
};
use vaultsync_core::ports::IStateRepository;

// ============================================================================
// Test helpers
// ============================================================================

async fn setup() -> SqliteStateRepository {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    SqliteStateRepository::new(pool.pool().clone())
}

fn path(s: &str) -> ObjectPath {
    ObjectPath::new(s.to_string()).unwrap()
}

// ============================================================================
// Sync state
// ============================================================================

#[tokio::test]
async fn test_empty_state() {
    let repo = setup().await;
    let state = repo.load_state().await.unwrap();
    assert!(state.is_empty());
    assert!(state.last_sync.is_none());
}

#[tokio::test]
async fn test_record_and_load_file() {
    let repo = setup().await;
    let modified = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
        + Duration::nanoseconds(123_456_789);
    let record = FileRecord::from_content(path("notes/a.md"), b"hello", modified);

    repo.record_file(&record).await.unwrap();
    let state = repo.load_state().await.unwrap();

    assert_eq!(state.len(), 1);
    assert_eq!(state.get(&path("notes/a.md")), Some(&record));
}

#[tokio::test]
async fn test_record_file_upserts() {
    let repo = setup().await;
    let now = Utc::now();
    repo.record_file(&FileRecord::from_content(path("a.md"), b"v1", now))
        .await
        .unwrap();
    let updated = FileRecord::from_content(path("a.md"), b"version two", now);
    repo.record_file(&updated).await.unwrap();

    let state = repo.load_state().await.unwrap();
    assert_eq!(state.len(), 1);
    assert_eq!(state.get(&path("a.md")).unwrap().size, 11);
}

#[tokio::test]
async fn test_forget_file() {
    let repo = setup().await;
    repo.record_file(&FileRecord::from_content(path("a.md"), b"x", Utc::now()))
        .await
        .unwrap();
    repo.forget_file(&path("a.md")).await.unwrap();
    repo.forget_file(&path("never-there.md")).await.unwrap();

    assert!(repo.load_state().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_last_sync_overwrites() {
    let repo = setup().await;
    let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

    repo.set_last_sync(first).await.unwrap();
    repo.set_last_sync(second).await.unwrap();

    assert_eq!(repo.load_state().await.unwrap().last_sync, Some(second));
}

// ============================================================================
// Sync log
// ============================================================================

#[tokio::test]
async fn test_log_entries_newest_first() {
    let repo = setup().await;
    let first = SyncLogEntry::new("upload", "a.md", LogStatus::Success, None);
    let second = SyncLogEntry::new(
        "delete",
        "b.md",
        LogStatus::Failure,
        Some("not found in bucket".to_string()),
    );

    let id1 = repo.save_log_entry(&first).await.unwrap();
    let id2 = repo.save_log_entry(&second).await.unwrap();
    assert!(id2 > id1);

    let entries = repo.recent_log_entries(10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, Some(id2));
    assert_eq!(entries[0].action, "delete");
    assert_eq!(entries[0].status, LogStatus::Failure);
    assert_eq!(entries[0].error.as_deref(), Some("not found in bucket"));
    assert_eq!(entries[1].path, "a.md");
    assert!(entries[1].error.is_none());

    assert_eq!(repo.recent_log_entries(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_clear_log() {
    let repo = setup().await;
    for i in 0..3 {
        repo.save_log_entry(&SyncLogEntry::new(
            "upload",
            format!("{i}.md"),
            LogStatus::Success,
            None,
        ))
        .await
        .unwrap();
    }

    assert_eq!(repo.clear_log().await.unwrap(), 3);
    assert!(repo.recent_log_entries(10).await.unwrap().is_empty());
    assert_eq!(repo.clear_log().await.unwrap(), 0);
}

// ============================================================================
// Pending failures
// ============================================================================

#[tokio::test]
async fn test_replace_failures_keeps_order_and_kind() {
    let repo = setup().await;
    let failures = vec![
        ActionFailure::new(&SyncAction::delete(path("z.md")), "IncompleteDelete"),
        ActionFailure::new(&SyncAction::upload(path("a.md")), "timeout"),
        ActionFailure::new(&SyncAction::download(path("m.md")), "404"),
    ];

    repo.replace_failures(&failures).await.unwrap();
    let loaded = repo.load_failures().await.unwrap();

    assert_eq!(loaded, failures);
    assert_eq!(loaded[0].kind, ActionKind::Delete);
}

#[tokio::test]
async fn test_replace_failures_swaps_whole_set() {
    let repo = setup().await;
    repo.replace_failures(&[ActionFailure::new(&SyncAction::upload(path("a.md")), "x")])
        .await
        .unwrap();
    repo.replace_failures(&[]).await.unwrap();

    assert!(repo.load_failures().await.unwrap().is_empty());
}

// ============================================================================
// Run history
// ============================================================================

fn run_record(offset_minutes: i64, uploads: u64) -> RunRecord {
    let mut statistics = SyncStatistics::start();
    statistics.start_time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
        + Duration::minutes(offset_minutes);
    for _ in 0..uploads {
        statistics.record_attempt();
        statistics.record_upload(10);
    }
    statistics.finish();
    let mut report = SyncReport::new(statistics);
    report.cancelled = offset_minutes % 2 == 1;
    RunRecord::from(&report)
}

#[tokio::test]
async fn test_save_and_list_runs() {
    let repo = setup().await;
    let older = run_record(0, 2);
    let newer = run_record(1, 5);

    repo.save_run(&older).await.unwrap();
    repo.save_run(&newer).await.unwrap();

    let runs = repo.recent_runs(10).await.unwrap();
    assert_eq!(runs, vec![newer.clone(), older]);
    assert_eq!(runs[0].files_uploaded, 5);
    assert_eq!(runs[0].total_bytes, 50);
    assert!(runs[0].cancelled);

    assert_eq!(repo.recent_runs(1).await.unwrap(), vec![newer]);
}
