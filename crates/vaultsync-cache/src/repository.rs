//! SQLite implementation of IStateRepository
//!
//! ## Type Mapping
//!
//! | Domain Type    | SQL Type | Strategy                                             |
//! |----------------|----------|------------------------------------------------------|
//! | ObjectPath     | TEXT     | `.as_str()` / `ObjectPath::new()`                    |
//! | Fingerprint    | TEXT     | lowercase hex via `.as_str()` / `Fingerprint::new()` |
//! | RunId          | TEXT     | UUID string via `.to_string()` / `FromStr`           |
//! | ActionKind     | TEXT     | `.as_str()` / `FromStr`                              |
//! | LogStatus      | TEXT     | `.as_str()` / `FromStr`                              |
//! | DateTime<Utc>  | TEXT     | RFC 3339, nanosecond precision, `Z` suffix           |
//! | u64 counters   | INTEGER  | cast to / from `i64`                                 |

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use vaultsync_core::domain::{
    newtypes::{Fingerprint, ObjectPath, RunId},
    ActionFailure, ActionKind, FileRecord, LogStatus, RunRecord, SyncLogEntry, SyncState,
};
use vaultsync_core::ports::IStateRepository;

use crate::CacheError;

/// `sync_meta` key of the last sync time
const LAST_SYNC_KEY: &str = "last_sync";

/// SQLite-backed state repository
pub struct SqliteStateRepository {
    pool: SqlitePool,
}

impl SqliteStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row helpers
// ============================================================================

/// Fixed-width RFC 3339 with nanoseconds, so text order is time order and
/// modification times survive a round trip unchanged
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            CacheError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, CacheError> {
    s.as_deref().map(parse_datetime).transpose()
}

fn file_record_from_row(row: &SqliteRow) -> Result<FileRecord, CacheError> {
    let path: String = row.get("path");
    let fingerprint: String = row.get("fingerprint");
    let modified: String = row.get("modified");
    let size: i64 = row.get("size");

    Ok(FileRecord::new(
        ObjectPath::new(path)?,
        Fingerprint::new(fingerprint)?,
        parse_datetime(&modified)?,
        size as u64,
    ))
}

fn log_entry_from_row(row: &SqliteRow) -> Result<SyncLogEntry, CacheError> {
    let timestamp: String = row.get("timestamp");
    let status: String = row.get("status");

    Ok(SyncLogEntry {
        id: Some(row.get("id")),
        timestamp: parse_datetime(&timestamp)?,
        action: row.get("action"),
        path: row.get("path"),
        status: LogStatus::from_str(&status)?,
        error: row.get("error"),
    })
}

fn failure_from_row(row: &SqliteRow) -> Result<ActionFailure, CacheError> {
    let path: String = row.get("path");
    let kind: String = row.get("kind");

    Ok(ActionFailure {
        path: ObjectPath::new(path)?,
        kind: ActionKind::from_str(&kind)?,
        error: row.get("error"),
    })
}

fn run_from_row(row: &SqliteRow) -> Result<RunRecord, CacheError> {
    let run_id: String = row.get("run_id");
    let started_at: String = row.get("started_at");
    let ended_at: Option<String> = row.get("ended_at");
    let counter = |name: &str| -> u64 { row.get::<i64, _>(name) as u64 };

    Ok(RunRecord {
        run_id: RunId::from_str(&run_id)?,
        started_at: parse_datetime(&started_at)?,
        ended_at: parse_optional_datetime(ended_at)?,
        files_processed: counter("files_processed"),
        files_uploaded: counter("files_uploaded"),
        files_downloaded: counter("files_downloaded"),
        files_deleted: counter("files_deleted"),
        total_bytes: counter("total_bytes"),
        failures: counter("failures"),
        cancelled: row.get::<i64, _>("cancelled") != 0,
    })
}

// ============================================================================
// IStateRepository implementation
// ============================================================================

#[async_trait::async_trait]
impl IStateRepository for SqliteStateRepository {
    // --- Sync state ---

    async fn load_state(&self) -> anyhow::Result<SyncState> {
        let rows = sqlx::query("SELECT * FROM synced_files ORDER BY path")
            .fetch_all(&self.pool)
            .await?;

        let mut state = SyncState::new();
        for row in &rows {
            state.record(file_record_from_row(row)?);
        }

        let last_sync: Option<String> =
            sqlx::query_scalar("SELECT value FROM sync_meta WHERE key = ?")
                .bind(LAST_SYNC_KEY)
                .fetch_optional(&self.pool)
                .await?;
        state.last_sync = parse_optional_datetime(last_sync)?;

        Ok(state)
    }

    async fn record_file(&self, record: &FileRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO synced_files (path, fingerprint, modified, size) VALUES (?, ?, ?, ?) \
             ON CONFLICT(path) DO UPDATE SET \
             fingerprint = excluded.fingerprint, \
             modified = excluded.modified, \
             size = excluded.size",
        )
        .bind(record.path.as_str())
        .bind(record.fingerprint.as_str())
        .bind(format_datetime(&record.modified))
        .bind(record.size as i64)
        .execute(&self.pool)
        .await?;

        tracing::trace!(path = %record.path, "Recorded synced file");
        Ok(())
    }

    async fn forget_file(&self, path: &ObjectPath) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM synced_files WHERE path = ?")
            .bind(path.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_last_sync(&self, at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sync_meta (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(LAST_SYNC_KEY)
        .bind(format_datetime(&at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- Sync log ---

    async fn save_log_entry(&self, entry: &SyncLogEntry) -> anyhow::Result<i64> {
        let result = sqlx::query(
            "INSERT INTO sync_log (timestamp, action, path, status, error) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(format_datetime(&entry.timestamp))
        .bind(&entry.action)
        .bind(&entry.path)
        .bind(entry.status.as_str())
        .bind(&entry.error)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn recent_log_entries(&self, limit: u32) -> anyhow::Result<Vec<SyncLogEntry>> {
        let rows = sqlx::query("SELECT * FROM sync_log ORDER BY id DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(log_entry_from_row(row)?);
        }
        Ok(entries)
    }

    async fn clear_log(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM sync_log")
            .execute(&self.pool)
            .await?;
        tracing::debug!(rows = result.rows_affected(), "Cleared sync log");
        Ok(result.rows_affected())
    }

    // --- Pending failures ---

    async fn replace_failures(&self, failures: &[ActionFailure]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM failed_actions")
            .execute(&mut *tx)
            .await?;
        for (position, failure) in failures.iter().enumerate() {
            sqlx::query(
                "INSERT INTO failed_actions (position, path, kind, error) VALUES (?, ?, ?, ?)",
            )
            .bind(position as i64)
            .bind(failure.path.as_str())
            .bind(failure.kind.as_str())
            .bind(&failure.error)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(count = failures.len(), "Stored pending failures");
        Ok(())
    }

    async fn load_failures(&self) -> anyhow::Result<Vec<ActionFailure>> {
        let rows = sqlx::query("SELECT * FROM failed_actions ORDER BY position")
            .fetch_all(&self.pool)
            .await?;

        let mut failures = Vec::with_capacity(rows.len());
        for row in &rows {
            failures.push(failure_from_row(row)?);
        }
        Ok(failures)
    }

    // --- Run history ---

    async fn save_run(&self, run: &RunRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO sync_runs \
             (run_id, started_at, ended_at, files_processed, files_uploaded, \
              files_downloaded, files_deleted, total_bytes, failures, cancelled) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(run.run_id.to_string())
        .bind(format_datetime(&run.started_at))
        .bind(run.ended_at.as_ref().map(format_datetime))
        .bind(run.files_processed as i64)
        .bind(run.files_uploaded as i64)
        .bind(run.files_downloaded as i64)
        .bind(run.files_deleted as i64)
        .bind(run.total_bytes as i64)
        .bind(run.failures as i64)
        .bind(run.cancelled as i64)
        .execute(&self.pool)
        .await?;

        tracing::trace!(run_id = %run.run_id, "Saved run record");
        Ok(())
    }

    async fn recent_runs(&self, limit: u32) -> anyhow::Result<Vec<RunRecord>> {
        let rows = sqlx::query("SELECT * FROM sync_runs ORDER BY started_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut runs = Vec::with_capacity(rows.len());
        for row in &rows {
            runs.push(run_from_row(row)?);
        }
        Ok(runs)
    }
}
