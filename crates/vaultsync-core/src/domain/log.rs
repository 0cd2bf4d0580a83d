//! Sync log entries
//!
//! One entry is written per attempted action. Entries render to a single
//! line of the form:
//!
//! ```text
//! [2024-01-01 12:00:00] [INFO] ✓ upload: notes/a.md
//! [2024-01-01 12:00:01] [ERROR] ✗ delete: b.md (Failed to delete all versions)
//! ```

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Whether the logged attempt succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failure,
}

impl LogStatus {
    /// Lowercase name used in persistence
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    /// Single-character marker used in rendered lines
    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Failure => "✗",
        }
    }
}

impl Display for LogStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(DomainError::ValidationFailed(format!(
                "Unknown log status: {other}"
            ))),
        }
    }
}

/// A persisted sync log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    /// Database row id, `None` until stored
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    /// Action name, e.g. "upload", "download", "delete"
    pub action: String,
    pub path: String,
    pub status: LogStatus,
    pub error: Option<String>,
}

impl SyncLogEntry {
    /// Create an unsaved entry stamped now
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        path: impl Into<String>,
        status: LogStatus,
        error: Option<String>,
    ) -> Self {
        Self {
            id: None,
            timestamp: Utc::now(),
            action: action.into(),
            path: path.into(),
            status,
            error,
        }
    }

    /// Severity label for the rendered line
    #[must_use]
    pub fn level(&self) -> &'static str {
        match self.status {
            LogStatus::Success => "INFO",
            LogStatus::Failure => "ERROR",
        }
    }

    /// The message part without timestamp or level
    #[must_use]
    pub fn message(&self) -> String {
        let mut message = format!("{} {}: {}", self.status.marker(), self.action, self.path);
        if let Some(error) = &self.error {
            message.push_str(&format!(" ({error})"));
        }
        message
    }

    /// Render the full log line
    #[must_use]
    pub fn format_line(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level(),
            self.message()
        )
    }
}
