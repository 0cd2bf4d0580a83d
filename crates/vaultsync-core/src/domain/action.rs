//! Sync actions, orphan decisions and per-action outcomes

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::ObjectPath;
use super::remote::RemoteObject;

// ============================================================================
// ActionKind / SyncAction
// ============================================================================

/// What an action does to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Send local content to the bucket
    Upload,
    /// Fetch remote content into the local tree
    Download,
    /// Remove every remote version of the path
    Delete,
}

impl ActionKind {
    /// Lowercase name used in logs and persistence
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Delete => "delete",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(Self::Upload),
            "download" => Ok(Self::Download),
            "delete" => Ok(Self::Delete),
            other => Err(DomainError::InvalidDecision(format!(
                "Unknown action kind: {other}"
            ))),
        }
    }
}

/// One unit of work against a single path
///
/// Immutable once built. The action sequence of a run is fixed after
/// orphan resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncAction {
    kind: ActionKind,
    path: ObjectPath,
}

impl SyncAction {
    /// Create an action
    #[must_use]
    pub fn new(kind: ActionKind, path: ObjectPath) -> Self {
        Self { kind, path }
    }

    /// Upload `path`
    #[must_use]
    pub fn upload(path: ObjectPath) -> Self {
        Self::new(ActionKind::Upload, path)
    }

    /// Download `path`
    #[must_use]
    pub fn download(path: ObjectPath) -> Self {
        Self::new(ActionKind::Download, path)
    }

    /// Delete `path` remotely
    #[must_use]
    pub fn delete(path: ObjectPath) -> Self {
        Self::new(ActionKind::Delete, path)
    }

    /// The action kind
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// The target path
    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }
}

impl Display for SyncAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.path)
    }
}

// ============================================================================
// Orphans
// ============================================================================

/// Caller decision for a remote object with no local counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanDecision {
    /// Delete every remote version
    Delete,
    /// Bring the object into the local tree
    Download,
    /// Leave it alone this run
    #[default]
    Skip,
}

impl OrphanDecision {
    /// Lowercase name used in configuration and prompts
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Download => "download",
            Self::Skip => "skip",
        }
    }
}

impl Display for OrphanDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrphanDecision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delete" | "d" => Ok(Self::Delete),
            "download" | "dl" => Ok(Self::Download),
            "skip" | "s" => Ok(Self::Skip),
            other => Err(DomainError::InvalidDecision(format!(
                "Unknown orphan decision: {other}"
            ))),
        }
    }
}

/// A remote object without a local counterpart, with its pending decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOrphan {
    /// The remote object
    pub object: RemoteObject,
    /// Decision to apply, `Skip` until resolved
    pub decision: OrphanDecision,
}

impl RemoteOrphan {
    /// Wrap a remote object with the default decision
    #[must_use]
    pub fn new(object: RemoteObject) -> Self {
        Self {
            object,
            decision: OrphanDecision::default(),
        }
    }

    /// Path of the orphaned object
    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.object.path
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// A failed action, kept for the report and the retry path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    /// Target path
    pub path: ObjectPath,
    /// Kind of the action that failed
    pub kind: ActionKind,
    /// Rendered error message
    pub error: String,
}

impl ActionFailure {
    /// Record a failure of `action`
    #[must_use]
    pub fn new(action: &SyncAction, error: impl Into<String>) -> Self {
        Self {
            path: action.path().clone(),
            kind: action.kind(),
            error: error.into(),
        }
    }

    /// Rebuild the action that failed, preserving its kind
    #[must_use]
    pub fn to_action(&self) -> SyncAction {
        SyncAction::new(self.kind, self.path.clone())
    }
}

/// Result of applying one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action completed; `bytes` is the transferred size (0 for deletes)
    Succeeded {
        /// The applied action
        action: SyncAction,
        /// Bytes transferred
        bytes: u64,
    },
    /// The action failed and was isolated
    Failed(ActionFailure),
}

impl ActionOutcome {
    /// Returns true for a successful outcome
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Path the outcome refers to
    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        match self {
            Self::Succeeded { action, .. } => action.path(),
            Self::Failed(failure) => &failure.path,
        }
    }

    /// Kind of the action the outcome refers to
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Succeeded { action, .. } => action.kind(),
            Self::Failed(failure) => failure.kind,
        }
    }
}
