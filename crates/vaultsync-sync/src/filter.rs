//! Include/exclude path filter
//!
//! A path takes part in the sync when it matches at least one include
//! pattern and no exclude pattern. The same filter is applied to the local
//! scan and to the remote snapshot, so filtered-out objects are neither
//! actions nor orphans.

use glob::{MatchOptions, Pattern};

use vaultsync_core::config::SyncConfig;

use crate::LocalError;

/// `*` stays within one path segment; `**` crosses segments
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled include/exclude globs
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, LocalError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| LocalError::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, LocalError> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, LocalError> {
        Self::new(&config.include, &config.exclude)
    }

    /// Filter that accepts every path
    pub fn accept_all() -> Self {
        Self {
            include: vec![Pattern::new("**").unwrap_or_default()],
            exclude: Vec::new(),
        }
    }

    /// Returns true if `path` takes part in the sync
    pub fn is_included(&self, path: &str) -> bool {
        self.include
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }
}
