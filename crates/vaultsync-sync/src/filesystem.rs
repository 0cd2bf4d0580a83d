//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] over a vault root directory.
//!
//! ## Design Decisions
//!
//! - **Scan**: `walkdir` on a blocking thread. Symlinks are not followed and
//!   only regular files are reported. A missing root is an error, never an
//!   empty vault, so a mistyped root cannot turn every remote object into
//!   an orphan.
//! - **Atomic writes**: write-to-temp + rename in the target directory.
//! - **Touch**: sets the modification time through `File::set_modified`.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use vaultsync_core::domain::newtypes::ObjectPath;
use vaultsync_core::ports::{ILocalFileSystem, LocalEntry};

use crate::LocalError;

/// Adapter that bridges the [`ILocalFileSystem`] port to a vault directory
#[derive(Debug, Clone)]
pub struct LocalFileSystemAdapter {
    root: PathBuf,
}

impl LocalFileSystemAdapter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(root: &Path) -> Result<Vec<LocalEntry>, LocalError> {
        if !root.is_dir() {
            return Err(LocalError::RootMissing(root.to_path_buf()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let path = match ObjectPath::from_relative(relative) {
                Ok(path) => path,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Skipping file");
                    continue;
                }
            };
            let metadata = entry.metadata().map_err(std::io::Error::from)?;
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            entries.push(LocalEntry {
                path,
                size: metadata.len(),
                modified,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn tmp_path(target: &Path) -> PathBuf {
        let mut p = target.as_os_str().to_owned();
        p.push(".tmp");
        PathBuf::from(p)
    }
}

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn enumerate(&self) -> anyhow::Result<Vec<LocalEntry>> {
        let root = self.root.clone();
        let entries = tokio::task::spawn_blocking(move || Self::scan(&root)).await??;
        debug!(files = entries.len(), "scan complete");
        Ok(entries)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn read(&self, path: &ObjectPath) -> anyhow::Result<Vec<u8>> {
        let data = tokio::fs::read(path.to_local(&self.root)).await?;
        debug!(bytes = data.len(), "file read complete");
        Ok(data)
    }

    #[instrument(skip(self, content), fields(path = %path, bytes = content.len()))]
    async fn write(&self, path: &ObjectPath, content: &[u8]) -> anyhow::Result<()> {
        let target = path.to_local(&self.root);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = Self::tmp_path(&target);
        tokio::fs::write(&tmp_path, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &target).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!("write complete");
        Ok(())
    }

    async fn modified(&self, path: &ObjectPath) -> anyhow::Result<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(path.to_local(&self.root)).await?;
        Ok(DateTime::<Utc>::from(metadata.modified()?))
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn touch(&self, path: &ObjectPath) -> anyhow::Result<DateTime<Utc>> {
        let target = path.to_local(&self.root);
        let modified = tokio::task::spawn_blocking(move || -> std::io::Result<SystemTime> {
            let now = SystemTime::now();
            let file = std::fs::File::options().write(true).open(&target)?;
            file.set_modified(now)?;
            Ok(now)
        })
        .await??;
        Ok(DateTime::<Utc>::from(modified))
    }

    async fn exists(&self, path: &ObjectPath) -> anyhow::Result<bool> {
        Ok(tokio::fs::try_exists(path.to_local(&self.root)).await?)
    }
}
