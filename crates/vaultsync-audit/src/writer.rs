//! Size-capped log file writer
//!
//! [`SizeRotatingWriter`] plugs into `tracing_subscriber::fmt().with_writer(..)`.
//! When the file grows past its cap it is renamed to `<name>.log.old`
//! (replacing any previous generation) and a fresh file is opened.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

type SharedFile = Arc<Mutex<Option<BufWriter<File>>>>;

/// Log file writer that rotates once the file exceeds `max_size` bytes
#[derive(Clone)]
pub struct SizeRotatingWriter {
    file_path: PathBuf,
    max_size: u64,
    writer: SharedFile,
}

impl SizeRotatingWriter {
    /// Opens `file_path` for appending with a cap of `max_size_mb` MiB.
    pub fn new(file_path: &Path, max_size_mb: u64) -> io::Result<Self> {
        Self::with_max_bytes(file_path, max_size_mb.saturating_mul(1024 * 1024))
    }

    /// Opens `file_path` for appending with a cap of `max_size` bytes.
    pub fn with_max_bytes(file_path: &Path, max_size: u64) -> io::Result<Self> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = open_file(file_path, max_size)?;

        Ok(Self {
            file_path: file_path.to_path_buf(),
            max_size,
            writer: Arc::new(Mutex::new(Some(writer))),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Path of the previous generation
    pub fn backup_path(&self) -> PathBuf {
        backup_path(&self.file_path)
    }
}

fn lock(shared: &SharedFile) -> MutexGuard<'_, Option<BufWriter<File>>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn backup_path(file_path: &Path) -> PathBuf {
    file_path.with_extension("log.old")
}

fn over_cap(file_path: &Path, max_size: u64) -> bool {
    fs::metadata(file_path)
        .map(|m| m.len() > max_size)
        .unwrap_or(false)
}

/// Opens the file for appending, rotating first if it is already over the cap.
fn open_file(file_path: &Path, max_size: u64) -> io::Result<BufWriter<File>> {
    if over_cap(file_path, max_size) {
        rotate(file_path)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;
    Ok(BufWriter::new(file))
}

fn rotate(file_path: &Path) -> io::Result<()> {
    let backup = backup_path(file_path);
    if backup.exists() {
        fs::remove_file(&backup)?;
    }
    fs::rename(file_path, &backup)
}

/// Closes the current handle, rotates, and reopens. Caller holds the lock.
fn rotate_locked(
    guard: &mut Option<BufWriter<File>>,
    file_path: &Path,
    max_size: u64,
) -> io::Result<()> {
    if let Some(mut w) = guard.take() {
        let _ = w.flush();
    }
    rotate(file_path)?;
    *guard = Some(open_file(file_path, max_size)?);
    Ok(())
}

/// Per-event writer handed out by [`SizeRotatingWriter`]
pub struct LogWriter {
    inner: SharedFile,
    file_path: PathBuf,
    max_size: u64,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = lock(&self.inner);
        let written = match guard.as_mut() {
            Some(writer) => {
                let n = writer.write(buf)?;
                writer.flush()?;
                n
            }
            None => return Err(io::Error::new(io::ErrorKind::Other, "Log file not open")),
        };

        if over_cap(&self.file_path, self.max_size) {
            // A failed rotation keeps appending to the oversized file
            if let Err(e) = rotate_locked(&mut guard, &self.file_path, self.max_size) {
                eprintln!("log rotation failed: {e}");
            }
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match lock(&self.inner).as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SizeRotatingWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            inner: Arc::clone(&self.writer),
            file_path: self.file_path.clone(),
            max_size: self.max_size,
        }
    }
}
