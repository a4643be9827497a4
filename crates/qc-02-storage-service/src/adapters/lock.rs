//! # Data Directory Locking
//!
//! Keeps a second node process from opening the same file-backed store.
//! Two writers on one data file would interleave whole-file rewrites and lose
//! commits.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on Windows).

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from data directory locking
#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to create lock file: {0}")]
    CreateFailed(#[source] io::Error),

    #[error("data directory already in use ({}), holder pid {:?}", .path.display(), .pid)]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },

    #[error("failed to write PID to lock file: {0}")]
    WriteFailed(#[source] io::Error),
}

/// Exclusive lock on a data directory, released on drop.
pub struct DatabaseLock {
    /// Kept open to hold the lock.
    file: File,
    path: PathBuf,
    pid: u32,
}

impl DatabaseLock {
    const LOCK_FILE: &'static str = "LOCK";

    /// Acquire an exclusive lock on `data_dir`, creating it if needed.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        std::fs::create_dir_all(data_dir).map_err(LockError::CreateFailed)?;
        let lock_path = data_dir.join(Self::LOCK_FILE);

        // Not truncated before locking: the holder's PID must stay readable.
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(LockError::CreateFailed)?;

        if file.try_lock_exclusive().is_err() {
            return Err(LockError::AlreadyLocked {
                pid: Self::read_existing_pid(&lock_path),
                path: lock_path,
            });
        }

        let pid = std::process::id();
        file.set_len(0).map_err(LockError::WriteFailed)?;
        writeln!(file, "{}", pid).map_err(LockError::WriteFailed)?;
        file.sync_all().map_err(LockError::WriteFailed)?;

        tracing::debug!(path = %lock_path.display(), pid = pid, "Acquired data directory lock");

        Ok(Self {
            file,
            path: lock_path,
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}
