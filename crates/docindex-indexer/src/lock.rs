//! Advisory run lock.
//!
//! An exclusive OS lock on a file in the root, taken with `fs2`. The kernel
//! releases it when the holder exits, so a lock file left behind by a crashed
//! run never blocks the next one. The holder's PID is written into the file
//! for diagnostics only.

use crate::IndexerError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Held for the duration of a run; the lock is released on drop.
///
/// The file itself stays in place. Removing it would let a second run lock a
/// fresh inode while a third still waits on the old one.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    file: File,
}

impl RunLock {
    /// Try once to take the lock at `path`.
    ///
    /// Returns [`IndexerError::LockHeld`] when another handle holds it.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, IndexerError> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(IndexerError::LockHeld {
                    pid: read_pid(&mut file).unwrap_or_default(),
                });
            }
            return Err(e.into());
        }

        let pid = std::process::id();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(pid.to_string().as_bytes())?;
        file.sync_all()?;

        debug!(path = ?path, pid, "Run lock acquired");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.set_len(0) {
            debug!(path = ?self.path, error = %e, "Failed to clear run lock");
        }
        if let Err(e) = self.file.unlock() {
            debug!(path = ?self.path, error = %e, "Failed to release run lock");
        }
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut content).ok()?;
    content.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pid_in(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path).ok()?.trim().parse().ok()
    }

    #[test]
    fn test_acquire_writes_pid_and_drop_releases() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(".search_index.lock");

        {
            let lock = RunLock::acquire(&path).unwrap();
            assert_eq!(lock.path(), path);
            if cfg!(unix) {
                assert_eq!(pid_in(&path), Some(std::process::id()));
            }
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        let _again = RunLock::acquire(&path).unwrap();
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(".search_index.lock");

        let _held = RunLock::acquire(&path).unwrap();
        let result = RunLock::acquire(&path);

        match result {
            Err(IndexerError::LockHeld { pid }) => {
                if cfg!(unix) {
                    assert_eq!(pid, std::process::id());
                }
            }
            other => panic!("expected LockHeld, got {other:?}"),
        }
        assert!(path.exists());
    }

    #[test]
    fn test_leftover_lock_file_does_not_block() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(".search_index.lock");
        // A crashed run leaves its file and PID behind but no OS lock
        std::fs::write(&path, std::process::id().to_string()).unwrap();

        let _lock = RunLock::acquire(&path).unwrap();
        assert!(RunLock::acquire(&path).is_err());
    }

    #[test]
    fn test_garbage_lock_file_is_overwritten() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(".search_index.lock");
        std::fs::write(&path, "not a pid, and longer than any pid").unwrap();

        let _lock = RunLock::acquire(&path).unwrap();
        if cfg!(unix) {
            assert_eq!(pid_in(&path), Some(std::process::id()));
        }
    }

    #[test]
    fn test_lock_is_exclusive_across_threads() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(".search_index.lock");
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    RunLock::acquire(&path).ok()
                })
            })
            .collect();

        let held: Vec<RunLock> = handles
            .into_iter()
            .filter_map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(held.len(), 1);
    }
}
