//! Exclusive writer lock
//!
//! An advisory `flock` on a well-known file in the temp directory serializes
//! publisher invocations across processes. Readers never touch this file.

use crate::error::{Error, Result};
use nix::fcntl::{Flock, FlockArg};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the lock inside the temp directory
pub const LOCK_FILE_NAME: &str = "waystore.lock";

/// Scoped exclusive flock; released on drop, including every error path
pub struct WriterLock {
    _lock: Flock<File>,
}

impl WriterLock {
    /// Default lock path, `$TMPDIR/waystore.lock`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(LOCK_FILE_NAME)
    }

    /// Acquire the writer lock at the default path
    pub fn acquire() -> Result<Self> {
        Self::acquire_at(&Self::default_path())
    }

    /// Acquire the writer lock at `path`, creating the file if absent.
    ///
    /// A contended lock is reported once, then the call blocks until the
    /// other writer finishes; contention is never an error.
    pub fn acquire_at(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => Ok(Self { _lock: lock }),
            Err((file, nix::errno::Errno::EWOULDBLOCK)) => {
                info!("data update in progress, waiting until it finishes...");
                let lock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| {
                    Error::Io {
                        path: path.to_path_buf(),
                        source: std::io::Error::from_raw_os_error(errno as i32),
                    }
                })?;
                info!("writer lock acquired");
                Ok(Self { _lock: lock })
            }
            Err((_, errno)) => Err(Error::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from_raw_os_error(errno as i32),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_creates_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let lock = WriterLock::acquire_at(&path).unwrap();
        assert!(path.exists());
        drop(lock);
    }

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let lock = WriterLock::acquire_at(&path).unwrap();

        let contended_path = path.clone();
        let handle = std::thread::spawn(move || {
            // blocks until the first lock drops
            let _second = WriterLock::acquire_at(&contended_path).unwrap();
            std::time::Instant::now()
        });

        std::thread::sleep(std::time::Duration::from_millis(150));
        let released_at = std::time::Instant::now();
        drop(lock);

        let acquired_at = handle.join().unwrap();
        assert!(acquired_at >= released_at);
    }
}
