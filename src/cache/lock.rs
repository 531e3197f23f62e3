//! Directory-scoped advisory lock shared by cooperating processes.

use crate::core::constants::LOCK_FILE_NAME;
use crate::core::error::{CacheError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on a metadata directory.
///
/// The lock lives on `<dir>/.lock` and is released when the guard is dropped,
/// on every exit path. The OS also drops it if the holding process dies.
#[derive(Debug)]
pub struct DirectoryLock {
    dir: PathBuf,
    file: File,
}

impl DirectoryLock {
    /// Block until the lock on `dir` is held. Creates `dir` if needed.
    pub fn acquire<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let file = Self::open_lock_file(&dir)?;
        log::debug!("Waiting for lock on {}", dir.display());
        file.lock_exclusive().map_err(|source| CacheError::Lock {
            dir: dir.clone(),
            source,
        })?;
        log::debug!("Acquired lock on {}", dir.display());
        Ok(DirectoryLock { dir, file })
    }

    /// Take the lock on `dir` only if nobody holds it.
    pub fn try_acquire<P: AsRef<Path>>(dir: P) -> Result<Option<Self>> {
        let dir = dir.as_ref().to_path_buf();
        let file = Self::open_lock_file(&dir)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(DirectoryLock { dir, file })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(source) => Err(CacheError::Lock { dir, source }.into()),
        }
    }

    /// Locked directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open_lock_file(dir: &Path) -> Result<File> {
        std::fs::create_dir_all(dir).map_err(|source| CacheError::Lock {
            dir: dir.to_path_buf(),
            source,
        })?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE_NAME))
            .map_err(|source| CacheError::Lock {
                dir: dir.to_path_buf(),
                source,
            })?;
        Ok(file)
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("Failed to release lock on {}: {}", self.dir.display(), e);
        } else {
            log::debug!("Released lock on {}", self.dir.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("meta");

        let guard = DirectoryLock::acquire(&meta).unwrap();
        assert!(meta.join(LOCK_FILE_NAME).exists());
        assert_eq!(guard.dir(), meta.as_path());
        assert!(DirectoryLock::try_acquire(&meta).unwrap().is_none());

        drop(guard);
        let again = DirectoryLock::try_acquire(&meta).unwrap();
        assert!(again.is_some());
    }

    #[test]
    fn test_lock_released_on_error_path() {
        let dir = TempDir::new().unwrap();

        fn failing(dir: &Path) -> Result<()> {
            let _guard = DirectoryLock::acquire(dir)?;
            Err(crate::core::error::ImputeError::internal("rebuild failed"))
        }

        assert!(failing(dir.path()).is_err());
        assert!(DirectoryLock::try_acquire(dir.path()).unwrap().is_some());
    }
}
