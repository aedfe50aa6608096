use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::{ChainError, Result};

/// Exclusive write lock held for the duration of one fetch/plan/commit
/// sequence. Released when dropped.
pub struct WriteLock {
    _file: File,
}

impl WriteLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.try_lock_exclusive()
            .map_err(|_| ChainError::Locked(path.display().to_string()))?;

        Ok(Self { _file: file })
    }
}
