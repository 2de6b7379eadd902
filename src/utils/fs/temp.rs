//! Uniquely named temporary directories that can outlive their owner.
//!
//! [`ExtractionDirectory`] behaves like a RAII temp dir while an update is being
//! prepared: if extraction fails it is removed on drop. Once the helper has been
//! spawned, ownership moves across the process boundary and the directory is
//! released with [`ExtractionDirectory::keep`] so it survives the caller.

use crate::utils::fs::dirs::{ensure_dir, remove_path};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Fresh extraction directory for one update.
///
/// # Examples
///
/// ```rust,no_run
/// use update_helper::utils::fs::ExtractionDirectory;
///
/// # fn example() -> anyhow::Result<()> {
/// let dir = ExtractionDirectory::new("extract")?;
/// std::fs::write(dir.path().join("helper"), b"...")?;
///
/// // Hand the directory off instead of deleting it
/// let path = dir.keep();
/// assert!(path.exists());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExtractionDirectory {
    path: PathBuf,
    keep: bool,
}

impl ExtractionDirectory {
    /// Creates a new directory named `update-helper_{prefix}_{uuid}` in the system
    /// temporary directory. It is private to the current user on Unix.
    pub fn new(prefix: &str) -> Result<Self> {
        Self::new_in(&std::env::temp_dir(), prefix)
    }

    /// Creates a new directory inside `parent`.
    pub fn new_in(parent: &Path, prefix: &str) -> Result<Self> {
        let unique_name = format!("update-helper_{}_{}", prefix, uuid::Uuid::new_v4());
        let path = parent.join(unique_name);

        ensure_dir(&path, 0o700)?;

        Ok(Self {
            path,
            keep: false,
        })
    }

    /// Path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases ownership: the directory is no longer removed on drop.
    #[must_use]
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ExtractionDirectory {
    fn drop(&mut self) {
        if !self.keep {
            let _ = remove_path(&self.path);
        }
    }
}
