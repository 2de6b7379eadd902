//! The handoff slot between `update()` and the next `cleanup()`.
//!
//! A single environment variable, written into the helper's environment at spawn
//! time and inherited by whatever the helper restarts. It is read and cleared at
//! most once per process; an absent or empty variable means there is nothing to
//! clean up.

use crate::constants::CLEANUP_DIR_ENV;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment-backed slot holding the extraction directory of a finished update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffSlot {
    name: &'static str,
}

impl Default for HandoffSlot {
    fn default() -> Self {
        Self::new(CLEANUP_DIR_ENV)
    }
}

impl HandoffSlot {
    /// Slot backed by the environment variable `name`.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
        }
    }

    /// Name of the backing variable.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Write `directory` into the environment of `command`.
    ///
    /// This is the only write side of the slot; the process environment of the
    /// caller itself is left untouched.
    pub fn apply<'a>(&self, command: &'a mut Command, directory: &Path) -> &'a mut Command {
        command.env(self.name, directory)
    }

    /// Current value without clearing it.
    #[must_use]
    pub fn peek(&self) -> Option<PathBuf> {
        std::env::var_os(self.name).filter(|v| !v.is_empty()).map(PathBuf::from)
    }

    /// Read and clear the slot.
    ///
    /// Returns `None` when the variable is unset or empty; a second call after a
    /// successful take always returns `None`.
    pub fn take(&self) -> Option<PathBuf> {
        let value = self.peek()?;
        // SAFETY: called from the caller's startup path, before worker threads read
        // the environment
        unsafe {
            std::env::remove_var(self.name);
        }
        Some(value)
    }
}
