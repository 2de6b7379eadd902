//! Access checks run before any destructive step.
//!
//! On Unix these ask the kernel via `access(2)`, so ACLs, read-only mounts and
//! the real user id are all taken into account. Elsewhere they fall back to
//! opening the file or inspecting the read-only attribute.

use std::path::Path;

/// Returns `true` if `path` exists and the current user may read it.
#[must_use]
pub fn is_readable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{AccessFlags, access};
        access(path, AccessFlags::F_OK | AccessFlags::R_OK).is_ok()
    }
    #[cfg(not(unix))]
    {
        if path.is_dir() {
            std::fs::read_dir(path).is_ok()
        } else {
            std::fs::File::open(path).is_ok()
        }
    }
}

/// Returns `true` if `path` exists and the current user may write to it.
#[must_use]
pub fn is_writable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{AccessFlags, access};
        access(path, AccessFlags::W_OK).is_ok()
    }
    #[cfg(not(unix))]
    {
        std::fs::metadata(path).is_ok_and(|m| !m.permissions().readonly())
    }
}
