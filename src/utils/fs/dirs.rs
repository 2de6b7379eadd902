//! Directory and path operations for creating, copying, and removing trees.
//!
//! These are the primitives behind the helper's Replace, Unstage and
//! resource-cleanup steps, and behind lazy directory creation during
//! extraction. They all take a path that may be a file, a directory, or a
//! symbolic link.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// On Unix newly created directories get `mode` (subject to the umask); on other
/// platforms `mode` is ignored.
///
/// # Returns
///
/// - `Ok(())` if the directory exists or was successfully created
/// - `Err` if the path exists but is not a directory, or creation fails
///
/// # Examples
///
/// ```rust,no_run
/// use update_helper::utils::fs::ensure_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// ensure_dir(Path::new("output/bin/subdir"), 0o755)?;
/// # Ok(())
/// # }
/// ```
pub fn ensure_dir(path: &Path, mode: u32) -> Result<()> {
    if !path.exists() {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        builder.create(path).with_context(|| {
            format!(
                "Failed to create directory: {}\n\nCheck directory permissions and path validity",
                path.display()
            )
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Copies a file or a directory tree onto `dst`, overwriting what is there.
///
/// - A regular file is copied over `dst` (permissions travel with it).
/// - A directory is merged into `dst`: missing directories are created, files
///   that exist on both sides are overwritten, extra files in `dst` are kept.
/// - On Unix, symbolic links are recreated as links, never followed.
///
/// # Examples
///
/// ```rust,no_run
/// use update_helper::utils::fs::copy_path;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// copy_path(Path::new("staging/app"), Path::new("/opt/app"))?;
/// # Ok(())
/// # }
/// ```
pub fn copy_path(src: &Path, dst: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(src)
        .with_context(|| format!("Failed to read metadata of {}", src.display()))?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        copy_symlink(src, dst)
    } else if file_type.is_dir() {
        copy_dir(src, dst)
    } else {
        if fs::symlink_metadata(dst).is_ok_and(|m| m.file_type().is_symlink()) {
            fs::remove_file(dst)
                .with_context(|| format!("Failed to replace symlink {}", dst.display()))?;
        }
        fs::copy(src, dst).with_context(|| {
            format!("Failed to copy file from {} to {}", src.display(), dst.display())
        })?;
        Ok(())
    }
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if !dst.is_dir() {
        if fs::symlink_metadata(dst).is_ok() {
            remove_path(dst)?;
        }
        fs::create_dir_all(dst)
            .with_context(|| format!("Failed to create directory: {}", dst.display()))?;
    }

    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        copy_path(&entry.path(), &dst.join(entry.file_name()))?;
    }

    #[cfg(unix)]
    {
        let permissions = fs::metadata(src)?.permissions();
        fs::set_permissions(dst, permissions)
            .with_context(|| format!("Failed to set permissions on {}", dst.display()))?;
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let link_target =
        fs::read_link(src).with_context(|| format!("Failed to read link {}", src.display()))?;
    if fs::symlink_metadata(dst).is_ok() {
        remove_path(dst)?;
    }
    std::os::unix::fs::symlink(&link_target, dst)
        .with_context(|| format!("Failed to create symlink {}", dst.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst).with_context(|| {
        format!("Failed to copy file from {} to {}", src.display(), dst.display())
    })?;
    Ok(())
}

/// Removes a file, symbolic link, or directory tree.
///
/// A path that does not exist is not an error. Symbolic links are removed
/// themselves; their targets are never touched.
pub fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to access {}", path.display()));
        }
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))
    } else {
        fs::remove_file(path).with_context(|| format!("Failed to remove file: {}", path.display()))
    }
}
