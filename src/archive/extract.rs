//! Extraction of the helper archive with Unix metadata.
//!
//! The zip reader hands back names and payloads; everything about file types and
//! modes comes from [`EntryKind::decode`]. Parent directories are created the first
//! time an entry needs them and remembered, so siblings never create the same
//! directory twice.
//!
//! Nothing is ever written outside the root: entry names must stay below it, no
//! entry may be written at or beneath a symlink extracted earlier, and symlink
//! targets must be relative and stay inside the root.

use crate::archive::attributes::{DIR_MODE, EntryKind, attr_from_unix_mode};
use crate::core::{BestEffort, UpdateError};
use crate::utils::fs::ensure_dir;
use crate::utils::progress::StepProgress;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// One entry read from the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path relative to the extraction root
    pub name: PathBuf,
    /// Raw payload: file content or symlink target
    pub data: Vec<u8>,
    /// Whether the archive marks the entry as a directory
    pub is_dir: bool,
    /// 32-bit attribute word (`st_mode << 16` for Unix archives)
    pub attr: u32,
}

impl ArchiveEntry {
    /// Decoded entry type.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        EntryKind::decode(self.attr, self.is_dir)
    }
}

/// What an extraction run produced.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Number of entries materialized
    pub entries: usize,
    /// Outcome of applying permissions to each extracted symlink
    pub symlink_modes: Vec<(PathBuf, BestEffort)>,
}

/// Extract the zip archive at `archive` into `root`.
///
/// Progress is reported as entry index / entry count after each entry.
///
/// # Errors
///
/// Fails on unreadable archives, entries whose names escape `root`
/// ([`UpdateError::Payload`]), and any filesystem error other than applying a
/// symlink's permissions.
pub fn extract_archive(
    archive: &Path,
    root: &Path,
    progress: &mut StepProgress,
) -> Result<ExtractionReport> {
    progress.start();

    let file = std::fs::File::open(archive)
        .with_context(|| format!("Failed to open archive {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(UpdateError::from)?;

    let mut extractor = Extractor::new(root);
    let count = zip.len();
    for index in 0..count {
        let entry = read_entry(&mut zip, index)?;
        extractor.materialize(&entry)?;
        progress.ratio(index as u64 + 1, Some(count as u64));
    }

    progress.finish();
    Ok(extractor.into_report())
}

fn read_entry(zip: &mut zip::ZipArchive<std::fs::File>, index: usize) -> Result<ArchiveEntry> {
    let mut file = zip.by_index(index).map_err(UpdateError::from)?;

    let name = file.enclosed_name().ok_or_else(|| UpdateError::Payload {
        reason: format!("archive entry '{}' escapes the extraction directory", file.name()),
    })?;
    let is_dir = file.is_dir();
    let attr = file.unix_mode().map_or(0, attr_from_unix_mode);

    let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut data)
        .with_context(|| format!("Failed to read archive entry '{}'", name.display()))?;

    Ok(ArchiveEntry {
        name,
        data,
        is_dir,
        attr,
    })
}

/// Writes entries below a root, creating directories on demand.
pub struct Extractor {
    root: PathBuf,
    created: HashSet<PathBuf>,
    report: ExtractionReport,
}

impl Extractor {
    /// Create an extractor writing below `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            created: HashSet::new(),
            report: ExtractionReport::default(),
        }
    }

    /// Materialize one entry.
    pub fn materialize(&mut self, entry: &ArchiveEntry) -> Result<()> {
        let path = self.root.join(&entry.name);
        let kind = entry.kind();
        self.reject_symlinks_on_path(&entry.name)?;

        let dir = match kind {
            EntryKind::Directory => path.clone(),
            _ => path.parent().map_or_else(|| self.root.clone(), Path::to_path_buf),
        };
        self.ensure_dir_once(&dir)?;

        match kind {
            EntryKind::Directory => {
                debug!("Extracted directory {}", entry.name.display());
            }
            EntryKind::Symlink {
                mode,
            } => {
                let link_target = String::from_utf8_lossy(&entry.data).into_owned();
                check_link_target(&entry.name, &link_target)?;
                create_symlink(&link_target, &path)?;
                let outcome = set_symlink_mode(&path, mode);
                if let BestEffort::Ignored {
                    reason,
                } = &outcome
                {
                    debug!("Ignoring symlink permissions on {}: {}", path.display(), reason);
                }
                debug!("Extracted symlink {} -> {}", entry.name.display(), link_target);
                self.report.symlink_modes.push((path, outcome));
            }
            EntryKind::File {
                mode,
            } => {
                std::fs::write(&path, &entry.data)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                set_file_mode(&path, mode)?;
                debug!("Extracted file {} ({:o})", entry.name.display(), mode);
            }
        }

        self.report.entries += 1;
        Ok(())
    }

    /// Consume the extractor, returning what it produced.
    #[must_use]
    pub fn into_report(self) -> ExtractionReport {
        self.report
    }

    fn reject_symlinks_on_path(&self, name: &Path) -> Result<()> {
        let mut current = self.root.clone();
        for component in name.components() {
            current.push(component);
            let is_link = std::fs::symlink_metadata(&current)
                .is_ok_and(|meta| meta.file_type().is_symlink());
            if is_link {
                return Err(UpdateError::Payload {
                    reason: format!(
                        "archive entry '{}' would be written through symlink '{}'",
                        name.display(),
                        current.display()
                    ),
                }
                .into());
            }
        }
        Ok(())
    }

    fn ensure_dir_once(&mut self, dir: &Path) -> Result<()> {
        if !self.created.contains(dir) {
            ensure_dir(dir, DIR_MODE)?;
            self.created.insert(dir.to_path_buf());
        }
        Ok(())
    }
}

/// Reject link targets that are absolute or climb above the extraction root.
fn check_link_target(name: &Path, target: &str) -> Result<()> {
    let escapes = || UpdateError::Payload {
        reason: format!(
            "symlink '{}' -> '{}' points outside the extraction directory",
            name.display(),
            target
        ),
    };

    let mut depth = name.parent().map_or(0, |parent| parent.components().count());
    for component in Path::new(target).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => depth = depth.checked_sub(1).ok_or_else(escapes)?,
            Component::RootDir | Component::Prefix(_) => return Err(escapes().into()),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &str, path: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, path)
        .with_context(|| format!("Failed to create symlink {} -> {}", path.display(), target))
}

#[cfg(windows)]
fn create_symlink(target: &str, path: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(target, path)
        .with_context(|| format!("Failed to create symlink {} -> {}", path.display(), target))
}

#[cfg(unix)]
fn set_symlink_mode(path: &Path, mode: u32) -> BestEffort {
    use nix::sys::stat::{FchmodatFlags, Mode, fchmodat};

    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return BestEffort::Ignored {
            reason: format!("{} has no parent directory", path.display()),
        };
    };
    let dir = match std::fs::File::open(parent) {
        Ok(dir) => dir,
        Err(e) => return BestEffort::from_result(Err(e)),
    };
    let mode = Mode::from_bits_truncate(mode as nix::libc::mode_t);
    BestEffort::from_result(fchmodat(&dir, name, mode, FchmodatFlags::NoFollowSymlink))
}

#[cfg(not(unix))]
fn set_symlink_mode(_path: &Path, _mode: u32) -> BestEffort {
    BestEffort::Ignored {
        reason: "symlink permissions are not supported on this platform".to_string(),
    }
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
