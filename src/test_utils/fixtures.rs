//! Archive fixtures for tests
//!
//! Builds zip archives shaped like the released helper archives, including Unix
//! modes, directories and symlinks.

use crate::models::PlatformTag;
use anyhow::Result;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Shell script standing in for the helper binary; it exits successfully.
pub const FAKE_HELPER_SCRIPT: &str = "#!/bin/sh\nexit 0\n";

#[derive(Debug, Clone)]
enum FixtureEntry {
    File {
        name: String,
        content: Vec<u8>,
        mode: u32,
    },
    Directory {
        name: String,
    },
    Symlink {
        name: String,
        target: String,
    },
}

/// Builder for zip archives.
#[derive(Debug, Clone, Default)]
pub struct ArchiveFixture {
    entries: Vec<FixtureEntry>,
}

impl ArchiveFixture {
    /// Empty archive
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive containing only an executable helper for `platform`
    #[must_use]
    pub fn with_helper(platform: PlatformTag) -> Self {
        Self::new().file(&platform.helper_file_name(), FAKE_HELPER_SCRIPT, 0o755)
    }

    /// Add a regular file
    #[must_use]
    pub fn file(mut self, name: &str, content: impl AsRef<[u8]>, mode: u32) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            content: content.as_ref().to_vec(),
            mode,
        });
        self
    }

    /// Add a directory entry
    #[must_use]
    pub fn directory(mut self, name: &str) -> Self {
        self.entries.push(FixtureEntry::Directory {
            name: name.to_string(),
        });
        self
    }

    /// Add a symbolic link
    #[must_use]
    pub fn symlink(mut self, name: &str, target: &str) -> Self {
        self.entries.push(FixtureEntry::Symlink {
            name: name.to_string(),
            target: target.to_string(),
        });
        self
    }

    /// Serialize the archive
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            match entry {
                FixtureEntry::File {
                    name,
                    content,
                    mode,
                } => {
                    let options = SimpleFileOptions::default().unix_permissions(*mode);
                    writer.start_file(name.as_str(), options)?;
                    writer.write_all(content)?;
                }
                FixtureEntry::Directory {
                    name,
                } => {
                    let options = SimpleFileOptions::default().unix_permissions(0o755);
                    writer.add_directory(name.as_str(), options)?;
                }
                FixtureEntry::Symlink {
                    name,
                    target,
                } => {
                    let options = SimpleFileOptions::default().unix_permissions(0o777);
                    writer.add_symlink(name.as_str(), target.as_str(), options)?;
                }
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the archive to `dir/name` and return its path
    pub fn write_to(&self, dir: &Path, name: &str) -> Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, self.to_bytes()?)?;
        Ok(path)
    }
}
