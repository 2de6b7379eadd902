//! Decoding of archive entry attributes.
//!
//! Zip archives created on Unix keep the file's `st_mode` in the upper 16 bits of
//! the 32-bit "external attributes" word. Of that we use two things:
//!
//! - bits 28..=31: the file type nibble; `10` (`S_IFLNK >> 12`) marks a symlink
//! - bits 16..=24: the permission mask (`rwxrwxrwx`)
//!
//! All knowledge of that layout lives in [`EntryKind::decode`].

/// Type nibble of a symbolic link (`0o120000 >> 12`).
const SYMLINK_TYPE: u32 = 10;

/// Owner-execute bit within the permission mask.
const OWNER_EXEC: u32 = 0o100;

/// Mode of every extracted regular file before execute bits are granted.
const FILE_BASE_MODE: u32 = 0o644;

/// Mode applied to extracted symlinks where the platform allows it.
const SYMLINK_MODE: u32 = 0o644;

/// Mode of directories created during extraction.
pub const DIR_MODE: u32 = 0o755;

/// What an archive entry materializes as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory; created with [`DIR_MODE`].
    Directory,
    /// A symbolic link; the payload is the link target.
    Symlink {
        /// Mode to apply to the link itself
        mode: u32,
    },
    /// A regular file; the payload is its content.
    File {
        /// Mode to apply after writing
        mode: u32,
    },
}

impl EntryKind {
    /// Decode an entry from its attribute word and directory flag.
    ///
    /// The symlink check wins over the directory flag. A regular file gets `0o644`,
    /// plus execute for everyone when the archived owner-execute bit is set.
    #[must_use]
    pub const fn decode(attr: u32, is_dir: bool) -> Self {
        if (attr >> 28) & 0xF == SYMLINK_TYPE {
            Self::Symlink {
                mode: SYMLINK_MODE,
            }
        } else if is_dir {
            Self::Directory
        } else {
            let mut mode = FILE_BASE_MODE;
            if permissions(attr) & OWNER_EXEC != 0 {
                mode |= 0o111;
            }
            Self::File {
                mode,
            }
        }
    }
}

/// Permission mask stored in the attribute word.
#[must_use]
pub const fn permissions(attr: u32) -> u32 {
    (attr >> 16) & 0o777
}

/// Rebuild the attribute word from a Unix mode as reported by the zip reader.
#[must_use]
pub const fn attr_from_unix_mode(mode: u32) -> u32 {
    mode << 16
}
