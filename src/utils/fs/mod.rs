//! File system utilities for the replacement protocol
//!
//! This module holds the filesystem primitives both processes rely on:
//! directory creation with an explicit mode, merge-copy of files or trees,
//! `rm -rf`-style removal, access checks, and the extraction directory that
//! is handed from the caller to its restarted successor.
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_helper::utils::fs::{copy_path, is_writable, remove_path};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let target = Path::new("/opt/app/bin/app");
//! if is_writable(target) {
//!     copy_path(Path::new("staging/app"), target)?;
//!     remove_path(Path::new("staging"))?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Platform Considerations
//!
//! - **Unix**: directory modes are honored (minus umask), symlinks are copied as
//!   links, access checks go through `access(2)`
//! - **Windows**: modes are ignored, symlinks are copied as their targets, write
//!   access is the absence of the read-only attribute

pub mod access;
pub mod dirs;
pub mod temp;

pub use access::{is_readable, is_writable};
pub use dirs::{copy_path, ensure_dir, remove_path};
pub use temp::ExtractionDirectory;
