//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Copy, remove and access-check primitives, plus the extraction directory
//! - [`progress`] - Step progress reporting and terminal progress bars
//!
//! # Example
//!
//! ```rust,no_run
//! use update_helper::utils::{copy_path, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("output/bin"), 0o755)?;
//! copy_path(Path::new("staging/app"), Path::new("output/bin/app"))?;
//! # Ok(())
//! # }
//! ```

pub mod fs;
pub mod progress;

pub use fs::{ExtractionDirectory, copy_path, ensure_dir, is_readable, is_writable, remove_path};
pub use progress::{StepProgress, terminal_progress};
