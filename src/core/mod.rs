//! Core types and error handling for update-helper.
//!
//! The rest of the crate reports failures through [`UpdateError`] wrapped in
//! `anyhow::Error`, and the helper binary turns them into an [`ErrorContext`] for display.
//! Operations that are allowed to fail silently return [`BestEffort`].
//!
//! # Examples
//!
//! ```rust
//! use update_helper::core::{UpdateError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<()> {
//!     Err(UpdateError::configuration("mandatory option 'target' missing").into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{BestEffort, ErrorContext, UpdateError, user_friendly_error};
