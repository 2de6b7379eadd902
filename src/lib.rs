//! update-helper - application self-update process helper
//!
//! Lets a running application replace its own executable (or a directory of
//! installed files) and restart itself. A running program cannot safely
//! overwrite the files backing its own code, so the work is split across two
//! processes:
//!
//! - the **caller** (your application) downloads a small helper binary, starts it
//!   detached, and gets out of the way;
//! - the **helper** (`update-helper-cli`) kills the caller, waits, swaps the files,
//!   cleans up and optionally restarts the application.
//!
//! The two never talk to each other. The helper gets everything it needs from its
//! argument vector; the only state carried back to the restarted caller is the
//! helper's extraction directory, passed in the `UPDATE_HELPER_CLEANUP_DIR`
//! environment variable.
//!
//! # Core Modules
//!
//! ## Caller side
//! - [`session`] - `update()` and `cleanup()`, the entry points for applications
//! - [`archive`] - Download and extraction of the helper archive
//! - [`launcher`] - Detached helper spawn and the self-kill barrier
//!
//! ## Helper side
//! - [`engine`] - The kill/wait/stage/replace/cleanup state machine
//! - [`cli`] - Helper command-line flags
//!
//! ## Shared
//! - [`config`] - Optional TOML configuration
//! - [`core`] - Error taxonomy and user-facing error reporting
//! - [`models`] - `UpdateRequest` and `PlatformTag`
//! - [`utils`] - Filesystem primitives and progress reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use update_helper::models::UpdateRequest;
//! use update_helper::session::UpdateSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = UpdateSession::new().await?;
//!     // Remove the helper of a previous update, if we were restarted by one
//!     session.cleanup().await?;
//!
//!     let me = std::env::current_exe()?;
//!     let request = UpdateRequest::new("/tmp/app-2.0", &me)
//!         .kill(std::process::id())
//!         .wait(1000)
//!         .rename(true)
//!         .cleanup("/tmp/app-2.0")
//!         .execute(me.display().to_string());
//!     session.update(request).await?;
//!     Ok(())
//! }
//! ```

// Caller side
pub mod archive;
pub mod launcher;
pub mod session;

// Helper side
pub mod cli;
pub mod engine;

// Shared
pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
