//! Caller-side entry point of the update protocol.
//!
//! An [`UpdateSession`] offers the two operations an application needs:
//!
//! - [`UpdateSession::update`] fetches the helper, starts it detached with the
//!   request, and (when the request kills the caller) waits to be terminated.
//! - [`UpdateSession::cleanup`], called early on every start, removes the helper
//!   left behind by a previous update. It does nothing when the process was not
//!   started by a helper.
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_helper::models::UpdateRequest;
//! use update_helper::session::UpdateSession;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let session = UpdateSession::new().await?;
//! session.cleanup().await?;
//!
//! let me = std::env::current_exe()?;
//! let request = UpdateRequest::new("/tmp/app.new", &me)
//!     .kill(std::process::id())
//!     .wait(1000)
//!     .rename(true)
//!     .cleanup("/tmp/app.new")
//!     .execute(me.display().to_string());
//! session.update(request).await?; // does not return: the helper kills us
//! # Ok(())
//! # }
//! ```

pub mod handoff;

use crate::archive::ArchiveInstaller;
use crate::config::HelperConfig;
use crate::core::{BestEffort, UpdateError};
use crate::launcher::HelperLauncher;
use crate::models::{PlatformTag, UpdateRequest};
use crate::utils::fs::{ExtractionDirectory, is_readable, remove_path};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use handoff::HandoffSlot;

/// Result of [`UpdateSession::cleanup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// No update handed anything off to this process
    NotPending,
    /// Helper binary and extraction directory were removed
    Removed {
        /// The directory that was removed
        directory: PathBuf,
    },
    /// Removal failed and was ignored
    Ignored {
        /// The directory that was left behind
        directory: PathBuf,
        /// Why removal failed
        reason: String,
    },
}

/// A helper that has been started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedUpdate {
    /// Process id of the helper
    pub helper_pid: u32,
    /// Extraction directory handed to the helper's environment
    pub extraction_dir: PathBuf,
}

/// Facade over archive installation, helper launch and post-restart cleanup.
#[derive(Debug, Clone)]
pub struct UpdateSession {
    platform: PlatformTag,
    config: HelperConfig,
    slot: HandoffSlot,
}

impl UpdateSession {
    /// Session for the current host with configuration from `UPDATE_HELPER_CONFIG`.
    ///
    /// # Errors
    ///
    /// [`UpdateError::PlatformNotSupported`] on hosts without a packaged helper, or a
    /// configuration file that cannot be read.
    pub async fn new() -> Result<Self> {
        let platform = PlatformTag::detect()?;
        let config = HelperConfig::load().await?;
        Ok(Self::with_config(platform, config))
    }

    /// Session with an explicit platform and configuration.
    #[must_use]
    pub fn with_config(platform: PlatformTag, config: HelperConfig) -> Self {
        Self {
            platform,
            config,
            slot: HandoffSlot::default(),
        }
    }

    /// Use a different handoff slot.
    #[must_use]
    pub fn with_slot(mut self, slot: HandoffSlot) -> Self {
        self.slot = slot;
        self
    }

    /// Platform this session works for.
    #[must_use]
    pub const fn platform(&self) -> PlatformTag {
        self.platform
    }

    /// Fetch the helper and start it with `request`.
    ///
    /// If `request` kills this process, the returned future never completes.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Configuration`] (before any network or file access) when the
    /// request is incomplete; otherwise any download, extraction or spawn failure.
    pub async fn update(&self, request: UpdateRequest) -> Result<LaunchedUpdate> {
        request.validate()?;

        let installer = ArchiveInstaller::new(self.platform, self.config.clone());
        let helper = installer.install(request.progress.clone()).await?;
        self.launch(&helper.binary, helper.directory, &request).await
    }

    /// Start an already installed helper for `request`.
    ///
    /// The extraction directory is kept as soon as the helper runs and removed if
    /// it cannot be started. If `request` kills this process, the future never
    /// completes; the directory survives even if the future is dropped.
    pub async fn launch(
        &self,
        helper: &Path,
        directory: ExtractionDirectory,
        request: &UpdateRequest,
    ) -> Result<LaunchedUpdate> {
        request.validate()?;

        let launcher = HelperLauncher::new(self.config.park_interval(), self.slot);
        let helper_pid = launcher.spawn(helper, request, directory.path())?;
        // The helper owns the directory from here on
        let extraction_dir = directory.keep();

        launcher.park(request).await;
        Ok(LaunchedUpdate {
            helper_pid,
            extraction_dir,
        })
    }

    /// Remove the helper left behind by a previous update, if any.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Payload`] when the handed-off directory does not contain the
    /// helper binary. Failures while removing it are reported as
    /// [`CleanupOutcome::Ignored`] instead.
    pub async fn cleanup(&self) -> Result<CleanupOutcome> {
        let Some(directory) = self.slot.take() else {
            debug!("No pending update helper to clean up");
            return Ok(CleanupOutcome::NotPending);
        };

        let binary = self.platform.helper_path(&directory);
        if !is_readable(&binary) {
            return Err(UpdateError::Payload {
                reason: format!("cannot find update helper binary in {}", directory.display()),
            }
            .into());
        }

        let outcome = BestEffort::from_result(
            tokio::fs::remove_file(&binary)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|()| remove_path(&directory))
                .map_err(|e| format!("{e:#}")),
        );

        Ok(match outcome {
            BestEffort::Applied => {
                info!("Removed update helper directory {}", directory.display());
                CleanupOutcome::Removed {
                    directory,
                }
            }
            BestEffort::Ignored {
                reason,
            } => {
                warn!("Leaving update helper directory {}: {}", directory.display(), reason);
                CleanupOutcome::Ignored {
                    directory,
                    reason,
                }
            }
        })
    }
}
