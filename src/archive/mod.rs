//! Delivery of the helper binary.
//!
//! [`ArchiveInstaller`] downloads the platform's helper archive, extracts it into a
//! fresh [`ExtractionDirectory`], and checks that the helper binary is there. The
//! archive file is deleted once extracted; the directory is handed back to the
//! caller, who either lets it drop (on failure) or keeps it for the restarted
//! process to clean up.
//!
//! # Modules
//!
//! - [`attributes`] - Decoding of the Unix type/permission bits in entry attributes
//! - [`download`] - Streaming HTTP download with progress
//! - [`extract`] - Entry materialization with lazy directory creation
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_helper::archive::ArchiveInstaller;
//! use update_helper::config::HelperConfig;
//! use update_helper::models::PlatformTag;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let installer = ArchiveInstaller::new(PlatformTag::detect()?, HelperConfig::default());
//! let helper = installer.install(Arc::new(|step, f| println!("{step}: {f:.2}"))).await?;
//! println!("helper ready at {}", helper.binary.display());
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod download;
pub mod extract;

use crate::config::HelperConfig;
use crate::constants::steps;
use crate::core::UpdateError;
use crate::models::{PlatformTag, ProgressFn};
use crate::utils::fs::{ExtractionDirectory, is_readable};
use crate::utils::progress::StepProgress;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use extract::{ArchiveEntry, ExtractionReport, Extractor};

/// A helper binary ready to be launched.
#[derive(Debug)]
pub struct InstalledHelper {
    /// Path of the executable inside [`InstalledHelper::directory`]
    pub binary: PathBuf,
    /// Directory the archive was extracted into
    pub directory: ExtractionDirectory,
}

/// Fetches and unpacks the helper archive for one platform.
#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    platform: PlatformTag,
    config: HelperConfig,
}

impl ArchiveInstaller {
    /// Create an installer for `platform` using the URL template and version in `config`.
    #[must_use]
    pub const fn new(platform: PlatformTag, config: HelperConfig) -> Self {
        Self {
            platform,
            config,
        }
    }

    /// Platform whose helper this installer fetches.
    #[must_use]
    pub const fn platform(&self) -> PlatformTag {
        self.platform
    }

    /// Download, extract and verify the helper.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::Transport`] if the download fails
    /// - [`UpdateError::Payload`] if the archive has no readable helper binary
    /// - any I/O error while writing the extraction directory
    pub async fn install(&self, progress: ProgressFn) -> Result<InstalledHelper> {
        let url = self.config.download_url(self.platform);
        let mut download = StepProgress::new(steps::DOWNLOAD, progress.clone());
        let archive =
            download::download_archive(&url, &self.config.user_agent, &mut download).await?;

        let helper = self.install_from_file(archive.path(), progress).await?;

        archive.close().context("Failed to remove downloaded archive")?;
        Ok(helper)
    }

    /// Extract and verify an archive that is already on disk.
    pub async fn install_from_file(
        &self,
        archive: &Path,
        progress: ProgressFn,
    ) -> Result<InstalledHelper> {
        let directory = ExtractionDirectory::new("extract")?;
        debug!("Extracting {} into {}", archive.display(), directory.path().display());

        let archive = archive.to_path_buf();
        let root = directory.path().to_path_buf();
        let report = tokio::task::spawn_blocking(move || {
            let mut extract = StepProgress::new(steps::EXTRACT, progress);
            extract::extract_archive(&archive, &root, &mut extract)
        })
        .await
        .context("Extraction task panicked")??;

        let binary = self.platform.helper_path(directory.path());
        if !is_readable(&binary) {
            return Err(UpdateError::Payload {
                reason: format!(
                    "cannot find {} in downloaded content",
                    self.platform.helper_file_name()
                ),
            }
            .into());
        }

        info!("Extracted {} entries, helper at {}", report.entries, binary.display());
        Ok(InstalledHelper {
            binary,
            directory,
        })
    }
}
