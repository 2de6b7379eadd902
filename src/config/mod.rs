//! Configuration for the update protocol.
//!
//! Both processes of the protocol read the same optional TOML file: the caller uses
//! it to locate the helper archive, the helper uses it for its post-action delay.
//! The file is named by the `UPDATE_HELPER_CONFIG` environment variable, which the
//! helper inherits from the caller. Every key is optional.
//!
//! # File Format
//!
//! ```toml
//! release_url = "https://mirror.example.com/update-helper/{version}/update-helper-cli-{platform}-x64.zip"
//! version = "1.4.0"
//! user_agent = "my-app-updater/2.0"
//! post_action_grace_ms = 1000
//! park_interval_secs = 60
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_helper::config::HelperConfig;
//! use update_helper::models::PlatformTag;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = HelperConfig::load().await?;
//! println!("{}", config.download_url(PlatformTag::Linux));
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_RELEASE_URL, PARK_INTERVAL_SECS, POST_ACTION_GRACE_MS,
};
use crate::models::PlatformTag;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

fn default_release_url() -> String {
    DEFAULT_RELEASE_URL.to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

const fn default_post_action_grace_ms() -> u64 {
    POST_ACTION_GRACE_MS
}

const fn default_park_interval_secs() -> u64 {
    PARK_INTERVAL_SECS
}

/// Settings shared by the caller and the helper process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperConfig {
    /// Download URL template; `{version}` and `{platform}` are substituted.
    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// Release version of the helper archive to fetch.
    #[serde(default = "default_version")]
    pub version: String,

    /// Value of the `User-Agent` header sent with the download.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Delay after launching a post-update command or opener, in milliseconds.
    #[serde(default = "default_post_action_grace_ms")]
    pub post_action_grace_ms: u64,

    /// Sleep granularity of the self-kill barrier, in seconds.
    #[serde(default = "default_park_interval_secs")]
    pub park_interval_secs: u64,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            release_url: default_release_url(),
            version: default_version(),
            user_agent: default_user_agent(),
            post_action_grace_ms: default_post_action_grace_ms(),
            park_interval_secs: default_park_interval_secs(),
        }
    }
}

impl HelperConfig {
    /// Load the configuration named by `UPDATE_HELPER_CONFIG`.
    ///
    /// Returns the defaults when the variable is unset or empty, or when the file it
    /// names does not exist.
    pub async fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).await,
            Some(path) => {
                debug!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Load the configuration from a specific TOML file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    fn config_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()).map(PathBuf::from)
    }

    /// Resolve the archive download URL for a platform.
    #[must_use]
    pub fn download_url(&self, platform: PlatformTag) -> String {
        self.release_url.replace("{version}", &self.version).replace("{platform}", platform.as_str())
    }

    /// Post-action grace delay as a [`Duration`].
    #[must_use]
    pub const fn post_action_grace(&self) -> Duration {
        Duration::from_millis(self.post_action_grace_ms)
    }

    /// Self-kill barrier sleep granularity as a [`Duration`].
    #[must_use]
    pub const fn park_interval(&self) -> Duration {
        Duration::from_secs(self.park_interval_secs)
    }
}
