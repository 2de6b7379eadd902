//! Shared data models for update operations
//!
//! [`UpdateRequest`] is the caller's description of one update; [`PlatformTag`]
//! selects which packaged helper binary and archive are used on this host.

use crate::constants::HELPER_BASENAME;
use crate::core::UpdateError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Progress callback: step name and completion fraction in `[0, 1]`.
pub type ProgressFn = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// Host platform, as far as the packaged helper binaries are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformTag {
    /// Windows (`win`)
    Windows,
    /// macOS (`mac`)
    Mac,
    /// Linux (`lnx`)
    Linux,
}

impl PlatformTag {
    /// Detect the platform of the running host.
    pub fn detect() -> Result<Self, UpdateError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a tag.
    pub fn from_os(os: &str) -> Result<Self, UpdateError> {
        match os {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::Mac),
            "linux" => Ok(Self::Linux),
            other => Err(UpdateError::PlatformNotSupported {
                platform: other.to_string(),
            }),
        }
    }

    /// Short tag used in asset names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "win",
            Self::Mac => "mac",
            Self::Linux => "lnx",
        }
    }

    /// File name of the helper binary inside the extracted archive.
    #[must_use]
    pub fn helper_file_name(self) -> String {
        let extension = if self == Self::Windows {
            ".exe"
        } else {
            ""
        };
        format!("{HELPER_BASENAME}-{}-x64{extension}", self.as_str())
    }

    /// Path of the helper binary inside an extraction directory.
    #[must_use]
    pub fn helper_path(self, dir: &Path) -> PathBuf {
        dir.join(self.helper_file_name())
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of a single update.
///
/// Built with [`UpdateRequest::new`] and the chained setters; every field but
/// `source` and `target` has a neutral default (no kill, no wait, no rename, no
/// cleanup, no post-action, silent progress).
///
/// # Examples
///
/// ```rust
/// use update_helper::models::UpdateRequest;
///
/// let request = UpdateRequest::new("app.new", "app")
///     .kill(std::process::id())
///     .wait(1000)
///     .rename(true)
///     .cleanup("app.new")
///     .execute("app --updated");
/// assert!(request.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct UpdateRequest {
    /// Process to terminate before replacing files (`0` = none).
    pub kill_pid: u32,
    /// Grace period after the kill, in milliseconds.
    pub wait_millis: u64,
    /// Move the existing target aside before copying over it.
    pub rename_before_overwrite: bool,
    /// New content (file or directory).
    pub source: PathBuf,
    /// Location to replace.
    pub target: PathBuf,
    /// Paths removed after a successful replacement, in order.
    pub cleanup_resources: Vec<PathBuf>,
    /// Shell command launched after the update.
    pub execute_command: Option<String>,
    /// Path or URL opened with the platform handler after the update.
    pub open_target: Option<String>,
    /// Progress callback.
    pub progress: ProgressFn,
}

impl UpdateRequest {
    /// Create a request replacing `target` with `source`.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            kill_pid: 0,
            wait_millis: 0,
            rename_before_overwrite: false,
            source: source.into(),
            target: target.into(),
            cleanup_resources: Vec::new(),
            execute_command: None,
            open_target: None,
            progress: Arc::new(|_, _| {}),
        }
    }

    /// Terminate `pid` before replacing files.
    #[must_use]
    pub fn kill(mut self, pid: u32) -> Self {
        self.kill_pid = pid;
        self
    }

    /// Wait `millis` after the kill before touching the target.
    #[must_use]
    pub fn wait(mut self, millis: u64) -> Self {
        self.wait_millis = millis;
        self
    }

    /// Move the existing target to `<target>.old` before overwriting it.
    #[must_use]
    pub fn rename(mut self, rename: bool) -> Self {
        self.rename_before_overwrite = rename;
        self
    }

    /// Remove `path` after a successful replacement. Repeatable.
    #[must_use]
    pub fn cleanup(mut self, path: impl Into<PathBuf>) -> Self {
        self.cleanup_resources.push(path.into());
        self
    }

    /// Launch `command` through the shell once the update is done.
    #[must_use]
    pub fn execute(mut self, command: impl Into<String>) -> Self {
        self.execute_command = Some(command.into()).filter(|c| !c.is_empty());
        self
    }

    /// Open `target` with the platform's default handler once the update is done.
    #[must_use]
    pub fn open(mut self, target: impl Into<String>) -> Self {
        self.open_target = Some(target.into()).filter(|t| !t.is_empty());
        self
    }

    /// Report progress to `callback`.
    #[must_use]
    pub fn progress(mut self, callback: impl Fn(&str, f64) + Send + Sync + 'static) -> Self {
        self.progress = Arc::new(callback);
        self
    }

    /// Check the mandatory fields and that at most one post-action is set.
    pub fn validate(&self) -> Result<(), UpdateError> {
        if self.source.as_os_str().is_empty() {
            return Err(UpdateError::configuration("mandatory option 'source' missing"));
        }
        if self.target.as_os_str().is_empty() {
            return Err(UpdateError::configuration("mandatory option 'target' missing"));
        }
        if self.execute_command.is_some() && self.open_target.is_some() {
            return Err(UpdateError::configuration(
                "options 'execute' and 'open' are mutually exclusive",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateRequest")
            .field("kill_pid", &self.kill_pid)
            .field("wait_millis", &self.wait_millis)
            .field("rename_before_overwrite", &self.rename_before_overwrite)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("cleanup_resources", &self.cleanup_resources)
            .field("execute_command", &self.execute_command)
            .field("open_target", &self.open_target)
            .finish_non_exhaustive()
    }
}
