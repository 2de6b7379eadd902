//! Global constants used throughout the update-helper codebase.
//!
//! Well-known names shared by the caller and the helper process, and the
//! fixed delays of the replacement protocol.

/// Environment variable carrying the extraction directory from `update()` to the
/// next `cleanup()` call in a restarted caller.
pub const CLEANUP_DIR_ENV: &str = "UPDATE_HELPER_CLEANUP_DIR";

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "UPDATE_HELPER_CONFIG";

/// Environment variable that hides progress bars when set.
pub const NO_PROGRESS_ENV: &str = "UPDATE_HELPER_NO_PROGRESS";

/// Base name of the packaged helper binary, completed with the platform tag.
pub const HELPER_BASENAME: &str = "update-helper-cli";

/// Default download location of the helper archive.
///
/// `{version}` and `{platform}` are substituted at download time.
pub const DEFAULT_RELEASE_URL: &str =
    "https://github.com/rse/update-helper/releases/download/{version}/update-helper-cli-{platform}-x64.zip";

/// Delay after launching a post-update command or opener (1 second).
///
/// Keeps the helper alive long enough for the launched program to start.
pub const POST_ACTION_GRACE_MS: u64 = 1000;

/// Sleep granularity of the self-kill barrier (60 seconds).
pub const PARK_INTERVAL_SECS: u64 = 60;

/// Suffix appended to the target while it is staged out of the way.
pub const STAGING_SUFFIX: &str = ".old";

/// Progress step names reported to the caller's callback.
pub mod steps {
    /// Archive transfer.
    pub const DOWNLOAD: &str = "downloading update helper";
    /// Archive extraction.
    pub const EXTRACT: &str = "extracting update helper";
    /// Helper spawn.
    pub const EXECUTE: &str = "executing update helper";
}

