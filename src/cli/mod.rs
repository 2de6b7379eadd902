//! Command-line interface of the helper binary.
//!
//! The caller never talks to the helper other than through this argument vector,
//! built by [`crate::launcher::build_args`]. Every flag is optional except
//! `--source` and `--target`; unknown flags and positional arguments are rejected.
//!
//! # Usage
//!
//! ```bash
//! update-helper-cli [-k|--kill <pid>] [-w|--wait <ms>] [-r|--rename] \
//!     -s|--source <file|dir> -t|--target <file|dir> \
//!     [-c|--cleanup <file|dir>]... [-e|--execute <command> | -o|--open <path>]
//! ```
//!
//! # Example
//!
//! ```bash
//! # Replace the running app (pid 4242), then start it again
//! update-helper-cli --kill 4242 --wait 1000 --rename \
//!     --source /tmp/app.new --target /opt/app/bin/app \
//!     --cleanup /tmp/app.new --execute "/opt/app/bin/app --updated"
//! ```

use crate::config::HelperConfig;
use crate::core::UpdateError;
use crate::engine::{PostAction, ReplacementEngine, ReplacementPlan, RunReport};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Application update process helper.
///
/// Terminates the old program, replaces its files and optionally restarts it.
/// Normally started by an application's updater rather than by hand.
#[derive(Parser, Debug)]
#[command(
    name = "update-helper-cli",
    version,
    about = "Application update process helper",
    long_about = None
)]
pub struct HelperCli {
    /// Process id to kill before replacing files
    #[arg(short = 'k', long = "kill", value_name = "PID", default_value_t = 0)]
    pub kill: u32,

    /// Milliseconds to wait after the kill and before copying source to target
    #[arg(short = 'w', long = "wait", value_name = "MS", default_value_t = 0)]
    pub wait: u64,

    /// Rename the target before overwriting it
    #[arg(short = 'r', long = "rename")]
    pub rename: bool,

    /// Source file or directory
    #[arg(short = 's', long = "source", value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// Target file or directory
    #[arg(short = 't', long = "target", value_name = "PATH")]
    pub target: Option<PathBuf>,

    /// File or directory to remove after the update (repeatable)
    #[arg(short = 'c', long = "cleanup", value_name = "PATH")]
    pub cleanup: Vec<PathBuf>,

    /// Command to execute after the update
    #[arg(short = 'e', long = "execute", value_name = "COMMAND", conflicts_with = "open")]
    pub execute: Option<String>,

    /// File or URL to open after the update
    #[arg(short = 'o', long = "open", value_name = "PATH")]
    pub open: Option<String>,

    /// Log every step
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log nothing
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl HelperCli {
    /// Default log filter for the chosen verbosity.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "off"
        } else {
            "info"
        }
    }

    /// Run the replacement described by the flags.
    ///
    /// # Errors
    ///
    /// Any configuration, permission or replacement failure; see [`ReplacementEngine::run`].
    pub async fn execute(self, config: &HelperConfig) -> Result<RunReport> {
        let plan = self.into_plan()?;
        ReplacementEngine::new(plan, config.post_action_grace()).run().await
    }

    /// Turn the parsed flags into a [`ReplacementPlan`].
    ///
    /// # Errors
    ///
    /// [`UpdateError::Configuration`] when `--source` or `--target` is missing or empty.
    pub fn into_plan(self) -> std::result::Result<ReplacementPlan, UpdateError> {
        let source = self
            .source
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| UpdateError::configuration("mandatory source file or directory missing"))?;
        let target = self
            .target
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| UpdateError::configuration("mandatory target file or directory missing"))?;

        let post_action = self
            .execute
            .filter(|c| !c.is_empty())
            .map(PostAction::Execute)
            .or_else(|| self.open.filter(|o| !o.is_empty()).map(PostAction::Open));

        Ok(ReplacementPlan {
            kill_pid: self.kill,
            wait: Duration::from_millis(self.wait),
            rename: self.rename,
            source,
            target,
            cleanup: self.cleanup,
            post_action,
        })
    }
}
