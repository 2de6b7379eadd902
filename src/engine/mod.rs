//! The replacement state machine run by the helper process.
//!
//! A [`ReplacementEngine`] consumes one [`ReplacementPlan`] and walks the steps in
//! a fixed order, each finishing before the next begins:
//!
//! 1. **validate** - `source` readable, `target` (or its parent) writable
//! 2. **kill** - send a termination request to `kill_pid`
//! 3. **wait** - sleep so the killed process can release its files
//! 4. **stage** - move an existing `target` to `<target>.old`
//! 5. **replace** - copy `source` over `target`
//! 6. **unstage** - remove `<target>.old`
//! 7. **cleanup** - remove every cleanup resource, in order
//! 8. **post-action** - launch a command or open a path, then settle
//!
//! A failed validation is an [`UpdateError::PermissionDenied`] and leaves every
//! file alone. Any later failure is an [`UpdateError::Replacement`] naming the step;
//! nothing is rolled back.
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_helper::engine::{ReplacementEngine, ReplacementPlan};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let plan = ReplacementPlan {
//!     rename: true,
//!     ..ReplacementPlan::new("app.new", "app")
//! };
//! let report = ReplacementEngine::new(plan, Duration::from_secs(1)).run().await?;
//! assert!(report.staged);
//! # Ok(())
//! # }
//! ```

pub mod process;

use crate::constants::STAGING_SUFFIX;
use crate::core::UpdateError;
use crate::models::UpdateRequest;
use crate::utils::fs::{copy_path, is_readable, is_writable, remove_path};
use anyhow::Result;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The steps of a replacement run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Access checks on source and target
    Validate,
    /// Termination request to the old process
    Kill,
    /// Grace period after the kill
    Wait,
    /// Move the old target aside
    Stage,
    /// Copy source over target
    Replace,
    /// Remove the staged target
    Unstage,
    /// Remove cleanup resources
    Cleanup,
    /// Execute or open after the update
    PostAction,
}

impl Step {
    /// Lowercase name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Kill => "kill",
            Self::Wait => "wait",
            Self::Stage => "stage",
            Self::Replace => "replace",
            Self::Unstage => "unstage",
            Self::Cleanup => "cleanup",
            Self::PostAction => "post-action",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do once the files are in place. At most one per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    /// Run a command line through the shell, detached
    Execute(String),
    /// Open a path or URL with the platform's default handler
    Open(String),
}

/// The helper's view of an [`UpdateRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementPlan {
    /// Process to terminate (`0` = none)
    pub kill_pid: u32,
    /// Grace period after the kill
    pub wait: Duration,
    /// Stage the old target before copying
    pub rename: bool,
    /// New content
    pub source: PathBuf,
    /// Location being replaced
    pub target: PathBuf,
    /// Removed after the replacement, in order
    pub cleanup: Vec<PathBuf>,
    /// Optional post-update action
    pub post_action: Option<PostAction>,
}

impl ReplacementPlan {
    /// Plan that only copies `source` over `target`.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            kill_pid: 0,
            wait: Duration::ZERO,
            rename: false,
            source: source.into(),
            target: target.into(),
            cleanup: Vec::new(),
            post_action: None,
        }
    }

    /// Sibling path the target is staged at.
    #[must_use]
    pub fn staging_path(&self) -> PathBuf {
        let mut staged: OsString = self.target.clone().into_os_string();
        staged.push(STAGING_SUFFIX);
        PathBuf::from(staged)
    }
}

impl From<&UpdateRequest> for ReplacementPlan {
    fn from(request: &UpdateRequest) -> Self {
        let post_action = request
            .execute_command
            .clone()
            .map(PostAction::Execute)
            .or_else(|| request.open_target.clone().map(PostAction::Open));

        Self {
            kill_pid: request.kill_pid,
            wait: Duration::from_millis(request.wait_millis),
            rename: request.rename_before_overwrite,
            source: request.source.clone(),
            target: request.target.clone(),
            cleanup: request.cleanup_resources.clone(),
            post_action,
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Whether a kill request was delivered to a live process
    pub killed: bool,
    /// Whether the old target was staged (and later removed)
    pub staged: bool,
    /// Number of cleanup resources removed
    pub cleaned: usize,
    /// Process id of the post-action, if one was launched
    pub post_action_pid: Option<u32>,
}

/// Runs one [`ReplacementPlan`] to completion.
#[derive(Debug)]
pub struct ReplacementEngine {
    plan: ReplacementPlan,
    grace: Duration,
}

impl ReplacementEngine {
    /// Create an engine; `grace` is the settle delay after a post-action.
    #[must_use]
    pub const fn new(plan: ReplacementPlan, grace: Duration) -> Self {
        Self {
            plan,
            grace,
        }
    }

    /// Run every step in order.
    ///
    /// # Errors
    ///
    /// [`UpdateError::PermissionDenied`] from validation, otherwise
    /// [`UpdateError::Replacement`] naming the failed step.
    pub async fn run(self) -> Result<RunReport> {
        let mut report = RunReport::default();

        self.validate()?;
        report.killed = self.kill()?;
        self.wait().await;
        report.staged = self.stage()?;
        self.replace()?;
        if report.staged {
            self.unstage()?;
        }
        report.cleaned = self.cleanup()?;
        report.post_action_pid = self.post_action().await?;

        info!("Update of {} complete", self.plan.target.display());
        Ok(report)
    }

    fn validate(&self) -> Result<()> {
        debug!("Step {}", Step::Validate);
        let plan = &self.plan;

        if !is_readable(&plan.source) {
            return Err(UpdateError::PermissionDenied {
                operation: "read source".to_string(),
                path: plan.source.display().to_string(),
            }
            .into());
        }

        let writable = if std::fs::symlink_metadata(&plan.target).is_ok() {
            is_writable(&plan.target)
        } else {
            let parent = match plan.target.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            is_writable(parent)
        };
        if !writable {
            return Err(UpdateError::PermissionDenied {
                operation: "write target".to_string(),
                path: plan.target.display().to_string(),
            }
            .into());
        }

        Ok(())
    }

    fn kill(&self) -> Result<bool> {
        let pid = self.plan.kill_pid;
        if pid == 0 {
            return Ok(false);
        }

        info!("Step {}: terminating process {}", Step::Kill, pid);
        match process::terminate(pid) {
            Ok(process::Termination::Signalled) => Ok(true),
            Ok(process::Termination::AlreadyGone) => {
                warn!("Process {} already exited", pid);
                Ok(false)
            }
            Err(e) => Err(UpdateError::replacement(Step::Kill, format!("{e:#}")).into()),
        }
    }

    async fn wait(&self) {
        if !self.plan.wait.is_zero() {
            debug!("Step {}: {} ms", Step::Wait, self.plan.wait.as_millis());
            tokio::time::sleep(self.plan.wait).await;
        }
    }

    fn stage(&self) -> Result<bool> {
        let target = &self.plan.target;
        if !self.plan.rename || std::fs::symlink_metadata(target).is_err() {
            return Ok(false);
        }

        let staged = self.plan.staging_path();
        info!("Step {}: {} -> {}", Step::Stage, target.display(), staged.display());
        // Windows refuses to rename onto an existing path
        remove_path(&staged).map_err(|e| UpdateError::replacement(Step::Stage, format!("{e:#}")))?;
        std::fs::rename(target, &staged).map_err(|e| {
            UpdateError::replacement(
                Step::Stage,
                format!("cannot rename {} to {}: {e}", target.display(), staged.display()),
            )
        })?;
        Ok(true)
    }

    fn replace(&self) -> Result<()> {
        info!(
            "Step {}: {} -> {}",
            Step::Replace,
            self.plan.source.display(),
            self.plan.target.display()
        );
        copy_path(&self.plan.source, &self.plan.target)
            .map_err(|e| UpdateError::replacement(Step::Replace, format!("{e:#}")).into())
    }

    fn unstage(&self) -> Result<()> {
        let staged = self.plan.staging_path();
        debug!("Step {}: removing {}", Step::Unstage, staged.display());
        remove_path(&staged)
            .map_err(|e| UpdateError::replacement(Step::Unstage, format!("{e:#}")).into())
    }

    fn cleanup(&self) -> Result<usize> {
        for resource in &self.plan.cleanup {
            debug!("Step {}: removing {}", Step::Cleanup, resource.display());
            remove_path(resource)
                .map_err(|e| UpdateError::replacement(Step::Cleanup, format!("{e:#}")))?;
        }
        Ok(self.plan.cleanup.len())
    }

    async fn post_action(&self) -> Result<Option<u32>> {
        let Some(action) = &self.plan.post_action else {
            return Ok(None);
        };

        let mut command = match action {
            PostAction::Execute(line) => {
                info!("Step {}: executing '{}'", Step::PostAction, line);
                process::shell_command(line)
            }
            PostAction::Open(target) => {
                info!("Step {}: opening '{}'", Step::PostAction, target);
                process::open_command(target)
                    .map_err(|e| UpdateError::replacement(Step::PostAction, format!("{e:#}")))?
            }
        };
        let pid = process::spawn_detached(&mut command)
            .map_err(|e| UpdateError::replacement(Step::PostAction, format!("{e:#}")))?;

        tokio::time::sleep(self.grace).await;
        Ok(Some(pid))
    }
}
