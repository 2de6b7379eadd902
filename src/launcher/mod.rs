//! Starting the helper process.
//!
//! The helper is spawned detached so that it survives the caller: no standard I/O,
//! its own session, never waited on. The extraction directory travels along in the
//! [`HandoffSlot`]'s environment variable (`UPDATE_HELPER_CLEANUP_DIR` by default).
//!
//! When the caller asked the helper to kill the caller itself, [`HelperLauncher::park`]
//! does not return: it waits until the helper's termination request arrives.

use crate::constants::steps;
use crate::engine::process;
use crate::models::UpdateRequest;
use crate::session::HandoffSlot;
use crate::utils::progress::StepProgress;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tracing::info;

/// Serialize `request` into the helper's argument vector.
///
/// Flags appear only when they differ from the helper's defaults; `--source` and
/// `--target` are always present and one `--cleanup` is emitted per resource.
#[must_use]
pub fn build_args(request: &UpdateRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    if request.kill_pid > 0 {
        args.push("--kill".into());
        args.push(request.kill_pid.to_string().into());
    }
    if request.wait_millis > 0 {
        args.push("--wait".into());
        args.push(request.wait_millis.to_string().into());
    }
    if request.rename_before_overwrite {
        args.push("--rename".into());
    }
    args.push("--source".into());
    args.push(request.source.clone().into_os_string());
    args.push("--target".into());
    args.push(request.target.clone().into_os_string());
    for resource in &request.cleanup_resources {
        args.push("--cleanup".into());
        args.push(resource.clone().into_os_string());
    }
    if let Some(command) = &request.execute_command {
        args.push("--execute".into());
        args.push(command.into());
    }
    if let Some(target) = &request.open_target {
        args.push("--open".into());
        args.push(target.into());
    }

    args
}

/// Spawns the helper and, if needed, holds the caller until it is killed.
#[derive(Debug, Clone)]
pub struct HelperLauncher {
    park_interval: Duration,
    slot: HandoffSlot,
}

impl HelperLauncher {
    /// Create a launcher; `park_interval` is the sleep granularity of the self-kill
    /// barrier and `slot` carries the extraction directory to the helper.
    #[must_use]
    pub const fn new(park_interval: Duration, slot: HandoffSlot) -> Self {
        Self {
            park_interval,
            slot,
        }
    }

    /// Start `helper` for `request` and return its process id.
    ///
    /// Returns as soon as the helper runs; call [`HelperLauncher::park`] afterwards
    /// to honor the self-kill barrier.
    ///
    /// # Errors
    ///
    /// Fails if the helper process cannot be started.
    pub fn spawn(
        &self,
        helper: &Path,
        request: &UpdateRequest,
        extraction_dir: &Path,
    ) -> Result<u32> {
        let mut progress = StepProgress::new(steps::EXECUTE, request.progress.clone());
        progress.start();

        let mut command = Command::new(helper);
        command.args(build_args(request));
        self.slot.apply(&mut command, extraction_dir);
        let pid = process::spawn_detached(&mut command)
            .with_context(|| format!("Failed to launch update helper {}", helper.display()))?;

        info!("Update helper running as process {}", pid);
        progress.report(0.5);
        Ok(pid)
    }

    /// Wait to be terminated if `request` kills this process; otherwise return at once.
    pub async fn park(&self, request: &UpdateRequest) {
        if !is_self_kill(request) {
            return;
        }

        info!("Waiting to be terminated by the update helper");
        loop {
            tokio::time::sleep(self.park_interval).await;
        }
    }
}

fn is_self_kill(request: &UpdateRequest) -> bool {
    request.kill_pid > 0 && request.kill_pid == std::process::id()
}
