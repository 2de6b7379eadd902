//! Process control for both sides of the protocol.
//!
//! Sending the termination signal, spawning programs that must outlive the
//! process that started them, and finding the platform's default opener.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::process::{Command, Stdio};
use tracing::debug;

/// Result of asking a process to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The termination request was delivered.
    Signalled,
    /// No such process; it had already exited.
    AlreadyGone,
}

/// Ask process `pid` to terminate (`SIGTERM` on Unix, `TerminateProcess` on Windows).
///
/// Does not wait for the process to exit.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<Termination> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).with_context(|| format!("Invalid process id {pid}"))?;
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => Ok(Termination::Signalled),
        Err(Errno::ESRCH) => Ok(Termination::AlreadyGone),
        Err(e) => Err(e).with_context(|| format!("Failed to send SIGTERM to process {pid}")),
    }
}

/// Ask process `pid` to terminate (`SIGTERM` on Unix, `TerminateProcess` on Windows).
///
/// Does not wait for the process to exit.
#[cfg(windows)]
pub fn terminate(pid: u32) -> Result<Termination> {
    use winapi::um::errhandlingapi::GetLastError;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::{OpenProcess, TerminateProcess};
    use winapi::um::winnt::PROCESS_TERMINATE;

    // ERROR_INVALID_PARAMETER: no process with that id
    const ERROR_INVALID_PARAMETER: u32 = 87;

    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if handle.is_null() {
            let error = GetLastError();
            if error == ERROR_INVALID_PARAMETER {
                return Ok(Termination::AlreadyGone);
            }
            anyhow::bail!("Failed to open process {pid} (error {error})");
        }

        let result = TerminateProcess(handle, 1);
        CloseHandle(handle);

        if result == 0 {
            let error = GetLastError();
            anyhow::bail!("Failed to terminate process {pid} (error {error})");
        }
    }
    Ok(Termination::Signalled)
}

/// Prepare `command` to run detached: no standard I/O, and its own session
/// (Unix) or process group without a console (Windows).
pub fn detach(command: &mut Command) -> &mut Command {
    command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            command.pre_exec(|| {
                nix::unistd::setsid()?;
                Ok(())
            });
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    command
}

/// Spawn `command` detached and forget about it.
///
/// Returns the child's process id. The child is never waited on.
pub fn spawn_detached(command: &mut Command) -> Result<u32> {
    let program = command.get_program().to_string_lossy().into_owned();
    let child = detach(command).spawn().with_context(|| format!("Failed to start {program}"))?;
    let pid = child.id();
    debug!("Started detached process {} ({})", pid, program);
    drop(child);
    Ok(pid)
}

/// Command running `line` through the platform shell.
#[must_use]
pub fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(line);
        command
    } else {
        let mut command = Command::new("sh");
        command.arg("-c").arg(line);
        command
    }
}

/// Command opening `target` (a path or URL) with the platform's default handler.
pub fn open_command(target: impl AsRef<OsStr>) -> Result<Command> {
    let target = target.as_ref();
    let command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.arg("/C").arg("start").arg("").arg(target);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(target);
        command
    } else {
        let opener = which::which("xdg-open")
            .context("No default opener found: 'xdg-open' is not on PATH")?;
        let mut command = Command::new(opener);
        command.arg(target);
        command
    };
    Ok(command)
}
