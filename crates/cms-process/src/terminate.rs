//! Process termination primitives.
//!
//! This module provides cross-platform termination of single processes and
//! whole process trees. A process that is already gone counts as terminated.

use crate::discovery::{descendants, snapshot_processes};
use cms_common::{ProcessError, ProcessResult};
use tracing::{debug, warn};

/// How hard to ask a process to go away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationMode {
    /// SIGTERM on Unix. Windows has no equivalent for console-less servers,
    /// so this falls through to `TerminateProcess`.
    Graceful,
    /// SIGKILL on Unix, `TerminateProcess` on Windows.
    Forced,
}

/// Terminate a process gracefully (SIGTERM on Unix).
pub fn terminate_gracefully(pid: u32) -> ProcessResult<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(ProcessError::stop_failed(pid.to_string(), e.to_string())),
        }
    }

    #[cfg(windows)]
    {
        force_kill(pid)
    }
}

/// Force kill a process (SIGKILL on Unix, TerminateProcess on Windows).
pub fn force_kill(pid: u32) -> ProcessResult<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(ProcessError::stop_failed(pid.to_string(), e.to_string())),
        }
    }

    #[cfg(windows)]
    {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

        unsafe {
            let handle = match OpenProcess(PROCESS_TERMINATE, false, pid) {
                Ok(h) if !h.is_invalid() => h,
                _ => {
                    // Already gone, or never existed
                    if !crate::check::process_exists(pid)? {
                        return Ok(());
                    }
                    return Err(ProcessError::stop_failed(
                        pid.to_string(),
                        "Failed to open process for termination".to_string(),
                    ));
                }
            };

            let result = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);

            match result {
                Ok(()) => Ok(()),
                Err(_) if !crate::check::process_exists(pid)? => Ok(()),
                Err(e) => Err(ProcessError::stop_failed(
                    pid.to_string(),
                    format!("TerminateProcess failed: {}", e),
                )),
            }
        }
    }
}

/// Signal `root` and every descendant, leaves first.
///
/// Returns the PIDs that were signalled, root last. Failure to signal a
/// descendant is logged and skipped; failure to signal the root is returned.
pub fn terminate_tree(root: u32, mode: TerminationMode) -> ProcessResult<Vec<u32>> {
    let snapshot = snapshot_processes()?;
    let mut targets = descendants(&snapshot, root);
    targets.push(root);

    for &pid in &targets {
        let result = match mode {
            TerminationMode::Graceful => terminate_gracefully(pid),
            TerminationMode::Forced => force_kill(pid),
        };

        match result {
            Ok(()) => debug!(pid, root, ?mode, "Sent termination to process"),
            Err(e) if pid == root => return Err(e),
            Err(e) => warn!(pid, root, error = %e, "Failed to terminate descendant"),
        }
    }

    Ok(targets)
}
