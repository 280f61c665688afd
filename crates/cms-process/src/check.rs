//! Liveness probes for a single PID.

use cms_common::{ProcessError, ProcessResult};

/// Whether `pid` names a process in the OS process table.
///
/// Sends nothing to the process. A process owned by another user still
/// exists. A zombie (exited, not yet reaped) also exists here; use
/// [`process_alive`] when the caller needs to know the process has exited.
///
/// ```rust,no_run
/// use cms_process::process_exists;
///
/// if process_exists(1234).unwrap() {
///     println!("1234 is in the process table");
/// }
/// ```
pub fn process_exists(pid: u32) -> ProcessResult<bool> {
    probe(pid).map_err(|reason| {
        ProcessError::stop_failed(pid.to_string(), format!("Failed to probe process: {}", reason))
    })
}

/// Like [`process_exists`], but a zombie counts as gone.
pub fn process_alive(pid: u32) -> ProcessResult<bool> {
    Ok(process_exists(pid)? && !crate::discovery::is_zombie(pid))
}

#[cfg(unix)]
fn probe(pid: u32) -> Result<bool, String> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| format!("PID {} out of range", pid))?;
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(windows)]
fn probe(pid: u32) -> Result<bool, String> {
    use windows::Win32::Foundation::{CloseHandle, E_ACCESSDENIED, E_INVALIDARG, STILL_ACTIVE};
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    // A handle can outlive the process, so an open handle alone is not proof
    // of life: the exit code must still read STILL_ACTIVE.
    unsafe {
        let handle = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(handle) => handle,
            Err(e) if e.code() == E_INVALIDARG => return Ok(false),
            Err(e) if e.code() == E_ACCESSDENIED => return Ok(true),
            Err(e) => return Err(e.to_string()),
        };

        let mut code = 0u32;
        let result = GetExitCodeProcess(handle, &mut code);
        let _ = CloseHandle(handle);
        result.map_err(|e| e.to_string())?;
        Ok(code == STILL_ACTIVE.0 as u32)
    }
}
