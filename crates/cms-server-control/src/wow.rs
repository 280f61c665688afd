//! Game client launcher.

use crate::resolver::exe_file_name;
use cms_common::{ProcessError, ProcessResult, WowLaunchResponse};
use cms_process::launch_detached;
use std::path::{Path, PathBuf};
use tracing::info;

/// Client executable spellings, in lookup order.
const CLIENT_STEMS: [&str; 2] = ["Wow", "WoW"];

fn client_error(reason: &str) -> ProcessError {
    ProcessError::PathResolution {
        exe_name: exe_file_name(CLIENT_STEMS[0]),
        reason: reason.to_string(),
    }
}

/// Find the client executable for a folder or executable path.
pub fn resolve_client(wow_path: &str) -> ProcessResult<PathBuf> {
    let trimmed = wow_path.trim();
    if trimmed.is_empty() {
        return Err(client_error("WoW path is required."));
    }

    let path = Path::new(trimmed);
    let client_name = exe_file_name(CLIENT_STEMS[0]);
    let names_client = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.eq_ignore_ascii_case(&client_name))
        .unwrap_or(false);
    if names_client && path.is_file() {
        return Ok(path.to_path_buf());
    }

    CLIENT_STEMS
        .iter()
        .map(|stem| path.join(exe_file_name(stem)))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| client_error("Could not find Wow executable in the specified folder."))
}

/// Launch the client detached from the manager. It is not tracked.
pub fn launch_wow(wow_path: &str) -> ProcessResult<WowLaunchResponse> {
    let executable = resolve_client(wow_path)?;
    let working_dir = executable
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let pid = launch_detached(&executable, &working_dir)?;
    info!("Game client launched: {} (PID: {:?})", executable.display(), pid);

    Ok(WowLaunchResponse {
        executable_path: executable.display().to_string(),
    })
}
