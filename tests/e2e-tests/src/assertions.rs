//! Custom assertions for E2E tests

use crate::install::ServerInstall;
use crate::read_or_empty;
use cms_common::{RunState, ServerKind, ServerProcessStatus};

/// Assert that a status record reports a running server
pub fn assert_running(status: &ServerProcessStatus, started_by_app: bool) -> Result<(), String> {
    if status.status != RunState::Running {
        return Err(format!("Expected {} running, got {:?}", status.name, status));
    }
    if status.pid.is_none() {
        return Err(format!("Running {} has no PID: {:?}", status.name, status));
    }
    if status.started_by_app != Some(started_by_app) {
        return Err(format!(
            "Expected startedByApp={} for {}, got {:?}",
            started_by_app, status.name, status.started_by_app
        ));
    }
    Ok(())
}

/// Assert that a status record reports a stopped server
pub fn assert_stopped(status: &ServerProcessStatus) -> Result<(), String> {
    if status.status != RunState::Stopped || status.pid.is_some() {
        return Err(format!("Expected {} stopped, got {:?}", status.name, status));
    }
    Ok(())
}

/// Assert that exactly one process runs from the install's executable
pub fn assert_single_instance(install: &ServerInstall, kind: ServerKind) -> Result<u32, String> {
    match install.running_pids(kind).as_slice() {
        [pid] => Ok(*pid),
        pids => Err(format!("Expected one {} instance, found {:?}", kind, pids)),
    }
}

/// Assert that a capture file contains `needle`
pub fn assert_capture_contains(
    install: &ServerInstall,
    kind: ServerKind,
    stream: &str,
    needle: &str,
) -> Result<(), String> {
    let path = install.capture_file(kind, stream);
    let content = read_or_empty(&path);
    if content.contains(needle) {
        Ok(())
    } else {
        Err(format!(
            "{} does not contain {:?}. Content:\n{}",
            path.display(),
            needle,
            content
        ))
    }
}
