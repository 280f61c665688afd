//! Process table snapshots.
//!
//! The manager never trusts a remembered PID across restarts, so every
//! identity question starts from a fresh snapshot of the OS process table.

use cms_common::{ProcessError, ProcessResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, System, UpdateKind};
use tracing::debug;

/// One entry of the OS process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub parent: Option<u32>,
    /// Image name as reported by the OS.
    pub name: String,
    /// Full executable path, when the OS lets us read it.
    pub exe: Option<PathBuf>,
    pub zombie: bool,
}

impl ProcessInfo {
    /// Whether this process was started from an image called `file_name`.
    ///
    /// This is the cheap pre-filter applied before exact path comparison.
    pub fn image_name_matches(&self, file_name: &str) -> bool {
        let from_exe = self
            .exe
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str());

        match from_exe {
            Some(exe_name) => names_equal(exe_name, file_name),
            None => names_equal(&self.name, file_name),
        }
    }
}

#[cfg(any(windows, target_os = "macos"))]
fn names_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(not(any(windows, target_os = "macos")))]
fn names_equal(a: &str, b: &str) -> bool {
    a == b
}

/// Fail early on platforms `sysinfo` cannot enumerate.
pub fn ensure_supported(operation: &str) -> ProcessResult<()> {
    if sysinfo::IS_SUPPORTED_SYSTEM {
        Ok(())
    } else {
        Err(ProcessError::unsupported_platform(operation))
    }
}

/// Take a snapshot of every process on the machine.
///
/// This is a blocking call; async callers should run it on the blocking pool.
pub fn snapshot_processes() -> ProcessResult<Vec<ProcessInfo>> {
    ensure_supported("process enumeration")?;

    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessRefreshKind::new().with_exe(UpdateKind::OnlyIfNotSet),
    );

    let leaders = thread_group_leaders();
    let mut processes: Vec<ProcessInfo> = system
        .processes()
        .iter()
        .filter(|(pid, _)| {
            leaders
                .as_ref()
                .map_or(true, |leaders| leaders.contains(&pid.as_u32()))
        })
        .map(|(pid, process)| ProcessInfo {
            pid: pid.as_u32(),
            parent: process.parent().map(|p| p.as_u32()),
            name: process.name().to_string(),
            exe: process.exe().map(live_image_path),
            zombie: matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead),
        })
        .collect();

    processes.sort_by_key(|p| p.pid);
    debug!(count = processes.len(), "Process table snapshot taken");
    Ok(processes)
}

/// Linux reports `<path> (deleted)` for a process whose image file was
/// replaced or removed since it started. The process still belongs to
/// `<path>`.
#[cfg(target_os = "linux")]
fn live_image_path(exe: &Path) -> PathBuf {
    const DELETED: &str = " (deleted)";

    match exe.to_str().and_then(|s| s.strip_suffix(DELETED)) {
        Some(original) if !exe.exists() => PathBuf::from(original),
        _ => exe.to_path_buf(),
    }
}

#[cfg(not(target_os = "linux"))]
fn live_image_path(exe: &Path) -> PathBuf {
    exe.to_path_buf()
}

/// PIDs listed in /proc. sysinfo reports each thread as its own entry on
/// Linux, and threads are reachable under /proc but not listed there.
#[cfg(target_os = "linux")]
fn thread_group_leaders() -> Option<HashSet<u32>> {
    let entries = std::fs::read_dir("/proc").ok()?;
    Some(
        entries
            .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse().ok())
            .collect(),
    )
}

#[cfg(not(target_os = "linux"))]
fn thread_group_leaders() -> Option<HashSet<u32>> {
    None
}

/// Live processes whose image name is `file_name`, ordered by PID.
pub fn list_processes_named(file_name: &str) -> ProcessResult<Vec<ProcessInfo>> {
    Ok(snapshot_processes()?
        .into_iter()
        .filter(|p| !p.zombie && p.image_name_matches(file_name))
        .collect())
}

/// All descendants of `root` in the snapshot, deepest first.
///
/// Children are listed before their parents so a tree can be torn down
/// leaf to root.
pub fn descendants(snapshot: &[ProcessInfo], root: u32) -> Vec<u32> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for process in snapshot {
        if let Some(parent) = process.parent {
            if parent != process.pid {
                children.entry(parent).or_default().push(process.pid);
            }
        }
    }

    let mut ordered = Vec::new();
    collect_descendants(&children, root, &mut ordered, 0);
    ordered
}

fn collect_descendants(
    children: &HashMap<u32, Vec<u32>>,
    pid: u32,
    out: &mut Vec<u32>,
    depth: usize,
) {
    // Guards against cycles from PID reuse between reads
    if depth > 64 {
        return;
    }
    if let Some(kids) = children.get(&pid) {
        for &kid in kids {
            if out.contains(&kid) {
                continue;
            }
            collect_descendants(children, kid, out, depth + 1);
            out.push(kid);
        }
    }
}

/// True when the OS still lists `pid` but it has already exited.
pub fn is_zombie(pid: u32) -> bool {
    let mut system = System::new();
    let sysinfo_pid = Pid::from_u32(pid);
    if !system.refresh_process_specifics(sysinfo_pid, ProcessRefreshKind::new()) {
        return false;
    }
    system
        .process(sysinfo_pid)
        .map(|p| matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
        .unwrap_or(false)
}
