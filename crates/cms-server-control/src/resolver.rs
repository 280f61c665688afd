//! Process identity resolution.
//!
//! A managed server is identified by its executable path alone. Whatever the
//! caller typed (a directory or the executable itself) is resolved to an
//! absolute executable path, and running processes are matched against it by
//! comparing normalized paths. No PID survives a manager restart.

use cms_common::{ProcessError, ProcessResult, ServerKind, ServerPaths};
use cms_process::list_processes_named;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A running process started from the resolved executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMatch {
    pub pid: u32,
    pub executable_path: PathBuf,
}

/// Platform file name of a logical executable name (`realmd` → `realmd.exe`
/// on Windows).
pub fn exe_file_name(stem: &str) -> String {
    format!("{}{}", stem, std::env::consts::EXE_SUFFIX)
}

/// Resolve user input to the absolute path of `exe_name`.
///
/// The input may name the executable itself or the directory holding it.
/// The same input always resolves the same way.
pub fn resolve_executable(input: &str, exe_name: &str) -> ProcessResult<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ProcessError::path_required(exe_name));
    }

    let path = PathBuf::from(trimmed);

    let names_exe = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.eq_ignore_ascii_case(exe_name))
        .unwrap_or(false);
    if names_exe && path.is_file() {
        return absolutize(&path);
    }

    let candidate = path.join(exe_name);
    if candidate.is_file() {
        return absolutize(&candidate);
    }

    debug!(input = %trimmed, exe = %exe_name, "Executable not found");
    Err(ProcessError::executable_not_found(exe_name))
}

/// Resolve both server paths, failing on the first that does not resolve.
pub fn validate_paths(paths: &ServerPaths) -> ProcessResult<ServerPaths> {
    let realmd = resolve_executable(
        paths.path_for(ServerKind::Realmd),
        &exe_file_name(ServerKind::Realmd.as_str()),
    )?;
    let mangosd = resolve_executable(
        paths.path_for(ServerKind::Mangosd),
        &exe_file_name(ServerKind::Mangosd.as_str()),
    )?;

    Ok(ServerPaths {
        realmd_path: realmd.display().to_string(),
        mangosd_path: mangosd.display().to_string(),
        show_console: paths.show_console,
    })
}

/// Comparison key for executable paths.
///
/// Symlinks are resolved when the file exists. Case is folded only where
/// the file system is case-insensitive.
pub fn normalize_for_match(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path)
        .or_else(|_| absolutize(path))
        .unwrap_or_else(|_| path.to_path_buf());

    let mut key = resolved.to_string_lossy().into_owned();

    if let Some(rest) = key.strip_prefix(r"\\?\UNC\") {
        key = format!(r"\\{}", rest);
    } else if let Some(rest) = key.strip_prefix(r"\\?\") {
        key = rest.to_string();
    }

    if cfg!(windows) {
        key = key.replace('/', "\\");
    }

    while key.len() > 1 && (key.ends_with('/') || key.ends_with('\\')) {
        key.pop();
    }

    if cfg!(any(windows, target_os = "macos")) {
        key = key.to_lowercase();
    }

    key
}

/// Every live process started from `executable`, ordered by PID.
///
/// Blocking: takes a process table snapshot.
pub fn find_all_matching_processes(executable: &Path) -> ProcessResult<Vec<ProcessMatch>> {
    let file_name = executable
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = normalize_for_match(executable);

    let matches: Vec<ProcessMatch> = list_processes_named(&file_name)?
        .into_iter()
        .filter_map(|info| {
            // Processes whose image path we may not read cannot be identified
            let exe = info.exe?;
            (normalize_for_match(&exe) == target).then(|| ProcessMatch {
                pid: info.pid,
                executable_path: exe,
            })
        })
        .collect();

    debug!(
        executable = %executable.display(),
        count = matches.len(),
        "Matched running processes"
    );
    Ok(matches)
}

/// The process started from `executable`, if any.
///
/// With several candidates the lowest PID wins so repeated queries agree.
pub fn find_matching_process(executable: &Path) -> ProcessResult<Option<ProcessMatch>> {
    Ok(find_all_matching_processes(executable)?
        .into_iter()
        .min_by_key(|m| m.pid))
}

fn absolutize(path: &Path) -> ProcessResult<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    // Lexical cleanup so "a/./b/../realmd" and "a/realmd" resolve alike
    let mut cleaned = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    Ok(cleaned)
}
