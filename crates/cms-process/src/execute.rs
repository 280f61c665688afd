//! Process execution primitives.
//!
//! Spawning is synchronous from the caller's point of view: every function
//! here returns as soon as the OS has created the process.

use cms_common::{ProcessError, ProcessResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// How the spawned process's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// stdout/stderr are piped back to the caller for capture; stdin is closed.
    Captured,
    /// The process owns a visible console and nothing is captured.
    Console,
}

/// Everything needed to launch one executable.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub output: OutputMode,
}

impl SpawnSpec {
    pub fn new(executable: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            output: OutputMode::Captured,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

/// A spawned process.
///
/// `child` is `None` when the process was handed to the OS shell and the
/// handle we hold belongs to the shell rather than the server.
#[derive(Debug)]
pub struct Spawned {
    pub pid: Option<u32>,
    pub child: Option<Child>,
    /// Whether `pid` is the server itself (and not an intermediate shell).
    pub pid_is_target: bool,
}

/// Spawn a server executable according to `spec`.
pub fn spawn_process(spec: &SpawnSpec) -> ProcessResult<Spawned> {
    let id = display_name(&spec.executable);
    debug!(
        executable = %spec.executable.display(),
        working_dir = %spec.working_dir.display(),
        args = ?spec.args,
        mode = ?spec.output,
        "Spawning process"
    );

    match spec.output {
        OutputMode::Captured => spawn_captured(spec, &id),
        OutputMode::Console => spawn_console(spec, &id),
    }
}

fn spawn_captured(spec: &SpawnSpec, id: &str) -> ProcessResult<Spawned> {
    let mut cmd = Command::new(&spec.executable);
    cmd.args(&spec.args)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Servers must survive the manager: keep them out of our terminal's
    // process group so Ctrl+C on the console does not reach them.
    #[cfg(unix)]
    {
        cmd.process_group(0);
        // Once the manager exits nobody reads the pipes. A write must then
        // fail with EPIPE instead of killing the server.
        unsafe {
            cmd.pre_exec(ignore_sigpipe);
        }
    }

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    let child = cmd
        .spawn()
        .map_err(|e| ProcessError::spawn_failed(id, e.to_string()))?;
    let pid = child.id();

    info!(process = %id, pid = ?pid, "Process spawned with output capture");
    Ok(Spawned {
        pid,
        child: Some(child),
        pid_is_target: true,
    })
}

/// Runs in the forked child before exec. An ignored disposition survives
/// exec, a handled one does not.
#[cfg(unix)]
fn ignore_sigpipe() -> std::io::Result<()> {
    use nix::sys::signal::{signal, SigHandler, Signal};

    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }?;
    Ok(())
}

#[cfg(windows)]
fn spawn_console(spec: &SpawnSpec, id: &str) -> ProcessResult<Spawned> {
    // `start` gives the server its own console window; the handle we get
    // back belongs to cmd.exe, which exits immediately.
    let mut cmd = Command::new("cmd.exe");
    cmd.arg("/c")
        .arg("start")
        .arg("")
        .arg(&spec.executable)
        .args(&spec.args)
        .current_dir(&spec.working_dir);

    let mut child = cmd
        .spawn()
        .map_err(|e| ProcessError::spawn_failed(id, e.to_string()))?;
    let pid = child.id();

    info!(process = %id, shell_pid = ?pid, "Process launched in its own console");
    tokio::spawn(async move {
        let _ = child.wait().await;
    });

    Ok(Spawned {
        pid,
        child: None,
        pid_is_target: false,
    })
}

#[cfg(not(windows))]
fn spawn_console(spec: &SpawnSpec, id: &str) -> ProcessResult<Spawned> {
    // No portable way to open a terminal window: the server shares the
    // manager's terminal instead.
    let mut cmd = Command::new(&spec.executable);
    cmd.args(&spec.args)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let child = cmd
        .spawn()
        .map_err(|e| ProcessError::spawn_failed(id, e.to_string()))?;
    let pid = child.id();

    info!(process = %id, pid = ?pid, "Process spawned on the manager console");
    Ok(Spawned {
        pid,
        child: Some(child),
        pid_is_target: true,
    })
}

/// Launch an interactive application and forget about it.
///
/// Used for the game client: nothing is captured and the process is not
/// tracked afterwards.
pub fn launch_detached(executable: &Path, working_dir: &Path) -> ProcessResult<Option<u32>> {
    let id = display_name(executable);

    let mut cmd = Command::new(executable);
    cmd.current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .map_err(|e| ProcessError::spawn_failed(&id, e.to_string()))?;
    let pid = child.id();

    info!(process = %id, pid = ?pid, "Detached process launched");
    // Reap when it exits so it never lingers as a zombie
    tokio::spawn(async move {
        let _ = child.wait().await;
    });

    Ok(pid)
}

fn display_name(executable: &Path) -> String {
    executable
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| executable.display().to_string())
}
