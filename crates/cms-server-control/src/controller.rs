//! ServerController - lifecycle control of realmd and mangosd.
//!
//! Every operation starts from the executable path supplied by the caller:
//! the path is resolved, the process table is searched for processes
//! started from that exact executable, and only then is anything spawned or
//! terminated. The controller keeps no state apart from the started-by-app
//! registry, which only decorates status records.

use crate::config::ControlOptions;
use crate::registry::StartedByAppRegistry;
use crate::resolver::{find_all_matching_processes, find_matching_process, resolve_executable, ProcessMatch};
use crate::server_spec::ServerSpec;
use crate::supervisor::{log_events, supervise, EventSender};
use async_trait::async_trait;
use cms_common::{
    LogOutput, LogsSnapshot, ProcessError, ProcessResult, ServerKind, ServerPaths,
    ServerProcessStatus,
};
use cms_log_collection::{read_tail, CapturePaths};
use cms_process::{
    force_kill, process_alive, spawn_process, terminate_tree, OutputMode, SpawnSpec,
    TerminationMode,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Options for starting a server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Run with a visible console instead of capturing output.
    pub show_console: bool,
    /// Command line override; the server's default arguments otherwise.
    pub args: Option<Vec<String>>,
}

impl StartOptions {
    pub fn new(show_console: bool) -> Self {
        Self {
            show_console,
            args: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = Some(args);
        self
    }
}

/// Lifecycle operations on the managed servers.
///
/// The aggregate operations visit realmd then mangosd, one after the other,
/// and stop at the first failure without undoing earlier steps.
#[async_trait]
pub trait ServerControl: Send + Sync {
    /// Current status. Never fails: problems are reported as `unknown`.
    async fn status(
        &self,
        kind: ServerKind,
        path: &str,
        cancel: &CancellationToken,
    ) -> ServerProcessStatus;

    /// Start the server unless an instance from the same executable runs.
    async fn start(
        &self,
        kind: ServerKind,
        path: &str,
        options: &StartOptions,
    ) -> ProcessResult<ServerProcessStatus>;

    /// Stop every instance started from the executable, with its children.
    async fn stop(&self, kind: ServerKind, path: &str) -> ProcessResult<ServerProcessStatus>;

    /// Tails of the server's capture files.
    async fn logs(
        &self,
        kind: ServerKind,
        path: &str,
        cancel: &CancellationToken,
    ) -> ProcessResult<LogOutput>;

    async fn restart(
        &self,
        kind: ServerKind,
        path: &str,
        options: &StartOptions,
    ) -> ProcessResult<ServerProcessStatus> {
        self.stop(kind, path).await?;
        self.start(kind, path, options).await
    }

    async fn status_all(
        &self,
        paths: &ServerPaths,
        cancel: &CancellationToken,
    ) -> Vec<ServerProcessStatus> {
        let mut statuses = Vec::with_capacity(ServerKind::ALL.len());
        for kind in ServerKind::ALL {
            statuses.push(self.status(kind, paths.path_for(kind), cancel).await);
        }
        statuses
    }

    async fn start_all(&self, paths: &ServerPaths) -> ProcessResult<Vec<ServerProcessStatus>> {
        let options = StartOptions::new(paths.show_console());
        let mut statuses = Vec::with_capacity(ServerKind::ALL.len());
        for kind in ServerKind::ALL {
            statuses.push(self.start(kind, paths.path_for(kind), &options).await?);
        }
        Ok(statuses)
    }

    async fn stop_all(&self, paths: &ServerPaths) -> ProcessResult<Vec<ServerProcessStatus>> {
        let mut statuses = Vec::with_capacity(ServerKind::ALL.len());
        for kind in ServerKind::ALL {
            statuses.push(self.stop(kind, paths.path_for(kind)).await?);
        }
        Ok(statuses)
    }

    async fn restart_all(&self, paths: &ServerPaths) -> ProcessResult<Vec<ServerProcessStatus>> {
        let options = StartOptions::new(paths.show_console());
        let mut statuses = Vec::with_capacity(ServerKind::ALL.len());
        for kind in ServerKind::ALL {
            statuses.push(self.restart(kind, paths.path_for(kind), &options).await?);
        }
        Ok(statuses)
    }

    async fn logs_all(
        &self,
        paths: &ServerPaths,
        cancel: &CancellationToken,
    ) -> ProcessResult<LogsSnapshot> {
        Ok(LogsSnapshot {
            realmd: self
                .logs(ServerKind::Realmd, paths.path_for(ServerKind::Realmd), cancel)
                .await?,
            mangosd: self
                .logs(ServerKind::Mangosd, paths.path_for(ServerKind::Mangosd), cancel)
                .await?,
        })
    }
}

/// The process-table backed `ServerControl`.
pub struct ServerController {
    options: ControlOptions,
    registry: StartedByAppRegistry,
    events: EventSender,
    shutdown: CancellationToken,
}

impl ServerController {
    /// Create a controller and its event logging task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(options: ControlOptions) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        tokio::spawn(log_events(rx));

        Self {
            options,
            registry: StartedByAppRegistry::new(),
            events,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    pub fn registry(&self) -> &StartedByAppRegistry {
        &self.registry
    }

    /// Stop supervising children. Running servers are left alone.
    pub fn shutdown(&self) {
        info!("Server controller shutting down, supervised servers keep running");
        self.shutdown.cancel();
    }

    async fn query_status(&self, spec: &ServerSpec, path: &str) -> ServerProcessStatus {
        let kind = spec.kind;
        let executable = match resolve_executable(path, &spec.exe_file_name) {
            Ok(executable) => executable,
            Err(e) => return ServerProcessStatus::unknown(kind, e.to_string()),
        };

        match find_one(kind, executable.clone()).await {
            Ok(Some(found)) => ServerProcessStatus::running(
                kind,
                found.pid,
                executable.display().to_string(),
                self.registry.is_started_by_app(kind, found.pid),
            ),
            Ok(None) => ServerProcessStatus::stopped(kind, executable.display().to_string()),
            Err(e) => ServerProcessStatus::unknown(kind, e.to_string()),
        }
    }

    fn spawn_server(
        &self,
        spec: &ServerSpec,
        executable: &Path,
        options: &StartOptions,
    ) -> ProcessResult<Option<u32>> {
        let working_dir = executable
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let args = options
            .args
            .clone()
            .unwrap_or_else(|| spec.default_args(&working_dir));
        let output = if options.show_console {
            OutputMode::Console
        } else {
            OutputMode::Captured
        };

        let spawned = spawn_process(
            &SpawnSpec::new(executable, &working_dir)
                .with_args(args)
                .with_output(output),
        )?;

        let recorded = if spawned.pid_is_target { spawned.pid } else { None };
        if let Some(pid) = recorded {
            self.registry.record(spec.kind, pid);
        }

        if let Some(child) = spawned.child {
            let capture = (output == OutputMode::Captured)
                .then(|| CapturePaths::new(&working_dir, spec.name()));
            supervise(
                spec.kind,
                child,
                capture,
                self.events.clone(),
                self.shutdown.child_token(),
            );
        }

        Ok(recorded)
    }

    /// Graceful termination, bounded wait, then forced kill.
    ///
    /// The tree is walked before the root gets a chance to exit. Children
    /// reparented after that no longer show up under the root, so they are
    /// tracked by the PIDs of the first walk.
    async fn terminate_process(&self, kind: ServerKind, pid: u32) -> ProcessResult<()> {
        info!("Stopping {} (PID: {})", kind, pid);

        let tree = match blocking(kind, move || terminate_tree(pid, TerminationMode::Graceful)).await {
            Ok(signalled) => {
                debug!("Termination signal sent to {} process(es)", signalled.len());
                signalled
            }
            Err(e) => {
                warn!("Failed to send termination signal to PID {}: {}", pid, e);
                vec![pid]
            }
        };

        let graceful_timeout = self.options.graceful_stop_timeout;
        let survivors = wait_for_exit(kind, tree, graceful_timeout).await?;
        if survivors.is_empty() {
            info!("{} terminated gracefully (PID: {})", kind, pid);
            return Ok(());
        }

        warn!(
            "Graceful shutdown timed out for {} (PID: {}), force killing {} process(es)",
            kind,
            pid,
            survivors.len()
        );

        let mut targets = survivors.clone();
        if survivors.contains(&pid) {
            match blocking(kind, move || terminate_tree(pid, TerminationMode::Forced)).await {
                Ok(killed) => targets.extend(killed),
                Err(e) => error!("Force kill failed for {} (PID: {}): {}", kind, pid, e),
            }
        }
        let orphans: Vec<u32> = survivors.into_iter().filter(|&p| p != pid).collect();
        blocking(kind, move || {
            for orphan in orphans {
                if let Err(e) = force_kill(orphan) {
                    warn!(pid = orphan, "Failed to kill leftover process: {}", e);
                }
            }
            Ok(())
        })
        .await?;
        targets.sort_unstable();
        targets.dedup();

        let force_timeout = self.options.force_kill_timeout;
        let survivors = wait_for_exit(kind, targets, force_timeout).await?;
        if !survivors.contains(&pid) {
            if !survivors.is_empty() {
                warn!(
                    "{} children of {} survived the force kill: {:?}",
                    survivors.len(),
                    kind,
                    survivors
                );
            }
            info!("{} terminated after force kill (PID: {})", kind, pid);
            return Ok(());
        }

        Err(ProcessError::timeout(
            kind.as_str(),
            format!(
                "stop (PID {} did not exit after graceful timeout {:?} + force-kill timeout {:?})",
                pid, graceful_timeout, force_timeout
            ),
        ))
    }
}

#[async_trait]
impl ServerControl for ServerController {
    async fn status(
        &self,
        kind: ServerKind,
        path: &str,
        cancel: &CancellationToken,
    ) -> ServerProcessStatus {
        let spec = ServerSpec::for_kind(kind);
        tokio::select! {
            _ = cancel.cancelled() => ServerProcessStatus::unknown(kind, "operation cancelled"),
            status = self.query_status(&spec, path) => status,
        }
    }

    async fn start(
        &self,
        kind: ServerKind,
        path: &str,
        options: &StartOptions,
    ) -> ProcessResult<ServerProcessStatus> {
        let spec = ServerSpec::for_kind(kind);
        let executable = resolve_executable(path, &spec.exe_file_name)?;

        if let Some(found) = find_one(kind, executable.clone()).await? {
            info!("{} is already running (PID: {})", kind, found.pid);
            return Ok(ServerProcessStatus::running(
                kind,
                found.pid,
                executable.display().to_string(),
                self.registry.is_started_by_app(kind, found.pid),
            ));
        }

        let pid = self.spawn_server(&spec, &executable, options)?;
        info!(
            server = %kind,
            pid = ?pid,
            executable = %executable.display(),
            console = options.show_console,
            "Server started"
        );

        Ok(self.query_status(&spec, path).await)
    }

    async fn stop(&self, kind: ServerKind, path: &str) -> ProcessResult<ServerProcessStatus> {
        let spec = ServerSpec::for_kind(kind);
        let executable = resolve_executable(path, &spec.exe_file_name)?;

        let matches = find_all(kind, executable.clone()).await?;
        if matches.is_empty() {
            debug!("{} is not running", kind);
        }
        for found in &matches {
            self.terminate_process(kind, found.pid).await?;
        }

        self.registry.clear(kind);
        Ok(ServerProcessStatus::stopped(kind, executable.display().to_string()))
    }

    async fn logs(
        &self,
        kind: ServerKind,
        path: &str,
        cancel: &CancellationToken,
    ) -> ProcessResult<LogOutput> {
        let spec = ServerSpec::for_kind(kind);
        let executable = resolve_executable(path, &spec.exe_file_name)?;
        let working_dir = executable.parent().unwrap_or_else(|| Path::new(""));
        let capture = CapturePaths::new(working_dir, spec.name());
        let max_bytes = self.options.log_tail_bytes;

        Ok(LogOutput {
            stdout: read_tail(&capture.stdout, max_bytes, cancel).await?,
            stderr: read_tail(&capture.stderr, max_bytes, cancel).await?,
        })
    }
}

impl Drop for ServerController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn find_one(kind: ServerKind, executable: PathBuf) -> ProcessResult<Option<ProcessMatch>> {
    blocking(kind, move || find_matching_process(&executable)).await
}

async fn find_all(kind: ServerKind, executable: PathBuf) -> ProcessResult<Vec<ProcessMatch>> {
    blocking(kind, move || find_all_matching_processes(&executable)).await
}

/// Run a process-table call on the blocking pool.
async fn blocking<T, F>(kind: ServerKind, f: F) -> ProcessResult<T>
where
    F: FnOnce() -> ProcessResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ProcessError::task_panic(kind.as_str(), e.to_string()))?
}

/// Poll until every PID in `pids` is gone. Returns those still alive at the
/// deadline.
async fn wait_for_exit(
    kind: ServerKind,
    mut pids: Vec<u32>,
    timeout: Duration,
) -> ProcessResult<Vec<u32>> {
    let deadline = Instant::now() + timeout;
    loop {
        pids = blocking(kind, move || still_alive(pids)).await?;
        if pids.is_empty() || Instant::now() >= deadline {
            return Ok(pids);
        }
        tokio::time::sleep(EXIT_POLL_INTERVAL).await;
    }
}

fn still_alive(pids: Vec<u32>) -> ProcessResult<Vec<u32>> {
    let mut alive = Vec::with_capacity(pids.len());
    for pid in pids {
        let running = process_alive(pid).map_err(|e| {
            ProcessError::stop_failed(
                pid.to_string(),
                format!("Failed to check process existence: {}", e),
            )
        })?;
        if running {
            alive.push(pid);
        }
    }
    Ok(alive)
}
