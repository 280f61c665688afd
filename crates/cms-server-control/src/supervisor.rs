//! Child supervision.
//!
//! Every server spawned by the controller is handed to a supervisor task
//! which owns the `Child`, pumps its output into the capture files and reaps
//! it on exit. Anything worth reporting goes to one event channel drained by
//! a single logging task, so pump failures never surface to the caller of
//! `start`.
//!
//! Detaching stops the wait on the child only. The pumps keep draining until
//! the child closes its streams, so a detached server never writes into a
//! pipe nobody reads while the manager is alive.

use chrono::{DateTime, Utc};
use cms_common::ServerKind;
use cms_log_collection::{pump_stream, CapturePaths, PumpStats, StreamType};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Something a supervisor observed.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    Spawned {
        kind: ServerKind,
        pid: u32,
        at: DateTime<Utc>,
    },
    PumpFinished {
        kind: ServerKind,
        stream: StreamType,
        stats: PumpStats,
    },
    PumpFailed {
        kind: ServerKind,
        stream: StreamType,
        error: String,
    },
    Exited {
        kind: ServerKind,
        pid: Option<u32>,
        code: Option<i32>,
        at: DateTime<Utc>,
    },
    WaitFailed {
        kind: ServerKind,
        pid: Option<u32>,
        error: String,
    },
    /// Controller shut down while the child was still running.
    Detached { kind: ServerKind, pid: Option<u32> },
}

pub type EventSender = mpsc::UnboundedSender<SupervisorEvent>;

/// Take ownership of `child` and supervise it until it exits or `cancel`
/// fires. The child itself is never killed by the supervisor, and `cancel`
/// does not stop the output pumps.
pub fn supervise(
    kind: ServerKind,
    mut child: Child,
    capture: Option<CapturePaths>,
    events: EventSender,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let pid = child.id();
    if let Some(pid) = pid {
        let _ = events.send(SupervisorEvent::Spawned {
            kind,
            pid,
            at: Utc::now(),
        });
    }

    if let Some(paths) = capture {
        if let Some(stdout) = child.stdout.take() {
            spawn_pump(kind, stdout, paths.stdout, StreamType::Stdout, &events);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_pump(kind, stderr, paths.stderr, StreamType::Stderr, &events);
        }
    }

    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = events.send(SupervisorEvent::Detached { kind, pid });
            }
            status = child.wait() => {
                let event = match status {
                    Ok(status) => SupervisorEvent::Exited {
                        kind,
                        pid,
                        code: status.code(),
                        at: Utc::now(),
                    },
                    Err(e) => SupervisorEvent::WaitFailed {
                        kind,
                        pid,
                        error: e.to_string(),
                    },
                };
                let _ = events.send(event);
            }
        }
    })
}

fn spawn_pump<R>(
    kind: ServerKind,
    stream: R,
    path: std::path::PathBuf,
    stream_type: StreamType,
    events: &EventSender,
) where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let events = events.clone();

    tokio::spawn(async move {
        let event = match pump_stream(stream, &path, kind.as_str(), stream_type).await {
            Ok(stats) => SupervisorEvent::PumpFinished {
                kind,
                stream: stream_type,
                stats,
            },
            Err(e) => SupervisorEvent::PumpFailed {
                kind,
                stream: stream_type,
                error: e.to_string(),
            },
        };
        let _ = events.send(event);
    });

    debug!("{} log collection started for {}", stream_type, kind);
}

/// Drain supervisor events into the tracing log until every sender is gone.
pub async fn log_events(mut events: mpsc::UnboundedReceiver<SupervisorEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SupervisorEvent::Spawned { kind, pid, at } => {
                info!(server = %kind, pid, started_at = %at.to_rfc3339(), "Server supervised");
            }
            SupervisorEvent::PumpFinished { kind, stream, stats } => {
                debug!(
                    server = %kind,
                    %stream,
                    lines = stats.lines,
                    bytes = stats.bytes,
                    "Output capture finished"
                );
            }
            SupervisorEvent::PumpFailed { kind, stream, error } => {
                warn!(server = %kind, %stream, "Output capture failed: {}", error);
            }
            SupervisorEvent::Exited { kind, pid, code, at } => {
                info!(
                    server = %kind,
                    pid = ?pid,
                    exit_code = ?code,
                    exited_at = %at.to_rfc3339(),
                    "Server exited"
                );
            }
            SupervisorEvent::WaitFailed { kind, pid, error } => {
                warn!(server = %kind, pid = ?pid, "Failed to wait for server: {}", error);
            }
            SupervisorEvent::Detached { kind, pid } => {
                info!(server = %kind, pid = ?pid, "Supervisor detached, server left running");
            }
        }
    }
}
