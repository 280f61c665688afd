//! Core domain types used throughout the CMS server manager.
//!
//! All records serialize as camelCase JSON, the shape the console frontend
//! consumes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The managed server executables.
///
/// # Example
/// ```
/// use cms_common::ServerKind;
///
/// assert_eq!(ServerKind::Realmd.as_str(), "realmd");
/// assert_eq!(ServerKind::ALL, [ServerKind::Realmd, ServerKind::Mangosd]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    /// Authentication and realm-list service.
    Realmd,
    /// World simulation service.
    Mangosd,
}

impl ServerKind {
    /// Every managed server, in the order aggregate operations visit them.
    pub const ALL: [ServerKind; 2] = [ServerKind::Realmd, ServerKind::Mangosd];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerKind::Realmd => "realmd",
            ServerKind::Mangosd => "mangosd",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ServerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "realmd" => Ok(ServerKind::Realmd),
            "mangosd" => Ok(ServerKind::Mangosd),
            other => Err(format!("unknown server: {}", other)),
        }
    }
}

/// Observable state of a managed server.
///
/// `Starting` and `Stopping` exist only inside a single request and are
/// never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Stopped,
    /// State could not be determined; the status record carries the reason.
    Unknown,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::Stopped => write!(f, "stopped"),
            RunState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Status record for one managed server, computed fresh on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProcessStatus {
    pub name: ServerKind,
    pub status: RunState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_by_app: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerProcessStatus {
    pub fn running(
        name: ServerKind,
        pid: u32,
        executable_path: impl Into<String>,
        started_by_app: bool,
    ) -> Self {
        Self {
            name,
            status: RunState::Running,
            pid: Some(pid),
            executable_path: Some(executable_path.into()),
            started_by_app: Some(started_by_app),
            error: None,
        }
    }

    pub fn stopped(name: ServerKind, executable_path: impl Into<String>) -> Self {
        Self {
            name,
            status: RunState::Stopped,
            pid: None,
            executable_path: Some(executable_path.into()),
            started_by_app: None,
            error: None,
        }
    }

    pub fn unknown(name: ServerKind, error: impl Into<String>) -> Self {
        Self {
            name,
            status: RunState::Unknown,
            pid: None,
            executable_path: None,
            started_by_app: None,
            error: Some(error.into()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == RunState::Running
    }
}

/// Paths for both servers, as supplied by the active profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPaths {
    #[serde(default)]
    pub realmd_path: String,
    #[serde(default)]
    pub mangosd_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_console: Option<bool>,
}

impl ServerPaths {
    pub fn new(realmd_path: impl Into<String>, mangosd_path: impl Into<String>) -> Self {
        Self {
            realmd_path: realmd_path.into(),
            mangosd_path: mangosd_path.into(),
            show_console: None,
        }
    }

    pub fn path_for(&self, kind: ServerKind) -> &str {
        match kind {
            ServerKind::Realmd => &self.realmd_path,
            ServerKind::Mangosd => &self.mangosd_path,
        }
    }

    pub fn show_console(&self) -> bool {
        self.show_console.unwrap_or(false)
    }
}

/// Request addressing a single server.
///
/// Accepts the generic `path` key as well as `realmdPath` / `mangosdPath`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinglePathRequest {
    #[serde(default, alias = "realmdPath", alias = "mangosdPath")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_console: Option<bool>,
}

/// Tails of the two capture files of one server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsSnapshot {
    pub realmd: LogOutput,
    pub mangosd: LogOutput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WowLaunchRequest {
    #[serde(default)]
    pub wow_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WowLaunchResponse {
    pub executable_path: String,
}
