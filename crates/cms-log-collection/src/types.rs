//! Core types for log collection

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stream type (stdout or stderr)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Stdout,
    Stderr,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Stdout => "stdout",
            StreamType::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Locations of the two capture files of one managed process.
///
/// Both live in the process's working directory and are named after the
/// process, e.g. `mangosd.stdout.log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePaths {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl CapturePaths {
    pub fn new(working_dir: &Path, process_name: &str) -> Self {
        Self {
            stdout: working_dir.join(Self::file_name(process_name, StreamType::Stdout)),
            stderr: working_dir.join(Self::file_name(process_name, StreamType::Stderr)),
        }
    }

    pub fn file_name(process_name: &str, stream: StreamType) -> String {
        format!("{}.{}.log", process_name, stream)
    }

    pub fn for_stream(&self, stream: StreamType) -> &Path {
        match stream {
            StreamType::Stdout => &self.stdout,
            StreamType::Stderr => &self.stderr,
        }
    }
}
