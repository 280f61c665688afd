//! Error types for process control.
//!
//! Every fallible operation of the process-control core returns
//! `ProcessResult<T>`. Status queries are the exception: they never fail and
//! report problems through `RunState::Unknown` plus an error string instead.

use thiserror::Error;

/// Process-specific error types.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The supplied path does not lead to the expected executable.
    ///
    /// User correctable; the message always names the executable so the
    /// caller can tell which of the configured paths is wrong.
    #[error("{reason}")]
    PathResolution { exe_name: String, reason: String },

    #[error("Operation not supported on this platform: {operation}")]
    UnsupportedPlatform { operation: String },

    #[error("Process spawn failed: {id} - {reason}")]
    SpawnFailed { id: String, reason: String },

    #[error("Process stop failed: {id} - {reason}")]
    StopFailed { id: String, reason: String },

    #[error("Process timeout: {id} - {operation}")]
    Timeout { id: String, operation: String },

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("Process logging error: {id} - {reason}")]
    LoggingError { id: String, reason: String },

    #[error("Task panicked for process '{id}': {message}")]
    TaskPanic { id: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Path is blank.
    pub fn path_required(exe_name: impl Into<String>) -> Self {
        let exe_name = exe_name.into();
        Self::PathResolution {
            reason: format!("{} path is required.", exe_name),
            exe_name,
        }
    }

    /// Neither the path itself nor `{path}/{exe_name}` exists.
    pub fn executable_not_found(exe_name: impl Into<String>) -> Self {
        let exe_name = exe_name.into();
        Self::PathResolution {
            reason: format!("Could not find {} at the specified path.", exe_name),
            exe_name,
        }
    }

    pub fn unsupported_platform(operation: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            operation: operation.into(),
        }
    }

    pub fn spawn_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn stop_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StopFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Timeout {
            id: id.into(),
            operation: operation.into(),
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    pub fn logging(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoggingError {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn task_panic(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskPanic {
            id: id.into(),
            message: message.into(),
        }
    }

    /// True for errors the caller can fix by supplying different input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::PathResolution { .. })
    }
}

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
