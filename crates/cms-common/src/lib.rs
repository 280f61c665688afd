//! # CMS Common
//!
//! Types shared by every crate of the CMS server manager.
//!
//! This crate provides the foundational pieces the process-control core and
//! its callers agree on:
//! - the process error taxonomy (`ProcessError`, `ProcessResult`)
//! - the managed server identities (`ServerKind`)
//! - the status records returned to callers (`ServerProcessStatus`)

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{ProcessError, ProcessResult};
pub use types::{
    LogOutput, LogsSnapshot, RunState, ServerKind, ServerPaths, ServerProcessStatus,
    SinglePathRequest, WowLaunchRequest, WowLaunchResponse,
};
