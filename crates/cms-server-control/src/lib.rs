//! # CMS Server Control
//!
//! Lifecycle control of the CMaNGOS server processes.
//!
//! This crate provides:
//! - the process identity resolver (path in, matching processes out)
//! - `ServerController`, start/stop/restart/status/logs for realmd and mangosd
//! - YAML configuration of the controller and the HTTP listener
//! - the game client launcher

pub mod config;
pub mod controller;
pub mod registry;
pub mod resolver;
pub mod server_spec;
pub mod supervisor;
pub mod wow;

// Re-export main types
pub use config::{ControlOptions, ManagerConfig, ServerOptions};
pub use controller::{ServerControl, ServerController, StartOptions};
pub use registry::StartedByAppRegistry;
pub use resolver::{
    exe_file_name, find_all_matching_processes, find_matching_process, normalize_for_match,
    resolve_executable, validate_paths, ProcessMatch,
};
pub use server_spec::ServerSpec;
pub use wow::{launch_wow, resolve_client};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
