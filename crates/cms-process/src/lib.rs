//! # CMS Process
//!
//! Low-level process operations for the CMS server manager.
//!
//! This crate provides cross-platform primitives for:
//! - Process table snapshots and image-name filtering
//! - Process existence checks
//! - Graceful and forced termination of whole process trees
//! - Spawning server executables and detached applications
//!
//! Nothing in here knows about realmd or mangosd; identity matching and
//! lifecycle policy live in `cms-server-control`.

pub mod check;
pub mod discovery;
pub mod execute;
pub mod terminate;

// Re-export main types
pub use check::*;
pub use discovery::*;
pub use execute::*;
pub use terminate::*;
