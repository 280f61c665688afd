//! # CMS Log Collection
//!
//! Output capture for managed servers.
//!
//! This crate provides:
//! - Capture-file naming (`{name}.stdout.log`, `{name}.stderr.log`)
//! - Append-mode output writers, one writer per file
//! - Stream pumps copying child output into capture files
//! - Bounded tail reads for API responses

pub mod output;
pub mod pump;
pub mod tail;
pub mod types;

// Re-export main types
pub use output::CaptureFileWriter;
pub use pump::{pump_stream, PumpStats};
pub use tail::{read_tail, DEFAULT_TAIL_BYTES};
pub use types::{CapturePaths, StreamType};
