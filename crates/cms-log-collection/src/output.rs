//! Output writers for capture files

use cms_common::{ProcessError, ProcessResult};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Append-only writer for one capture file.
///
/// Files are never truncated or rotated. Every write is flushed so that
/// concurrent tail readers see output as soon as the server produces it.
pub struct CaptureFileWriter {
    file: File,
    path: PathBuf,
    process_name: String,
}

impl CaptureFileWriter {
    /// Open (creating if needed) `path` in append mode.
    pub async fn open(path: impl Into<PathBuf>, process_name: &str) -> ProcessResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ProcessError::logging(
                    process_name,
                    format!("Failed to create log directory {}: {}", parent.display(), e),
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                ProcessError::logging(
                    process_name,
                    format!("Failed to open log file {}: {}", path.display(), e),
                )
            })?;

        Ok(Self {
            file,
            path,
            process_name: process_name.to_string(),
        })
    }

    /// Append raw bytes and flush.
    pub async fn write_all(&mut self, bytes: &[u8]) -> ProcessResult<()> {
        self.file.write_all(bytes).await.map_err(|e| {
            ProcessError::logging(
                &self.process_name,
                format!("Failed to write to log file {}: {}", self.path.display(), e),
            )
        })?;
        self.flush().await
    }

    pub async fn flush(&mut self) -> ProcessResult<()> {
        self.file.flush().await.map_err(|e| {
            ProcessError::logging(
                &self.process_name,
                format!("Failed to flush log file {}: {}", self.path.display(), e),
            )
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
