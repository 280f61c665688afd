//! Bounded tail reads of capture files.

use cms_common::{ProcessError, ProcessResult};
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;

/// Cap applied to each capture file in API responses.
pub const DEFAULT_TAIL_BYTES: usize = 20_000;

/// Read at most the last `max_bytes` bytes of `path`.
///
/// A missing file yields an empty string: a server that never produced
/// output has no capture file yet. The tail is byte oriented and may start
/// in the middle of a multi-byte character; invalid sequences are replaced.
pub async fn read_tail(
    path: &Path,
    max_bytes: usize,
    cancel: &CancellationToken,
) -> ProcessResult<String> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ProcessError::cancelled(format!("read {}", path.display()))),
        result = read_tail_inner(path, max_bytes) => result,
    }
}

async fn read_tail_inner(path: &Path, max_bytes: usize) -> ProcessResult<String> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(e.into()),
    };

    let len = file.metadata().await?.len();
    let max = max_bytes as u64;
    if len > max {
        file.seek(SeekFrom::Start(len - max)).await?;
    }

    let mut buf = Vec::with_capacity(len.min(max) as usize);
    // The pump may append while we read; stop at the size we measured
    (&mut file).take(max).read_to_end(&mut buf).await?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
