//! Stream pumps: child output → capture file.

use crate::output::CaptureFileWriter;
use crate::types::StreamType;
use cms_common::ProcessResult;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

/// Counters reported when a pump finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub lines: u64,
    pub bytes: u64,
}

/// Copy `stream` into the capture file at `path` until the stream closes.
///
/// Output is copied line by line as raw bytes, so non-UTF-8 server output
/// survives untouched. A final unterminated line is written as-is.
///
/// Not cancellable: the read end stays open for as long as the child holds
/// the write end.
pub async fn pump_stream(
    stream: impl AsyncRead + Unpin,
    path: &Path,
    process_name: &str,
    stream_type: StreamType,
) -> ProcessResult<PumpStats> {
    let mut writer = CaptureFileWriter::open(path, process_name).await?;
    let mut reader = BufReader::new(stream);
    let mut stats = PumpStats::default();
    let mut line = Vec::with_capacity(256);

    debug!(process = %process_name, stream = %stream_type, path = %path.display(), "Pump started");

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).await?;
        if read == 0 {
            break;
        }

        writer.write_all(&line).await?;
        stats.lines += 1;
        stats.bytes += read as u64;
    }

    debug!(
        process = %process_name,
        stream = %stream_type,
        lines = stats.lines,
        bytes = stats.bytes,
        "Pump finished"
    );
    Ok(stats)
}
