//! Line echo over a byte stream.
//!
//! A session reads up to each `\n`, writes those exact bytes back and
//! repeats until the peer closes. Bytes left over after the last newline
//! when the peer closes are dropped, never echoed.

use std::fmt;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// Totals for a session that ended with the peer closing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub lines: u64,
    pub bytes: u64,
    /// Unterminated bytes received just before end of stream.
    pub discarded: usize,
}

#[derive(Debug)]
pub enum SessionError {
    Read(io::Error),
    Write(io::Error),
    /// A line grew past the configured cap before its newline arrived.
    LineTooLong { limit: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Read(e) => write!(f, "read failed: {e}"),
            SessionError::Write(e) => write!(f, "write failed: {e}"),
            SessionError::LineTooLong { limit } => {
                write!(f, "line exceeds {limit} bytes without a newline")
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Read(e) | SessionError::Write(e) => Some(e),
            SessionError::LineTooLong { .. } => None,
        }
    }
}

enum LineRead {
    Line,
    /// End of stream; carries how many unterminated bytes were pending.
    Eof(usize),
}

/// Echoes newline-terminated lines until the peer closes.
///
/// `max_line` caps how many bytes a single line may hold, newline
/// included; `None` leaves lines unbounded.
pub async fn echo_lines<S>(
    stream: S,
    peer: &str,
    max_line: Option<usize>,
) -> Result<SessionSummary, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut summary = SessionSummary::default();

    loop {
        line.clear();
        match read_line(&mut reader, &mut line, max_line).await? {
            LineRead::Eof(pending) => {
                summary.discarded = pending;
                return Ok(summary);
            }
            LineRead::Line => {}
        }

        writer.write_all(&line).await.map_err(SessionError::Write)?;
        writer.flush().await.map_err(SessionError::Write)?;

        summary.lines += 1;
        summary.bytes += line.len() as u64;
        info!(source_ip = peer, bytes = line.len(), "Echoed data to TCP client");
    }
}

/// Appends bytes up to and including the next `\n` to `line`.
async fn read_line<R>(
    reader: &mut R,
    line: &mut Vec<u8>,
    max_line: Option<usize>,
) -> Result<LineRead, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await.map_err(SessionError::Read)?;
        if available.is_empty() {
            return Ok(LineRead::Eof(line.len()));
        }

        let (done, used) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (true, i + 1),
            None => (false, available.len()),
        };

        if let Some(limit) = max_line {
            if line.len() + used > limit {
                return Err(SessionError::LineTooLong { limit });
            }
        }

        line.extend_from_slice(&available[..used]);
        reader.consume(used);

        if done {
            return Ok(LineRead::Line);
        }
    }
}
