//! Line framing for the special remote protocol.
//!
//! Every message is a single UTF-8 line. Writes are flushed immediately since
//! git-annex waits for each response before sending the next request.

use crate::error::Result;
use crate::protocol::message::{trim_line_end, Response};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum accepted line length (1MB) - keys and paths are far shorter
pub const MAX_LINE_LEN: usize = 1024 * 1024;

/// One line read off the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Decoded line, terminator stripped
    Text(String),
    /// Line bytes were not valid UTF-8
    NotUtf8,
    /// Line exceeded `MAX_LINE_LEN`; its bytes were discarded while reading
    TooLong(usize),
}

/// Read one line. Returns `None` at end of stream.
///
/// At most `MAX_LINE_LEN` bytes (plus terminator) are buffered; the rest of
/// an oversized line is skipped up to its newline.
pub async fn read_line<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<Option<Line>> {
    let mut buf: Vec<u8> = Vec::new();
    let mut total = 0usize;
    let mut overflow = false;

    loop {
        let (used, done) = {
            let available = r.fill_buf().await?;
            if available.is_empty() {
                break;
            }
            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };
            if !overflow {
                // +2 leaves room for "\r\n"
                if buf.len() + used > MAX_LINE_LEN + 2 {
                    overflow = true;
                    buf = Vec::new();
                } else {
                    buf.extend_from_slice(&available[..used]);
                }
            }
            (used, done)
        };
        r.consume(used);
        total += used;
        if done {
            break;
        }
    }

    if total == 0 {
        return Ok(None);
    }
    if overflow {
        return Ok(Some(Line::TooLong(total)));
    }
    Ok(Some(match String::from_utf8(buf) {
        Ok(text) => Line::Text(trim_line_end(&text).to_string()),
        Err(_) => Line::NotUtf8,
    }))
}

/// Write one message followed by `\n` and flush.
pub async fn write_message<W: AsyncWrite + Unpin>(w: &mut W, msg: &Response) -> Result<()> {
    let line = format!("{}\n", msg);
    w.write_all(line.as_bytes()).await?;
    w.flush().await?;
    Ok(())
}
