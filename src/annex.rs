//! The calling git-annex process, seen from the remote.
//!
//! git-annex answers synchronous sub-queries (config, dirhash) on the same
//! channel that carries requests. Since the session is strictly sequential,
//! a sub-query is a plain blocking round-trip: write the query, read the next
//! line, expect `VALUE`.

use crate::error::{RemoteError, Result};
use crate::protocol::{self, Line, Request, Response};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncWrite};

/// Which dirhash flavour to ask git-annex for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// `DIRHASH` - mixed case, two levels
    Mixed,
    /// `DIRHASH-LOWER` - lowercase, two levels
    Lower,
}

/// Queries the remote may issue to git-annex while handling a request.
#[async_trait]
pub trait Annex: Send {
    /// `GETCONFIG name`. Unset settings come back as an empty string.
    async fn get_config(&mut self, name: &str) -> Result<String>;

    /// `SETCONFIG name value`. git-annex sends no reply.
    async fn set_config(&mut self, name: &str, value: &str) -> Result<()>;

    /// `DIRHASH key` or `DIRHASH-LOWER key`.
    async fn dirhash(&mut self, key: &str, kind: HashKind) -> Result<String>;
}

/// Request/response channel to git-annex over a line stream.
pub struct AnnexChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> AnnexChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read the next request. `None` once git-annex closes the stream.
    ///
    /// Lines that cannot be decoded come back as `Request::Unsupported` so the
    /// session can answer them and keep going.
    pub async fn next_request(&mut self) -> Result<Option<Request>> {
        let request = match protocol::read_line(&mut self.reader).await? {
            None => return Ok(None),
            Some(Line::Text(line)) => Request::parse(&line),
            Some(Line::NotUtf8) => {
                tracing::warn!("ignoring request line that is not valid UTF-8");
                Request::Unsupported("<non-UTF-8 line>".to_string())
            }
            Some(Line::TooLong(len)) => {
                tracing::warn!(
                    "ignoring request line of {} bytes (max {})",
                    len,
                    protocol::MAX_LINE_LEN
                );
                Request::Unsupported("<oversized line>".to_string())
            }
        };
        Ok(Some(request))
    }

    pub async fn send(&mut self, msg: &Response) -> Result<()> {
        protocol::write_message(&mut self.writer, msg).await
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    async fn query(&mut self, msg: &Response) -> Result<String> {
        self.send(msg).await?;
        let line = protocol::read_line(&mut self.reader)
            .await?
            .ok_or_else(|| {
                RemoteError::Protocol(format!("stream closed while waiting for reply to {}", msg))
            })?;
        match line {
            Line::Text(line) => protocol::parse_value(&line).ok_or_else(|| {
                RemoteError::Protocol(format!("expected VALUE in reply to {}, got {:?}", msg, line))
            }),
            Line::NotUtf8 => Err(RemoteError::Protocol(format!(
                "reply to {} is not valid UTF-8",
                msg
            ))),
            Line::TooLong(len) => Err(RemoteError::Protocol(format!(
                "reply to {} is {} bytes long",
                msg, len
            ))),
        }
    }
}

#[async_trait]
impl<R, W> Annex for AnnexChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn get_config(&mut self, name: &str) -> Result<String> {
        self.query(&Response::GetConfig(name.to_string())).await
    }

    async fn set_config(&mut self, name: &str, value: &str) -> Result<()> {
        self.send(&Response::SetConfig {
            name: name.to_string(),
            value: value.to_string(),
        })
        .await
    }

    async fn dirhash(&mut self, key: &str, kind: HashKind) -> Result<String> {
        let msg = match kind {
            HashKind::Mixed => Response::DirHash(key.to_string()),
            HashKind::Lower => Response::DirHashLower(key.to_string()),
        };
        self.query(&msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    fn channel(input: &'static [u8]) -> AnnexChannel<BufReader<&'static [u8]>, Vec<u8>> {
        AnnexChannel::new(BufReader::new(input), Vec::new())
    }

    fn written(ch: AnnexChannel<BufReader<&'static [u8]>, Vec<u8>>) -> String {
        String::from_utf8(ch.into_inner().1).unwrap()
    }

    #[tokio::test]
    async fn test_get_config_roundtrip() {
        let mut ch = channel(b"VALUE myremote\nVALUE\n");
        assert_eq!(ch.get_config("target").await.unwrap(), "myremote");
        assert_eq!(ch.get_config("prefix").await.unwrap(), "");
        assert_eq!(written(ch), "GETCONFIG target\nGETCONFIG prefix\n");
    }

    #[tokio::test]
    async fn test_set_config_reads_nothing() {
        let mut ch = channel(b"PREPARE\n");
        ch.set_config("layout", "lower").await.unwrap();
        assert_eq!(ch.next_request().await.unwrap(), Some(Request::Prepare));
        assert_eq!(written(ch), "SETCONFIG layout lower\n");
    }

    #[tokio::test]
    async fn test_dirhash_kinds() {
        let mut ch = channel(b"VALUE f87/4d5/\nVALUE Xk/2Q/\n");
        assert_eq!(ch.dirhash("k1", HashKind::Lower).await.unwrap(), "f87/4d5/");
        assert_eq!(ch.dirhash("k1", HashKind::Mixed).await.unwrap(), "Xk/2Q/");
        assert_eq!(written(ch), "DIRHASH-LOWER k1\nDIRHASH k1\n");
    }

    #[tokio::test]
    async fn test_unexpected_reply_is_protocol_error() {
        let mut ch = channel(b"ERROR something broke\n");
        let err = ch.get_config("target").await.unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_undecodable_request_is_unsupported() {
        let mut ch = channel(b"CHECKPRESENT caf\xe9\nPREPARE\n");
        assert!(matches!(
            ch.next_request().await.unwrap(),
            Some(Request::Unsupported(_))
        ));
        assert_eq!(ch.next_request().await.unwrap(), Some(Request::Prepare));
    }

    #[tokio::test]
    async fn test_undecodable_reply_is_protocol_error() {
        let mut ch = channel(b"VALUE caf\xe9\n");
        let err = ch.get_config("prefix").await.unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_eof_during_query_is_protocol_error() {
        let mut ch = channel(b"");
        let err = ch.dirhash("k1", HashKind::Lower).await.unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }
}
