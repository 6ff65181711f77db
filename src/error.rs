//! Error types for the special remote.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RemoteError>;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Missing or malformed remote setting (prefix, target, layout)
    #[error("configuration error: {0}")]
    Config(String),

    /// Copy, move or missing-source failure during TRANSFER
    #[error("transfer error: {0}")]
    Transfer(String),

    /// Unexpected or malformed line from git-annex
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
