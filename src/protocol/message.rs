//! Message types for the git-annex external special remote protocol.
//!
//! Line-oriented, UTF-8, one message per line. Requests come from git-annex,
//! responses go back on stdout. Sub-queries (GETCONFIG, DIRHASH, ...) are
//! issued mid-request and answered with `VALUE`.

use std::fmt;

/// Protocol version announced before any request is read
pub const PROTOCOL_VERSION: u32 = 1;

// =============================================================================
// Tokenizer
// =============================================================================

/// Split a line into at most `n` fields on single spaces.
///
/// The last field keeps everything that remains, spaces included, so a file
/// path in trailing position survives intact.
pub fn split_fields(line: &str, n: usize) -> Vec<&str> {
    line.splitn(n, ' ').collect()
}

/// Strip the line terminator (`\n`, and a `\r` before it if present).
pub fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

// =============================================================================
// Transfer direction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Store,
    Retrieve,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Store => "STORE",
            Direction::Retrieve => "RETRIEVE",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "STORE" => Some(Direction::Store),
            "RETRIEVE" => Some(Direction::Retrieve),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Requests (git-annex -> remote)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    InitRemote,
    Prepare,
    Transfer {
        direction: Direction,
        key: String,
        file: String,
    },
    CheckPresent {
        key: String,
    },
    Remove {
        key: String,
    },
    /// Anything else, including known verbs with missing arguments
    Unsupported(String),
}

impl Request {
    /// Parse one request line. Never fails: unknown input maps to `Unsupported`.
    pub fn parse(line: &str) -> Self {
        let line = trim_line_end(line);
        let verb = line.split(' ').next().unwrap_or_default();

        match verb {
            "INITREMOTE" => Request::InitRemote,
            "PREPARE" => Request::Prepare,
            "TRANSFER" => match split_fields(line, 4).as_slice() {
                [_, direction, key, file] if !key.is_empty() => match Direction::parse(direction) {
                    Some(direction) => Request::Transfer {
                        direction,
                        key: key.to_string(),
                        file: file.to_string(),
                    },
                    None => Request::Unsupported(line.to_string()),
                },
                _ => Request::Unsupported(line.to_string()),
            },
            "CHECKPRESENT" => match split_fields(line, 2).as_slice() {
                [_, key] if !key.is_empty() => Request::CheckPresent {
                    key: key.to_string(),
                },
                _ => Request::Unsupported(line.to_string()),
            },
            "REMOVE" => match split_fields(line, 2).as_slice() {
                [_, key] if !key.is_empty() => Request::Remove {
                    key: key.to_string(),
                },
                _ => Request::Unsupported(line.to_string()),
            },
            _ => Request::Unsupported(line.to_string()),
        }
    }

    pub fn verb(&self) -> &str {
        match self {
            Request::InitRemote => "INITREMOTE",
            Request::Prepare => "PREPARE",
            Request::Transfer { .. } => "TRANSFER",
            Request::CheckPresent { .. } => "CHECKPRESENT",
            Request::Remove { .. } => "REMOVE",
            Request::Unsupported(line) => line.split(' ').next().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Responses and sub-queries (remote -> git-annex)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Version,
    InitRemoteSuccess,
    InitRemoteFailure(String),
    PrepareSuccess,
    PrepareFailure(String),
    TransferSuccess {
        direction: Direction,
        key: String,
    },
    TransferFailure {
        direction: Direction,
        key: String,
        message: Option<String>,
    },
    CheckPresentSuccess(String),
    CheckPresentFailure(String),
    CheckPresentUnknown {
        key: String,
        message: String,
    },
    RemoveSuccess(String),
    RemoveFailure(String),
    UnsupportedRequest,

    // Sub-queries
    GetConfig(String),
    SetConfig {
        name: String,
        value: String,
    },
    DirHash(String),
    DirHashLower(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Version => write!(f, "VERSION {}", PROTOCOL_VERSION),
            Response::InitRemoteSuccess => f.write_str("INITREMOTE-SUCCESS"),
            Response::InitRemoteFailure(msg) => write!(f, "INITREMOTE-FAILURE {}", msg),
            Response::PrepareSuccess => f.write_str("PREPARE-SUCCESS"),
            Response::PrepareFailure(msg) => write!(f, "PREPARE-FAILURE {}", msg),
            Response::TransferSuccess { direction, key } => {
                write!(f, "TRANSFER-SUCCESS {} {}", direction, key)
            }
            Response::TransferFailure {
                direction,
                key,
                message,
            } => match message {
                Some(msg) => write!(f, "TRANSFER-FAILURE {} {} {}", direction, key, msg),
                None => write!(f, "TRANSFER-FAILURE {} {}", direction, key),
            },
            Response::CheckPresentSuccess(key) => write!(f, "CHECKPRESENT-SUCCESS {}", key),
            Response::CheckPresentFailure(key) => write!(f, "CHECKPRESENT-FAILURE {}", key),
            Response::CheckPresentUnknown { key, message } => {
                write!(f, "CHECKPRESENT-UNKNOWN {} {}", key, message)
            }
            Response::RemoveSuccess(key) => write!(f, "REMOVE-SUCCESS {}", key),
            Response::RemoveFailure(key) => write!(f, "REMOVE-FAILURE {}", key),
            Response::UnsupportedRequest => f.write_str("UNSUPPORTED-REQUEST"),
            Response::GetConfig(name) => write!(f, "GETCONFIG {}", name),
            Response::SetConfig { name, value } => write!(f, "SETCONFIG {} {}", name, value),
            Response::DirHash(key) => write!(f, "DIRHASH {}", key),
            Response::DirHashLower(key) => write!(f, "DIRHASH-LOWER {}", key),
        }
    }
}

/// Parse a `VALUE` reply to a sub-query. `VALUE` with no argument is empty.
pub fn parse_value(line: &str) -> Option<String> {
    let line = trim_line_end(line);
    if line == "VALUE" {
        return Some(String::new());
    }
    line.strip_prefix("VALUE ").map(str::to_string)
}

// =============================================================================
// Tests
// =============================================================================
