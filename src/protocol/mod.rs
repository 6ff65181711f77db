//! git-annex external special remote protocol (version 1).
//!
//! Requests arrive one per line on stdin; responses and sub-queries leave one
//! per line on stdout. Nothing else may be written to stdout.

pub mod codec;
pub mod message;

pub use codec::{read_line, write_message, Line, MAX_LINE_LEN};
pub use message::{
    parse_value, split_fields, trim_line_end, Direction, Request, Response, PROTOCOL_VERSION,
};
