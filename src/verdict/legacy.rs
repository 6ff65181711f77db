//! Text matching on rclone's human-readable output.
//!
//! Older rclone releases and some backends report a missing object only in
//! log text, without a dedicated exit code. Kept apart from the exit-code
//! checks so it can be dropped once those are universal.

use regex::Regex;
use std::sync::OnceLock;

fn not_found_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(directory|object|file) not found\b").expect("valid not-found pattern")
    })
}

/// True if the output says the directory or object does not exist.
pub fn mentions_not_found(output: &str) -> bool {
    not_found_pattern().is_match(output)
}
