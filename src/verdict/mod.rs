//! Maps raw rclone outcomes to protocol verdicts.
//!
//! Structured signals come first: exit codes and `--json` output. Matching on
//! rclone's human-readable text is confined to [`legacy`].

pub mod legacy;

use crate::error::Result;
use crate::rclone::{SizeReport, TransferOutcome, EXIT_DIR_NOT_FOUND, EXIT_FILE_NOT_FOUND};

/// Three-way answer a handler gives git-annex
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure(Option<String>),
    /// Neither success nor failure can be asserted (backend unreachable, ...)
    Unknown(String),
}

impl Verdict {
    fn failure(msg: impl Into<String>) -> Self {
        Verdict::Failure(Some(msg.into()))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Verdict::Success => None,
            Verdict::Failure(msg) => msg.as_deref(),
            Verdict::Unknown(msg) => Some(msg),
        }
    }
}

/// True when rclone's exit code alone says the path does not exist.
pub fn is_not_found_exit(code: i32) -> bool {
    code == EXIT_DIR_NOT_FOUND || code == EXIT_FILE_NOT_FOUND
}

/// CHECKPRESENT from `rclone size --json`.
///
/// An existing but empty container counts as absent. Anything that is not a
/// confirmed answer is `Unknown`, never `Failure`.
pub fn checkpresent(result: Result<TransferOutcome>) -> Verdict {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return Verdict::Unknown(format!("could not run rclone: {}", e)),
    };

    if outcome.success() {
        return match SizeReport::parse(&outcome.stdout) {
            Ok(report) if report.count >= 1 => Verdict::Success,
            Ok(_) => Verdict::Failure(None),
            Err(e) => Verdict::Unknown(format!("unreadable rclone size output: {}", e)),
        };
    }

    if is_not_found_exit(outcome.exit_code) {
        return Verdict::Failure(None);
    }

    Verdict::Unknown(format!(
        "rclone size exited with code {}, remote may be unreachable",
        outcome.exit_code
    ))
}

/// REMOVE from `rclone delete`. Deleting something already gone succeeds.
pub fn remove(result: Result<TransferOutcome>) -> Verdict {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return Verdict::failure(format!("could not run rclone: {}", e)),
    };

    if outcome.success() || is_not_found_exit(outcome.exit_code) {
        return Verdict::Success;
    }

    if legacy::mentions_not_found(&outcome.output()) {
        return Verdict::Success;
    }

    Verdict::failure(format!(
        "rclone delete exited with code {}",
        outcome.exit_code
    ))
}

/// Plain copy/mkdir: exit code 0 or bust.
pub fn copy(result: Result<TransferOutcome>) -> Verdict {
    match result {
        Ok(outcome) if outcome.success() => Verdict::Success,
        Ok(outcome) => Verdict::failure(format!(
            "rclone exited with code {}",
            outcome.exit_code
        )),
        Err(e) => Verdict::failure(format!("could not run rclone: {}", e)),
    }
}
