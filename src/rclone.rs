//! rclone invocation.
//!
//! Runs rclone as a blocking subprocess per operation and hands back the raw
//! exit code and output. No interpretation happens here; see `verdict`.
//!
//! rclone's stdout is always piped and captured, never inherited: our own
//! stdout is the protocol channel.

use crate::config::RcloneSettings;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

/// rclone exit code: directory not found
pub const EXIT_DIR_NOT_FOUND: i32 = 3;
/// rclone exit code: file not found
pub const EXIT_FILE_NOT_FOUND: i32 = 4;

/// Exit code reported when rclone was killed by a signal
pub const EXIT_SIGNALED: i32 = -1;

/// Raw result of one rclone invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TransferOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, for diagnostics and text matching
    pub fn output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (_, true) => self.stdout.clone(),
            _ => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// `rclone size --json` output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SizeReport {
    pub count: u64,
    #[serde(default)]
    pub bytes: i64,
}

impl SizeReport {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json.trim())?)
    }
}

/// The operations the remote needs from a storage backend
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Create the root container (`rclone mkdir`)
    async fn mkdir(&self, dest: &str) -> Result<TransferOutcome>;

    /// Copy one file to an exact destination path (`rclone copyto`)
    async fn copy(&self, source: &str, dest: &str) -> Result<TransferOutcome>;

    /// Delete an object (`rclone delete --retries n`)
    async fn delete(&self, dest: &str, retries: u32) -> Result<TransferOutcome>;

    /// Count and size of the objects at `dest` (`rclone size --json`)
    async fn size(&self, dest: &str) -> Result<TransferOutcome>;
}

/// rclone subprocess backend
#[derive(Debug, Clone)]
pub struct Rclone {
    settings: RcloneSettings,
}

impl Rclone {
    pub fn new(settings: RcloneSettings) -> Self {
        Self { settings }
    }

    async fn run(&self, args: &[&str]) -> Result<TransferOutcome> {
        let mut cmd = Command::new(&self.settings.program);
        cmd.args(&self.settings.extra_args);
        cmd.args(args);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::debug!(
            "running {} {}",
            self.settings.program.display(),
            args.join(" ")
        );

        let output = cmd.output().await?;
        let outcome = TransferOutcome {
            exit_code: output.status.code().unwrap_or(EXIT_SIGNALED),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !outcome.stdout.is_empty() {
            tracing::debug!("rclone stdout: {}", outcome.stdout.trim_end());
        }
        if !outcome.stderr.is_empty() {
            tracing::debug!("rclone stderr: {}", outcome.stderr.trim_end());
        }
        tracing::debug!("rclone {} exited with {}", args[0], outcome.exit_code);

        Ok(outcome)
    }
}

#[async_trait]
impl Transfer for Rclone {
    async fn mkdir(&self, dest: &str) -> Result<TransferOutcome> {
        self.run(&["mkdir", dest]).await
    }

    async fn copy(&self, source: &str, dest: &str) -> Result<TransferOutcome> {
        self.run(&["copyto", source, dest]).await
    }

    async fn delete(&self, dest: &str, retries: u32) -> Result<TransferOutcome> {
        let retries = retries.to_string();
        self.run(&["delete", "--retries", &retries, dest]).await
    }

    async fn size(&self, dest: &str) -> Result<TransferOutcome> {
        self.run(&["size", "--json", dest]).await
    }
}
