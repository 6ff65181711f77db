//! git-annex external special remote backed by rclone.
//!
//! git-annex talks to the remote over stdin/stdout using the line-oriented
//! special remote protocol. Each data request is mapped to an rclone
//! location under the configured layout, carried out by an rclone
//! subprocess, and answered with a success, failure or unknown verdict.
//!
//! ```text
//! git-annex --request--> server --dirhash/config--> annex
//!                          |
//!                          +--> location --> rclone --> verdict --> response
//! ```

pub mod annex;
pub mod config;
pub mod error;
pub mod location;
pub mod protocol;
pub mod rclone;
pub mod server;
pub mod verdict;

pub use config::{Layout, RcloneSettings, RemoteConfig};
pub use error::{RemoteError, Result};
pub use rclone::{Rclone, Transfer, TransferOutcome};
pub use server::{run_remote, Session};
