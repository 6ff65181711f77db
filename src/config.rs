//! Remote configuration: the persisted `prefix`, `target` and `layout`
//! settings, plus process-level rclone settings from the environment.

use crate::annex::Annex;
use crate::error::{RemoteError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const PREFIX_KEY: &str = "prefix";
pub const TARGET_KEY: &str = "target";
pub const LAYOUT_KEY: &str = "layout";

pub const DEFAULT_PREFIX: &str = "git-annex";

/// Environment variable naming the rclone executable
pub const RCLONE_BIN_ENV: &str = "GIT_ANNEX_REMOTE_RCLONE_BIN";
/// Environment variable with extra arguments for every rclone invocation
pub const RCLONE_ARGS_ENV: &str = "GIT_ANNEX_REMOTE_RCLONE_ARGS";

// =============================================================================
// Layout
// =============================================================================

/// How keys are sharded into directories on the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// `prefix/<dirhash-lower>`
    #[default]
    Lower,
    /// `prefix/<dirhash-lower><key>/`
    Directory,
    /// `prefix/`
    NoDir,
    /// `prefix/<dirhash>`
    Mixed,
    /// `prefix/<lowercase(dirhash)>`
    Frankencase,
}

impl Layout {
    pub const ALL: [Layout; 5] = [
        Layout::Lower,
        Layout::Directory,
        Layout::NoDir,
        Layout::Mixed,
        Layout::Frankencase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Lower => "lower",
            Layout::Directory => "directory",
            Layout::NoDir => "nodir",
            Layout::Mixed => "mixed",
            Layout::Frankencase => "frankencase",
        }
    }

    /// Parse a stored setting; empty means the default layout.
    pub fn from_setting(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Ok(Layout::default());
        }
        value.parse()
    }
}

impl FromStr for Layout {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self> {
        Layout::ALL
            .into_iter()
            .find(|layout| layout.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                RemoteError::Config(format!(
                    "invalid layout {:?}, expected one of: lower, directory, nodir, mixed, frankencase",
                    s
                ))
            })
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RemoteConfig
// =============================================================================

/// Fully resolved settings for one remote. Built once per session by
/// INITREMOTE or PREPARE and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub prefix: String,
    pub target: String,
    pub layout: Layout,
}

impl RemoteConfig {
    /// `target:prefix`, the root container every location lives under
    pub fn root(&self) -> String {
        format!("{}:{}", self.target, self.prefix)
    }

    /// Validate raw settings as entered by the user during INITREMOTE.
    pub fn validate(prefix: &str, target: &str, layout: &str) -> Result<Self> {
        let prefix = if prefix.is_empty() {
            DEFAULT_PREFIX
        } else {
            prefix
        };
        if prefix == "/" {
            return Err(RemoteError::Config(
                "storing objects directly in the root (/) is not supported".to_string(),
            ));
        }
        if target.is_empty() {
            return Err(RemoteError::Config(
                "target must be specified (the name of an rclone remote)".to_string(),
            ));
        }
        let layout = Layout::from_setting(layout)?;

        Ok(Self {
            prefix: prefix.to_string(),
            target: target.to_string(),
            layout,
        })
    }

    /// Read and validate settings from git-annex without persisting anything.
    pub async fn load(annex: &mut dyn Annex) -> Result<Self> {
        let prefix = annex.get_config(PREFIX_KEY).await?;
        let target = annex.get_config(TARGET_KEY).await?;
        let layout = annex.get_config(LAYOUT_KEY).await?;

        // Stored configs are already materialized; only layout is re-checked.
        let layout = Layout::from_setting(&layout)?;
        let prefix = if prefix.is_empty() {
            DEFAULT_PREFIX.to_string()
        } else {
            prefix
        };

        Ok(Self {
            prefix,
            target,
            layout,
        })
    }

    /// Read, validate and write back every setting, defaults included, so
    /// later PREPAREs see a fully materialized config.
    pub async fn initialize(annex: &mut dyn Annex) -> Result<Self> {
        let prefix = annex.get_config(PREFIX_KEY).await?;
        let target = annex.get_config(TARGET_KEY).await?;
        let layout = annex.get_config(LAYOUT_KEY).await?;

        let config = Self::validate(&prefix, &target, &layout)?;

        annex.set_config(PREFIX_KEY, &config.prefix).await?;
        annex.set_config(TARGET_KEY, &config.target).await?;
        annex
            .set_config(LAYOUT_KEY, config.layout.as_str())
            .await?;

        Ok(config)
    }
}

// =============================================================================
// RcloneSettings
// =============================================================================

/// How to invoke rclone. Read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcloneSettings {
    pub program: PathBuf,
    pub extra_args: Vec<String>,
}

impl Default for RcloneSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("rclone"),
            extra_args: Vec::new(),
        }
    }
}

impl RcloneSettings {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(RCLONE_BIN_ENV).ok(),
            std::env::var(RCLONE_ARGS_ENV).ok(),
        )
    }

    fn from_vars(program: Option<String>, args: Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(program) = program.filter(|p| !p.trim().is_empty()) {
            settings.program = PathBuf::from(program);
        }
        if let Some(args) = args {
            settings.extra_args = args.split_whitespace().map(str::to_string).collect();
        }
        settings
    }
}
