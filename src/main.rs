use anyhow::{Context, Result};
use annex_rclone::{run_remote, Rclone, RcloneSettings};
use tracing_subscriber::EnvFilter;

/// Log filter, e.g. `GIT_ANNEX_REMOTE_RCLONE_LOG=debug`
const LOG_ENV: &str = "GIT_ANNEX_REMOTE_RCLONE_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout belongs to git-annex; logs go to stderr
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();

    let settings = RcloneSettings::from_env();
    tracing::debug!("using rclone at {}", settings.program.display());

    run_remote(tokio::io::stdin(), tokio::io::stdout(), Rclone::new(settings))
        .await
        .context("special remote session failed")?;

    Ok(())
}
