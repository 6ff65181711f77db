//! Special remote session - runs when git-annex launches
//! `git-annex-remote-rclone`.
//!
//! Announces the protocol version, then answers one request at a time until
//! git-annex closes stdin. A failing request gets its failure response; it
//! never ends the session.

use crate::annex::AnnexChannel;
use crate::config::RemoteConfig;
use crate::error::{RemoteError, Result};
use crate::location::{object_path, resolve};
use crate::protocol::{Direction, Request, Response};
use crate::rclone::Transfer;
use crate::verdict::{self, Verdict};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, BufReader};

/// Retries passed to `rclone delete`
pub const DELETE_RETRIES: u32 = 1;

/// Prefix of the per-RETRIEVE scratch directory
const RETRIEVE_TMP_PREFIX: &str = ".rclone-retrieve-";

/// Run a full session over `reader`/`writer` until end of input.
pub async fn run_remote<R, W, T>(reader: R, writer: W, transfer: T) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    T: Transfer,
{
    Session::new(BufReader::new(reader), writer, transfer)
        .run()
        .await
}

/// One git-annex <-> remote conversation
pub struct Session<R, W, T> {
    annex: AnnexChannel<R, W>,
    transfer: T,
    config: Option<RemoteConfig>,
}

impl<R, W, T> Session<R, W, T>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    T: Transfer,
{
    pub fn new(reader: R, writer: W, transfer: T) -> Self {
        Self {
            annex: AnnexChannel::new(reader, writer),
            transfer,
            config: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        self.annex.send(&Response::Version).await?;

        while let Some(request) = self.annex.next_request().await? {
            tracing::debug!("request: {:?}", request);
            let response = self.handle(request).await;
            self.annex.send(&response).await?;
        }

        tracing::debug!("git-annex closed the session");
        Ok(())
    }

    /// Handle one request to completion, sub-queries included.
    pub async fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::InitRemote => self.init_remote().await,
            Request::Prepare => self.prepare().await,
            Request::Transfer {
                direction: Direction::Store,
                key,
                file,
            } => {
                let verdict = failure_on_err(self.store(&key, &file).await);
                transfer_response(Direction::Store, key, verdict)
            }
            Request::Transfer {
                direction: Direction::Retrieve,
                key,
                file,
            } => {
                let verdict = failure_on_err(self.retrieve(&key, &file).await);
                transfer_response(Direction::Retrieve, key, verdict)
            }
            Request::CheckPresent { key } => {
                let verdict = match self.check_present(&key).await {
                    Ok(verdict) => verdict,
                    Err(e) => Verdict::Unknown(e.to_string()),
                };
                match verdict {
                    Verdict::Success => Response::CheckPresentSuccess(key),
                    Verdict::Failure(_) => Response::CheckPresentFailure(key),
                    Verdict::Unknown(message) => {
                        tracing::warn!("presence of {} unknown: {}", key, message);
                        Response::CheckPresentUnknown { key, message }
                    }
                }
            }
            Request::Remove { key } => match failure_on_err(self.remove(&key).await) {
                Verdict::Success => Response::RemoveSuccess(key),
                failed => {
                    tracing::warn!(
                        "remove of {} failed: {}",
                        key,
                        failed.message().unwrap_or("unknown error")
                    );
                    Response::RemoveFailure(key)
                }
            },
            unsupported @ Request::Unsupported(_) => {
                tracing::debug!("unsupported request: {}", unsupported.verb());
                Response::UnsupportedRequest
            }
        }
    }

    async fn init_remote(&mut self) -> Response {
        let config = match RemoteConfig::initialize(&mut self.annex).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("INITREMOTE rejected: {}", e);
                return Response::InitRemoteFailure(e.to_string());
            }
        };

        let root = config.root();
        match verdict::copy(self.transfer.mkdir(&root).await) {
            Verdict::Success => {
                tracing::info!("initialized remote at {}", root);
                self.config = Some(config);
                Response::InitRemoteSuccess
            }
            failed => {
                tracing::warn!("INITREMOTE could not create {}: {:?}", root, failed);
                Response::InitRemoteFailure(format!(
                    "could not create {} ({}); check that the rclone remote {:?} is configured and its credentials are valid",
                    root,
                    failed.message().unwrap_or("unknown error"),
                    config.target
                ))
            }
        }
    }

    async fn prepare(&mut self) -> Response {
        match RemoteConfig::load(&mut self.annex).await {
            Ok(config) => {
                tracing::debug!("prepared: {:?}", config);
                self.config = Some(config);
                Response::PrepareSuccess
            }
            Err(e) => {
                tracing::warn!("PREPARE failed: {}", e);
                Response::PrepareFailure(e.to_string())
            }
        }
    }

    async fn store(&mut self, key: &str, file: &str) -> Result<Verdict> {
        let config = self.config.as_ref().ok_or_else(not_prepared)?;

        if fs::metadata(file).await.is_err() {
            return Err(RemoteError::Transfer(format!(
                "source file {} does not exist",
                file
            )));
        }

        let location = resolve(&mut self.annex, key, config).await?;
        let dest = object_path(&location, key);
        tracing::debug!("storing {} to {}", file, dest);
        Ok(verdict::copy(self.transfer.copy(file, &dest).await))
    }

    async fn retrieve(&mut self, key: &str, file: &str) -> Result<Verdict> {
        let config = self.config.as_ref().ok_or_else(not_prepared)?;
        let location = resolve(&mut self.annex, key, config).await?;

        let dest = Path::new(file);
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        // Next to the destination so the final rename stays on one filesystem
        let tmp = tempfile::Builder::new()
            .prefix(RETRIEVE_TMP_PREFIX)
            .tempdir_in(parent)?;

        let source = object_path(&location, key);
        let staged = tmp.path().join(key);
        tracing::debug!("retrieving {} via {}", source, staged.display());

        let copied = verdict::copy(
            self.transfer
                .copy(&source, &staged.to_string_lossy())
                .await,
        );
        if copied != Verdict::Success {
            return Ok(copied);
        }

        let moved = fs::rename(&staged, dest).await;
        if let Err(e) = moved {
            return Err(RemoteError::Transfer(format!(
                "could not move {} into place: {}",
                key, e
            )));
        }

        tmp.close()?;
        Ok(Verdict::Success)
    }

    async fn check_present(&mut self, key: &str) -> Result<Verdict> {
        let config = self.config.as_ref().ok_or_else(not_prepared)?;
        let location = resolve(&mut self.annex, key, config).await?;
        Ok(verdict::checkpresent(
            self.transfer.size(&object_path(&location, key)).await,
        ))
    }

    async fn remove(&mut self, key: &str) -> Result<Verdict> {
        let config = self.config.as_ref().ok_or_else(not_prepared)?;
        let location = resolve(&mut self.annex, key, config).await?;
        Ok(verdict::remove(
            self.transfer
                .delete(&object_path(&location, key), DELETE_RETRIES)
                .await,
        ))
    }
}

fn not_prepared() -> RemoteError {
    RemoteError::Config("remote is not prepared".to_string())
}

fn failure_on_err(result: Result<Verdict>) -> Verdict {
    result.unwrap_or_else(|e| Verdict::Failure(Some(e.to_string())))
}

fn transfer_response(direction: Direction, key: String, verdict: Verdict) -> Response {
    match verdict {
        Verdict::Success => Response::TransferSuccess { direction, key },
        Verdict::Failure(message) => {
            tracing::warn!("{} of {} failed: {:?}", direction, key, message);
            Response::TransferFailure {
                direction,
                key,
                message: match direction {
                    Direction::Store => message,
                    Direction::Retrieve => None,
                },
            }
        }
        Verdict::Unknown(message) => {
            tracing::warn!("{} of {} failed: {}", direction, key, message);
            Response::TransferFailure {
                direction,
                key,
                message: None,
            }
        }
    }
}
