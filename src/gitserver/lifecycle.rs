//! Client-side repository lifecycle over the shard router.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::sharding::rpc::{BroadcastError, ShardFailure, TransportError};
use crate::sharding::{ShardAddr, ShardRouter};

use super::error::ShardError;
use super::git::RemoteOpts;
use super::protocol::{ShardRequest, ShardResponse};

/// A failed lifecycle call. Keeps the application/transport distinction:
/// `AlreadyExists` must short-circuit retries, while a transport failure
/// may be retried at the caller's discretion.
#[derive(Debug, Error)]
pub enum CallError {
    /// The shard returned an application error.
    #[error(transparent)]
    Shard(#[from] ShardError),

    /// The RPC transport failed before the shard could answer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Clone was requested without a remote.
    #[error("empty remote")]
    EmptyRemote,

    /// The shard answered with a reply that does not match the request.
    #[error("unexpected reply from shard {addr} for {method}")]
    UnexpectedReply {
        addr: ShardAddr,
        method: &'static str,
    },
}

impl CallError {
    /// Whether this is the already-exists application error.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, CallError::Shard(ShardError::AlreadyExists { .. }))
    }

    /// Whether this is a transport failure (retry may be safe).
    pub fn is_transport(&self) -> bool {
        matches!(self, CallError::Transport(_))
    }
}

/// Repository create/remove against the shard cluster.
pub struct RepoLifecycle {
    router: Arc<ShardRouter>,
}

impl RepoLifecycle {
    pub fn new(router: Arc<ShardRouter>) -> Self {
        Self { router }
    }

    /// Initialize an empty bare repository on the owning shard.
    pub async fn init(&self, repo: &str) -> Result<(), CallError> {
        self.create(repo, None, None).await
    }

    /// Mirror-clone `remote` into a new repository on the owning shard.
    pub async fn clone_mirror(
        &self,
        repo: &str,
        remote: &str,
        opt: Option<RemoteOpts>,
    ) -> Result<(), CallError> {
        if remote.is_empty() {
            return Err(CallError::EmptyRemote);
        }
        self.create(repo, Some(remote), opt).await
    }

    /// Create a repository: init-empty when `mirror_remote` is absent,
    /// mirror-clone otherwise. Probes the owning shard first so a second
    /// create fails `AlreadyExists` rather than looking like a transport
    /// problem.
    pub async fn create(
        &self,
        repo: &str,
        mirror_remote: Option<&str>,
        opt: Option<RemoteOpts>,
    ) -> Result<(), CallError> {
        let shard = self.router.shard_for(repo);
        debug!(repo, shard = %shard.addr(), "creating repository");

        let reply = shard
            .call(ShardRequest::Exists {
                repo: repo.to_string(),
            })
            .await?;
        match reply? {
            ShardResponse::Exists { exists: true } => {
                return Err(ShardError::AlreadyExists {
                    repo: repo.to_string(),
                }
                .into())
            }
            ShardResponse::Exists { exists: false } => {}
            _ => {
                return Err(CallError::UnexpectedReply {
                    addr: shard.addr().clone(),
                    method: "Git.Exists",
                })
            }
        }

        let reply = shard
            .call(ShardRequest::Create {
                repo: repo.to_string(),
                mirror_remote: mirror_remote.map(String::from),
                opt,
            })
            .await?;
        match reply? {
            ShardResponse::Created => Ok(()),
            _ => Err(CallError::UnexpectedReply {
                addr: shard.addr().clone(),
                method: "Git.Create",
            }),
        }
    }

    /// Remove a repository everywhere. A shard where it does not exist
    /// succeeds as a no-op, so the broadcast stays idempotent; the
    /// returned flag reports whether any shard actually had it.
    pub async fn remove(&self, repo: &str) -> Result<bool, BroadcastError> {
        let attempted = self.router.shard_count();
        let results = self
            .router
            .broadcast(ShardRequest::Remove {
                repo: repo.to_string(),
            })
            .await;

        let mut existed = false;
        let mut failures = Vec::new();
        for (addr, result) in results {
            match result {
                Ok(Ok(ShardResponse::Removed { existed: e })) => existed |= e,
                Ok(Ok(_)) => failures.push((
                    addr,
                    ShardFailure::Shard(ShardError::Internal {
                        message: "unexpected reply to Git.Remove".to_string(),
                    }),
                )),
                Ok(Err(shard_err)) => failures.push((addr, ShardFailure::Shard(shard_err))),
                Err(transport_err) => {
                    failures.push((addr, ShardFailure::Transport(transport_err)))
                }
            }
        }

        if failures.is_empty() {
            Ok(existed)
        } else {
            Err(BroadcastError {
                method: "Git.Remove",
                attempted,
                failures,
            })
        }
    }
}
