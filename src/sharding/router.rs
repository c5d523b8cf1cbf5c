//! Deterministic shard placement and the router over shard handles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gitserver::{ShardReply, ShardRequest};

use super::rpc::{ShardHandle, TransportError};
use super::MAX_SHARDS;

/// Network address of one shard daemon. Opaque to the router; the
/// transport layer decides what it means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardAddr(pub String);

impl ShardAddr {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ShardAddr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Map a repository name to a shard index.
///
/// Pure and stable: the same name and shard count always produce the same
/// index. The name is content-hashed (128-bit, well distributed) and the
/// first 8 bytes are reduced modulo the shard count.
///
/// # Panics
///
/// Panics if `shard_count` is 0 or exceeds [`MAX_SHARDS`].
pub fn shard_index(repo: &str, shard_count: usize) -> usize {
    assert!(shard_count > 0, "shard_count must be > 0");
    assert!(shard_count <= MAX_SHARDS, "shard_count exceeds MAX_SHARDS");

    let digest = blake3::hash(repo.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_be_bytes(prefix) % shard_count as u64) as usize
}

/// Routes lifecycle calls to the owning shard, or to all shards.
pub struct ShardRouter {
    shards: Vec<ShardHandle>,
}

impl ShardRouter {
    /// Build a router over the given shard handles.
    ///
    /// # Panics
    ///
    /// Panics if `shards` is empty or exceeds [`MAX_SHARDS`].
    pub fn new(shards: Vec<ShardHandle>) -> Self {
        assert!(!shards.is_empty(), "at least one shard is required");
        assert!(shards.len() <= MAX_SHARDS, "too many shards");
        Self { shards }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The handle of the shard owning `repo`.
    pub fn shard_for(&self, repo: &str) -> &ShardHandle {
        &self.shards[shard_index(repo, self.shards.len())]
    }

    /// Issue the same call concurrently to every shard and collect every
    /// result. A failing shard never aborts the calls to the others; the
    /// caller decides what a partial failure means.
    pub async fn broadcast(
        &self,
        request: ShardRequest,
    ) -> Vec<(ShardAddr, Result<ShardReply, TransportError>)> {
        let mut tasks = Vec::with_capacity(self.shards.len());
        for shard in &self.shards {
            let shard = shard.clone();
            let request = request.clone();
            let addr = shard.addr().clone();
            let task = tokio::spawn(async move { shard.call(request).await });
            tasks.push((addr, task));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (addr, task) in tasks {
            // A panicked call task surfaces as a join error; report it as
            // a dropped reply rather than poisoning the whole broadcast.
            let result = match task.await {
                Ok(result) => result,
                Err(_) => Err(TransportError::ReplyDropped { addr: addr.clone() }),
            };
            results.push((addr, result));
        }
        results
    }
}
