//! Shard daemon RPC protocol.
//!
//! Explicit request/response pairs, serializable for the frame transport
//! and passed as-is to in-process daemons. Application errors travel
//! in-band as [`ShardError`]; transport failures are a separate layer.

use serde::{Deserialize, Serialize};

use super::error::ShardError;
use super::git::RemoteOpts;

/// A request to a shard daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShardRequest {
    /// Create a repository: initialize an empty bare repository when
    /// `mirror_remote` is absent, otherwise mirror-clone from it using
    /// `opt` for authentication.
    Create {
        repo: String,
        mirror_remote: Option<String>,
        opt: Option<RemoteOpts>,
    },

    /// Remove a repository. Succeeds as a no-op when the repository does
    /// not exist on this shard.
    Remove { repo: String },

    /// Probe whether a repository exists (and is a repository) on this
    /// shard.
    Exists { repo: String },
}

impl ShardRequest {
    /// Method name, for logging and error context.
    pub fn method(&self) -> &'static str {
        match self {
            ShardRequest::Create { .. } => "Git.Create",
            ShardRequest::Remove { .. } => "Git.Remove",
            ShardRequest::Exists { .. } => "Git.Exists",
        }
    }

    /// The repository the request addresses.
    pub fn repo(&self) -> &str {
        match self {
            ShardRequest::Create { repo, .. }
            | ShardRequest::Remove { repo }
            | ShardRequest::Exists { repo } => repo,
        }
    }
}

/// A successful reply from a shard daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShardResponse {
    /// The repository was created.
    Created,
    /// Removal finished; `existed` reports whether the repository was
    /// present on this shard before the call.
    Removed { existed: bool },
    /// Existence probe result.
    Exists { exists: bool },
}

/// What a shard sends back: success or an in-band application error.
pub type ShardReply = Result<ShardResponse, ShardError>;
