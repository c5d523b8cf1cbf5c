//! Application-level shard errors.
//!
//! These cross the RPC boundary in-band, so they are serializable and keep
//! their kind: callers branch on `AlreadyExists`/`NotFound` to decide
//! whether a retry is safe, which a stringly-typed error would not allow.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error returned by a shard daemon for a lifecycle operation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShardError {
    /// The repository does not exist on the shard.
    #[error("repository {repo} not found")]
    NotFound { repo: String },

    /// Create was called for a repository that already exists. Callers
    /// must not blindly retry.
    #[error("repository {repo} already exists")]
    AlreadyExists { repo: String },

    /// The repository name cannot be used as a storage path component.
    #[error("invalid repository name: {repo}")]
    InvalidName { repo: String },

    /// The path for the repository exists but is not a git repository;
    /// the daemon refuses to delete it.
    #[error("not a repository: {repo}")]
    NotARepository { repo: String },

    /// A git storage command failed; the combined output is kept for
    /// operator diagnosis.
    #[error("{action} repository {repo} failed with output:\n{output}")]
    CommandFailed {
        action: String,
        repo: String,
        output: String,
    },

    /// Unexpected failure in the daemon itself.
    #[error("internal shard error: {message}")]
    Internal { message: String },
}
