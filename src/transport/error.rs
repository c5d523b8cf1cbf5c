//! Transport-service errors.

use thiserror::Error;

use crate::auth::AccessError;

/// What a smart-transport verb can fail with.
#[derive(Debug, Error)]
pub enum GitTransportError {
    /// The access gate denied the operation.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// No repository with that name is stored here.
    #[error("repository {repo} not found")]
    NotFound { repo: String },

    /// The client sent something the protocol layer cannot use (bad
    /// pkt-line framing, unsupported content encoding, corrupt gzip).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The underlying git service command failed.
    #[error("git {service} failed:\n{output}")]
    ServiceFailed { service: String, output: String },

    /// Unexpected failure in the transport itself.
    #[error("internal transport error: {message}")]
    Internal { message: String },
}
