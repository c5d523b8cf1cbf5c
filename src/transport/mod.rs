//! The git smart-transport service.
//!
//! Three verbs, no cross-request state: `info_refs` advertises refs for a
//! requested service, `upload_pack` runs fetch negotiation, and
//! `receive_pack` executes a push — gated by the write access check
//! before storage is touched, with the resulting push events
//! deduplicated and fanned out to registered post-push hooks.
//!
//! Request and response bodies may be gzip-encoded; when an encoding is
//! negotiated it is honored symmetrically.

mod encoding;
mod error;
mod events;
mod handle;
pub mod pktline;
mod service;

pub use encoding::ContentEncoding;
pub use error::GitTransportError;
pub use events::{collapse_duplicate_events, PushEvent, PushEventKind};
pub use handle::{CliRepoTransport, DiskRepoResolver, GitService, RepoStorageResolver, RepoTransport};
pub use service::{GitTransportService, PostPushHook, ReceivePackOp, RECEIVE_PACK_OPERATION};
