//! Alder: a sharded git hosting control plane.
//!
//! Alder coordinates a cluster of independent git-storage daemons
//! ("shards"). Repository placement is a pure function of the repository
//! name, lifecycle operations are dispatched to the owning shard (or
//! broadcast to all shards when ownership must be invalidated everywhere),
//! and the git smart-HTTP verbs are served against per-repository transport
//! handles with write access gated up front.
//!
//! # Architecture
//!
//! - [`sharding`]: deterministic repo-to-shard placement plus the unicast
//!   and broadcast RPC dispatch primitives.
//! - [`gitserver`]: the shard daemon (create/remove/exists against disk)
//!   and the client-side repository lifecycle built on the router.
//! - [`transport`]: the three smart-protocol verbs (info-refs,
//!   upload-pack, receive-pack), push-event post-processing, and post-push
//!   hook fan-out.
//! - [`auth`]: actor identity and the write/admin access decisions.
//! - [`federation`]: resolves a repository name to a local or remote
//!   authority and rebinds the request context accordingly.
//! - [`services`] / [`context`]: the request-scoped service set (local,
//!   remote, or mock) carried explicitly through call parameters.
//! - [`rpc`]: length-prefixed frame transport used between nodes.

pub mod auth;
pub mod config;
pub mod context;
pub mod federation;
pub mod gitserver;
pub mod rpc;
pub mod services;
pub mod sharding;
pub mod store;
pub mod transport;

pub use config::AppConfig;
pub use context::RequestContext;
