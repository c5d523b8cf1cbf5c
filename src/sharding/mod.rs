//! Repository-to-shard placement and RPC dispatch.
//!
//! Placement is a pure function of the repository name and the configured
//! shard address list: a well-distributed 128-bit content hash reduced
//! modulo the shard count. The list is fixed at startup; changing it
//! rehashes everything (a documented limitation, there is no rebalancing).
//!
//! Dispatch is strictly call/await: a unicast [`rpc::ShardHandle::call`]
//! blocks the caller until the shard replies or the transport fails, and
//! [`ShardRouter::broadcast`] issues the same call concurrently to every
//! shard, tolerating partial failure.

pub mod router;
pub mod rpc;

pub use router::{shard_index, ShardAddr, ShardRouter};
pub use rpc::{BroadcastError, ShardConn, ShardFailure, ShardHandle, TransportError};

/// Upper bound on the shard list; placement math assumes the count fits
/// comfortably in a u64 reduction.
pub const MAX_SHARDS: usize = 1024;
