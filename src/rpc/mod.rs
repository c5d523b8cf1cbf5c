//! Frame transport between nodes.
//!
//! The wire format is deliberately dumb: one length-prefixed postcard
//! frame per request, one per response, one request per connection.
//! Everything above this layer depends only on the call/await contract,
//! so the frame format can change without touching the control plane.

pub mod client;
pub mod frame;
pub mod root;
pub mod server;
pub mod shard;

pub use client::FrameClient;
pub use frame::{FrameError, MAX_FRAME_SIZE};
pub use root::{serve_root, RootClient, RootError, RootRequest, RootResponse, RpcErrorKind};
pub use shard::{serve_shard, RemoteShardConn};
