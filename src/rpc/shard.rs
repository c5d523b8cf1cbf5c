//! Shard daemon RPC over the frame transport.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;

use crate::gitserver::{ShardDaemon, ShardReply, ShardRequest};
use crate::sharding::rpc::{ShardConn, TransportError};
use crate::sharding::ShardAddr;

use super::client::FrameClient;
use super::server;

/// A shard reached over the network.
#[derive(Debug, Clone)]
pub struct RemoteShardConn {
    addr: ShardAddr,
    client: FrameClient,
}

impl RemoteShardConn {
    pub fn new(addr: ShardAddr) -> Self {
        let client = FrameClient::new(addr.as_str());
        Self { addr, client }
    }
}

#[async_trait]
impl ShardConn for RemoteShardConn {
    async fn call(&self, request: ShardRequest) -> Result<ShardReply, TransportError> {
        self.client
            .call::<ShardRequest, ShardReply>(&request)
            .await
            .map_err(|e| TransportError::Connection {
                addr: self.addr.clone(),
                message: e.to_string(),
            })
    }
}

/// Serve a shard daemon over the given listener.
pub async fn serve_shard(listener: TcpListener, daemon: Arc<ShardDaemon>) -> std::io::Result<()> {
    server::serve(listener, move |request: ShardRequest| {
        let daemon = Arc::clone(&daemon);
        async move { daemon.handle(request).await }
    })
    .await
}
