//! Call envelopes and per-shard dispatchers.
//!
//! Every shard gets a dispatcher task fed by a bounded queue of call
//! envelopes; each envelope carries its own reply slot (a oneshot channel),
//! so replies cannot alias and the public contract stays call/await no
//! matter what transport sits behind the dispatcher.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::gitserver::{ShardError, ShardReply, ShardRequest};

use super::router::ShardAddr;

/// Bound on queued calls per shard before senders back-pressure.
pub const DISPATCH_QUEUE_CAPACITY: usize = 64;

/// A transport-layer failure reaching a shard. Always distinct from an
/// application error the shard returned in-band, so callers can decide
/// whether a retry is safe.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The shard's dispatch queue is gone; the dispatcher has shut down.
    #[error("shard {addr} unavailable: dispatcher stopped")]
    DispatcherStopped { addr: ShardAddr },

    /// The dispatcher dropped the reply slot without completing it.
    #[error("shard {addr} dropped the reply")]
    ReplyDropped { addr: ShardAddr },

    /// The connection to the shard failed.
    #[error("connection to shard {addr} failed: {message}")]
    Connection { addr: ShardAddr, message: String },
}

/// One queued call: the request plus its reply slot.
pub struct ShardCall {
    pub request: ShardRequest,
    pub reply: oneshot::Sender<Result<ShardReply, TransportError>>,
}

/// The connection a dispatcher drives: an in-process daemon or a remote
/// frame client.
#[async_trait]
pub trait ShardConn: Send + Sync {
    async fn call(&self, request: ShardRequest) -> Result<ShardReply, TransportError>;
}

/// Client handle for one shard: its address and the dispatcher queue.
#[derive(Clone)]
pub struct ShardHandle {
    addr: ShardAddr,
    tx: mpsc::Sender<ShardCall>,
}

impl ShardHandle {
    /// Spawn a dispatcher task for `conn` and return the handle feeding it.
    pub fn spawn(addr: ShardAddr, conn: Arc<dyn ShardConn>) -> Self {
        let (tx, mut rx) = mpsc::channel::<ShardCall>(DISPATCH_QUEUE_CAPACITY);
        let dispatcher_addr = addr.clone();
        tokio::spawn(async move {
            while let Some(call) = rx.recv().await {
                debug!(shard = %dispatcher_addr, method = call.request.method(), "dispatch");
                let result = conn.call(call.request).await;
                // The caller may have gone away; nothing to do then.
                let _ = call.reply.send(result);
            }
            debug!(shard = %dispatcher_addr, "dispatcher stopped");
        });
        Self { addr, tx }
    }

    /// This shard's address.
    pub fn addr(&self) -> &ShardAddr {
        &self.addr
    }

    /// Unicast a call and await the reply or a transport failure.
    pub async fn call(&self, request: ShardRequest) -> Result<ShardReply, TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ShardCall {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| TransportError::DispatcherStopped {
                addr: self.addr.clone(),
            })?;
        reply_rx.await.map_err(|_| TransportError::ReplyDropped {
            addr: self.addr.clone(),
        })?
    }
}

/// A per-shard failure inside a broadcast: either the transport failed or
/// the shard returned an application error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShardFailure {
    #[error(transparent)]
    Transport(TransportError),
    #[error(transparent)]
    Shard(ShardError),
}

/// Aggregate failure of a broadcast. Every shard was attempted; this
/// collects exactly the ones that failed.
#[derive(Debug)]
pub struct BroadcastError {
    /// Method that was broadcast.
    pub method: &'static str,
    /// Number of shards attempted.
    pub attempted: usize,
    /// The failing shards, with each one's failure.
    pub failures: Vec<(ShardAddr, ShardFailure)>,
}

impl fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "broadcast {} failed on {} of {} shards:",
            self.method,
            self.failures.len(),
            self.attempted
        )?;
        for (addr, failure) in &self.failures {
            write!(f, "\n  {addr}: {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BroadcastError {}
