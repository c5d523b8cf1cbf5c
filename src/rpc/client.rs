//! One-shot frame client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;

use super::frame::{self, FrameError};

/// Bound on how long a connection attempt may hang before it is reported
/// as a transport failure.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A client for one peer address. Connections are per-call: connect,
/// write the request frame, read the response frame, done. Nothing is
/// cached between calls.
#[derive(Debug, Clone)]
pub struct FrameClient {
    addr: String,
}

impl FrameClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// The peer address this client talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send one request and await its response.
    pub async fn call<Req, Resp>(&self, request: &Req) -> Result<Resp, FrameError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let connect = TcpStream::connect(&self.addr);
        let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, connect)
            .await
            .map_err(|_| {
                FrameError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", self.addr),
                ))
            })??;
        frame::write_frame(&mut stream, request).await?;
        frame::read_frame(&mut stream).await
    }
}
