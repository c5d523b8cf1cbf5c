//! Generic accept loop for frame services.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, warn};

use super::frame;

/// Serve a one-request-per-connection frame service: accept, read one
/// request frame, hand it to `handler`, write the response frame, close.
/// Each connection is handled on its own task.
pub async fn serve<Req, Resp, H, Fut>(listener: TcpListener, handler: H) -> std::io::Result<()>
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + Sync + 'static,
    H: Fn(Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Resp> + Send,
{
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let handler = handler.clone();
        tokio::spawn(async move {
            debug!(%peer, "connection accepted");
            match frame::read_frame::<_, Req>(&mut stream).await {
                Ok(request) => {
                    let response = handler(request).await;
                    if let Err(e) = frame::write_frame(&mut stream, &response).await {
                        warn!(%peer, error = %e, "failed to write response frame");
                    }
                }
                Err(e) => warn!(%peer, error = %e, "failed to read request frame"),
            }
        });
    }
}
