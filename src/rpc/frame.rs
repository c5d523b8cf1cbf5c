//! Length-prefixed postcard frames.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size (1 MB). Bounded to prevent memory exhaustion from a
/// misbehaving peer.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Frame transport error.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame of {size} bytes exceeds maximum {max}")]
    TooLarge { size: usize, max: usize },

    #[error("frame encode failed: {0}")]
    Encode(#[source] postcard::Error),

    #[error("frame decode failed: {0}")]
    Decode(#[source] postcard::Error),
}

/// Write one frame: a u32 big-endian length followed by the postcard
/// encoding of `msg`.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = postcard::to_stdvec(msg).map_err(FrameError::Encode)?;
    if bytes.len() > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge {
            size: bytes.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    writer.write_u32(bytes.len() as u32).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and decode it.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, FrameError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    postcard::from_bytes(&buf).map_err(FrameError::Decode)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        seq: u64,
        payload: String,
    }

    #[tokio::test]
    async fn frame_round_trip() {
        let msg = Ping {
            seq: 42,
            payload: "hello".to_string(),
        };
        let mut buf = Vec::new();
        write_frame(&mut buf, &msg).await.expect("write");

        let mut reader = buf.as_slice();
        let decoded: Ping = read_frame(&mut reader).await.expect("read");
        assert_eq!(decoded, msg);
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((MAX_FRAME_SIZE + 1) as u32).to_be_bytes());
        let mut reader = buf.as_slice();
        let result: Result<Ping, _> = read_frame(&mut reader).await;
        assert!(matches!(result, Err(FrameError::TooLarge { .. })));
    }
}
