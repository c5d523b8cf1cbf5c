//! Optional content encoding for transport bodies.
//!
//! When a request negotiated an encoding, the request body arrives
//! encoded and the response must be encoded the same way.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::error::GitTransportError;

/// Supported content encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
}

impl ContentEncoding {
    /// Parse an optional encoding token. Absent, empty, and `identity`
    /// all mean "no encoding"; unknown tokens are rejected.
    pub fn parse(token: Option<&str>) -> Result<Option<Self>, GitTransportError> {
        match token {
            None | Some("") | Some("identity") => Ok(None),
            Some("gzip") => Ok(Some(ContentEncoding::Gzip)),
            Some(other) => Err(GitTransportError::InvalidRequest {
                message: format!("unsupported content encoding: {other}"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
        }
    }
}

/// Decode a request body per the negotiated encoding.
pub fn decode_body(
    encoding: Option<ContentEncoding>,
    body: Vec<u8>,
) -> Result<Vec<u8>, GitTransportError> {
    match encoding {
        None => Ok(body),
        Some(ContentEncoding::Gzip) => {
            let mut decoded = Vec::new();
            GzDecoder::new(body.as_slice())
                .read_to_end(&mut decoded)
                .map_err(|e| GitTransportError::InvalidRequest {
                    message: format!("corrupt gzip body: {e}"),
                })?;
            Ok(decoded)
        }
    }
}

/// Encode a response body per the negotiated encoding.
pub fn encode_body(
    encoding: Option<ContentEncoding>,
    body: Vec<u8>,
) -> Result<Vec<u8>, GitTransportError> {
    match encoding {
        None => Ok(body),
        Some(ContentEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(&body)
                .and_then(|_| encoder.finish())
                .map_err(|e| GitTransportError::Internal {
                    message: format!("gzip encode failed: {e}"),
                })
        }
    }
}
