//! Content negotiation.
//!
//! Hermes accepts exactly two request content types: `application/json` and
//! `application/protobuf`. The negotiated [`ContentType`] drives which codec
//! decodes the request body and encodes the success body. Error bodies are
//! always JSON.
//!
//! The codecs themselves are external: JSON goes through `serde_json`,
//! protobuf through `prost`.

use std::fmt;

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Media type of the JSON encoding.
pub const JSON: &str = "application/json";

/// Media type of the protobuf binary encoding.
pub const PROTOBUF: &str = "application/protobuf";

/// Every accepted `Content-Type` value.
pub const VALID_CONTENT_TYPES: [&str; 2] = [JSON, PROTOBUF];

/// Returns `true` if `value` is one of [`VALID_CONTENT_TYPES`].
///
/// The comparison is exact; parameters such as `; charset=utf-8` make the
/// value invalid.
#[must_use]
pub fn valid_content_type(value: &str) -> bool {
    ContentType::from_header(value).is_some()
}

/// A negotiated content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/protobuf`
    Protobuf,
}

impl ContentType {
    /// Parses a `Content-Type` header value.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            JSON => Some(Self::Json),
            PROTOBUF => Some(Self::Protobuf),
            _ => None,
        }
    }

    /// Returns the media type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => JSON,
            Self::Protobuf => PROTOBUF,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message type that can travel through the RPC pipeline.
///
/// Blanket-implemented for every `prost` message that is also
/// `serde`-serializable, which is what generated protocol types provide.
pub trait RpcMessage:
    prost::Message + Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> RpcMessage for T where
    T: prost::Message + Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Errors raised by the external codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON encoding or decoding failed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Protobuf decoding failed.
    #[error("{0}")]
    Protobuf(#[from] prost::DecodeError),
}

/// Decodes a message from `body` using the negotiated content type.
pub fn decode<M: RpcMessage>(body: &[u8], content_type: ContentType) -> Result<M, CodecError> {
    match content_type {
        ContentType::Json => Ok(serde_json::from_slice(body)?),
        ContentType::Protobuf => Ok(M::decode(body)?),
    }
}

/// Encodes a message using the negotiated content type.
pub fn encode<M: RpcMessage>(message: &M, content_type: ContentType) -> Result<Bytes, CodecError> {
    match content_type {
        ContentType::Json => Ok(Bytes::from(serde_json::to_vec(message)?)),
        ContentType::Protobuf => Ok(Bytes::from(message.encode_to_vec())),
    }
}
