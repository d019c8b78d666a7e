//! Test error types.

use hermes_core::{CodecError, Failure};
use thiserror::Error;

/// Errors that can occur while driving a service in tests.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The service raised an unexpected failure (raise mode only).
    #[error("Service failure: {0}")]
    Failure(#[from] Failure),

    /// Response body is not valid UTF-8.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body could not be decoded as the expected message.
    #[error("Decode error: {0}")]
    Decode(#[from] CodecError),

    /// The response carries no usable Content-Type.
    #[error("Unexpected Content-Type: {0:?}")]
    ContentType(Option<String>),
}
