//! Error types for Hermes.
//!
//! This module provides [`TwirpError`], the structured error value that every
//! failed RPC is reported as, and [`ErrorCode`], the closed taxonomy of error
//! codes defined by the Twirp wire protocol.
//!
//! # Code to HTTP status mapping
//!
//! | `ErrorCode` | HTTP status |
//! |---|---|
//! | `Canceled` | 408 |
//! | `Unknown` | 500 |
//! | `InvalidArgument` | 400 |
//! | `Malformed` | 400 |
//! | `DeadlineExceeded` | 408 |
//! | `NotFound` | 404 |
//! | `BadRoute` | 400 |
//! | `AlreadyExists` | 409 |
//! | `PermissionDenied` | 403 |
//! | `Unauthenticated` | 401 |
//! | `ResourceExhausted` | 429 |
//! | `FailedPrecondition` | 412 |
//! | `Aborted` | 409 |
//! | `OutOfRange` | 400 |
//! | `Unimplemented` | 501 |
//! | `Internal` | 500 |
//! | `Unavailable` | 503 |
//! | `Dataloss` | 500 |
//!
//! Error bodies are always serialized as JSON, regardless of the content
//! type negotiated for the request:
//!
//! ```json
//! {"code": "not_found", "msg": "hat not found", "meta": {"size": "12"}}
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::failure::Failure;

/// Result type alias using [`TwirpError`].
pub type TwirpResult<T> = Result<T, TwirpError>;

/// Metadata key attached to every `bad_route` error produced by the router.
pub const INVALID_ROUTE_META: &str = "twirp_invalid_route";

/// Metadata key naming the kind of unexpected failure wrapped by
/// [`TwirpError::internal_with`].
pub const CAUSE_META: &str = "cause";

/// Twirp error codes.
///
/// Serialized with the `snake_case` names used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The operation was cancelled.
    Canceled,
    /// An unknown error occurred.
    Unknown,
    /// The client specified an invalid argument.
    InvalidArgument,
    /// The client sent a message which could not be decoded.
    Malformed,
    /// The operation expired before completion.
    DeadlineExceeded,
    /// Some requested entity was not found.
    NotFound,
    /// The requested URL path wasn't routable to an RPC method.
    BadRoute,
    /// An attempt to create an entity failed because one already exists.
    AlreadyExists,
    /// The caller does not have permission to execute the operation.
    PermissionDenied,
    /// The request does not have valid authentication credentials.
    Unauthenticated,
    /// Some resource has been exhausted.
    ResourceExhausted,
    /// The system is not in a state required for the operation.
    FailedPrecondition,
    /// The operation was aborted, typically due to a concurrency issue.
    Aborted,
    /// The operation was attempted past the valid range.
    OutOfRange,
    /// The operation is not implemented or not supported.
    Unimplemented,
    /// An invariant expected by the underlying system has been broken.
    Internal,
    /// The service is currently unavailable.
    Unavailable,
    /// Unrecoverable data loss or corruption.
    Dataloss,
}

impl ErrorCode {
    /// Every error code, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::Canceled,
        Self::Unknown,
        Self::InvalidArgument,
        Self::Malformed,
        Self::DeadlineExceeded,
        Self::NotFound,
        Self::BadRoute,
        Self::AlreadyExists,
        Self::PermissionDenied,
        Self::Unauthenticated,
        Self::ResourceExhausted,
        Self::FailedPrecondition,
        Self::Aborted,
        Self::OutOfRange,
        Self::Unimplemented,
        Self::Internal,
        Self::Unavailable,
        Self::Dataloss,
    ];

    /// Returns the HTTP status code responses carrying this code use.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Canceled | Self::DeadlineExceeded => StatusCode::REQUEST_TIMEOUT,
            Self::Unknown | Self::Internal | Self::Dataloss => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidArgument | Self::Malformed | Self::BadRoute | Self::OutOfRange => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::Aborted => StatusCode::CONFLICT,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            Self::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
            Self::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the wire name of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
            Self::InvalidArgument => "invalid_argument",
            Self::Malformed => "malformed",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::NotFound => "not_found",
            Self::BadRoute => "bad_route",
            Self::AlreadyExists => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::Unauthenticated => "unauthenticated",
            Self::ResourceExhausted => "resource_exhausted",
            Self::FailedPrecondition => "failed_precondition",
            Self::Aborted => "aborted",
            Self::OutOfRange => "out_of_range",
            Self::Unimplemented => "unimplemented",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
            Self::Dataloss => "dataloss",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown error code name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown twirp error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}

/// Structured RPC error.
///
/// `TwirpError` is an immutable value carrying a [`ErrorCode`], a
/// human-readable message, and ordered string metadata. Handlers and hooks
/// return it to report expected failures; the pipeline serializes it as the
/// JSON error body.
///
/// # Example
///
/// ```
/// use hermes_core::{ErrorCode, TwirpError};
///
/// let err = TwirpError::invalid_argument("size must be positive")
///     .with_meta("argument", "inches");
///
/// assert_eq!(err.code(), ErrorCode::InvalidArgument);
/// assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
/// assert_eq!(err.meta_value("argument"), Some("inches"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("twirp error {code}: {msg}")]
pub struct TwirpError {
    code: ErrorCode,
    msg: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    meta: IndexMap<String, String>,
}

impl TwirpError {
    /// Creates an error with the given code and message.
    #[must_use]
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            meta: IndexMap::new(),
        }
    }

    /// Creates a `canceled` error.
    #[must_use]
    pub fn canceled(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Canceled, msg)
    }

    /// Creates an `unknown` error.
    #[must_use]
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, msg)
    }

    /// Creates an `invalid_argument` error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, msg)
    }

    /// Creates a `malformed` error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Malformed, msg)
    }

    /// Creates a `deadline_exceeded` error.
    #[must_use]
    pub fn deadline_exceeded(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeadlineExceeded, msg)
    }

    /// Creates a `not_found` error.
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    /// Creates a `bad_route` error.
    #[must_use]
    pub fn bad_route(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRoute, msg)
    }

    /// Creates an `already_exists` error.
    #[must_use]
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, msg)
    }

    /// Creates a `permission_denied` error.
    #[must_use]
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, msg)
    }

    /// Creates an `unauthenticated` error.
    #[must_use]
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, msg)
    }

    /// Creates a `resource_exhausted` error.
    #[must_use]
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceExhausted, msg)
    }

    /// Creates a `failed_precondition` error.
    #[must_use]
    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FailedPrecondition, msg)
    }

    /// Creates an `aborted` error.
    #[must_use]
    pub fn aborted(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Aborted, msg)
    }

    /// Creates an `out_of_range` error.
    #[must_use]
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::OutOfRange, msg)
    }

    /// Creates an `unimplemented` error.
    #[must_use]
    pub fn unimplemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unimplemented, msg)
    }

    /// Creates an `internal` error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Creates an `unavailable` error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, msg)
    }

    /// Creates a `dataloss` error.
    #[must_use]
    pub fn dataloss(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Dataloss, msg)
    }

    /// Wraps an unexpected failure into an `internal` error.
    ///
    /// The message is the failure's description and the `cause` metadata
    /// records whether it was a returned error or a panic.
    #[must_use]
    pub fn internal_with(failure: &Failure) -> Self {
        Self::internal(failure.to_string()).with_meta(CAUSE_META, failure.kind())
    }

    /// Returns a copy of this error with an additional metadata entry.
    ///
    /// Setting an existing key replaces its value in place.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the error message.
    #[must_use]
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// Returns all metadata entries in insertion order.
    #[must_use]
    pub const fn meta(&self) -> &IndexMap<String, String> {
        &self.meta
    }

    /// Returns one metadata value.
    #[must_use]
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Serializes the error as the JSON wire body.
    #[must_use]
    pub fn to_json(&self) -> Bytes {
        // Only strings and a unit enum: serialization cannot fail.
        serde_json::to_vec(self).map_or_else(|_| Bytes::new(), Bytes::from)
    }

    /// Parses a JSON error body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_route_error() {
        let error = TwirpError::bad_route("HTTP request method must be POST");
        assert_eq!(error.code(), ErrorCode::BadRoute);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("must be POST"));
    }

    #[test]
    fn test_status_table() {
        let expected = [
            (ErrorCode::Canceled, 408),
            (ErrorCode::Unknown, 500),
            (ErrorCode::InvalidArgument, 400),
            (ErrorCode::Malformed, 400),
            (ErrorCode::DeadlineExceeded, 408),
            (ErrorCode::NotFound, 404),
            (ErrorCode::BadRoute, 400),
            (ErrorCode::AlreadyExists, 409),
            (ErrorCode::PermissionDenied, 403),
            (ErrorCode::Unauthenticated, 401),
            (ErrorCode::ResourceExhausted, 429),
            (ErrorCode::FailedPrecondition, 412),
            (ErrorCode::Aborted, 409),
            (ErrorCode::OutOfRange, 400),
            (ErrorCode::Unimplemented, 501),
            (ErrorCode::Internal, 500),
            (ErrorCode::Unavailable, 503),
            (ErrorCode::Dataloss, 500),
        ];

        assert_eq!(expected.len(), ErrorCode::ALL.len());
        for (code, status) in expected {
            assert_eq!(code.http_status().as_u16(), status, "status for {code}");
        }
    }

    #[test]
    fn test_all_codes_map_to_error_statuses() {
        for code in ErrorCode::ALL {
            let status = code.http_status();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "code {code} should map to an error status, got {status}"
            );
        }
    }

    #[test]
    fn test_code_names_round_trip_through_from_str() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
        }
        assert!("teapot".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        let json = serde_json::to_string(&ErrorCode::PermissionDenied).unwrap();
        assert_eq!(json, "\"permission_denied\"");
    }

    #[test]
    fn test_json_body_shape() {
        let error = TwirpError::not_found("hat not found")
            .with_meta("size", "12")
            .with_meta("color", "red");

        let value: serde_json::Value = serde_json::from_slice(&error.to_json()).unwrap();
        assert_eq!(value["code"], "not_found");
        assert_eq!(value["msg"], "hat not found");
        assert_eq!(value["meta"]["size"], "12");

        let keys: Vec<_> = value["meta"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["size".to_string(), "color".to_string()]);
    }

    #[test]
    fn test_empty_meta_is_omitted() {
        let body = TwirpError::internal("boom").to_json();
        let text = std::str::from_utf8(&body).unwrap();
        assert_eq!(text, r#"{"code":"internal","msg":"boom"}"#);
    }

    #[test]
    fn test_from_json_without_meta() {
        let error = TwirpError::from_json(br#"{"code":"unimplemented","msg":"nope"}"#).unwrap();
        assert_eq!(error.code(), ErrorCode::Unimplemented);
        assert!(error.meta().is_empty());
    }

    #[test]
    fn test_with_meta_replaces_existing_key() {
        let error = TwirpError::aborted("retry")
            .with_meta("attempt", "1")
            .with_meta("attempt", "2");
        assert_eq!(error.meta().len(), 1);
        assert_eq!(error.meta_value("attempt"), Some("2"));
    }

    #[test]
    fn test_internal_with_failure() {
        let failure = Failure::from(anyhow::anyhow!("database offline"));
        let error = TwirpError::internal_with(&failure);

        assert_eq!(error.code(), ErrorCode::Internal);
        assert_eq!(error.msg(), "database offline");
        assert_eq!(error.meta_value(CAUSE_META), Some("error"));
    }
}
