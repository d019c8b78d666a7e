//! # Hermes Core
//!
//! Core types for the Hermes RPC framework.
//!
//! This crate provides the foundational types shared by the dispatch engine
//! and its test tooling:
//!
//! - [`TwirpError`] / [`ErrorCode`] - The structured error model and its HTTP status table
//! - [`Failure`] - Unexpected failures (returned errors and caught panics)
//! - [`ContentType`] / [`RpcMessage`] - Content negotiation and message codecs
//! - [`RpcContext`] - Per-request dispatch context
//! - [`Reply`] - What a handler produces for one call

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod content;
mod context;
mod error;
mod failure;
mod reply;

pub use content::{CodecError, ContentType, RpcMessage};
pub use context::{RequestId, RpcContext, RpcMethod};
pub use error::{
    ErrorCode, TwirpError, TwirpResult, UnknownErrorCode, CAUSE_META, INVALID_ROUTE_META,
};
pub use failure::{panic_message, Failure};
pub use reply::Reply;
