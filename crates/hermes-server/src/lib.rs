//! # Hermes Server
//!
//! The Twirp dispatch engine of the Hermes RPC framework.
//!
//! This crate turns an `http::Request<Bytes>` into an `http::Response<Bytes>`
//! for one service:
//!
//! - [`ServiceDefinition`] / [`MethodTable`] - Declared rpcs and their message types
//! - [`Router`] - Method, content type and path validation, body decoding
//! - [`HandlerRegistry`] - Typed handlers behind method identifiers
//! - [`Hooks`] - before, on_success, on_error and exception_raised hooks
//! - [`Service`] - The frozen pipeline, plus [`Service::call_rpc`] for tests
//!
//! The transport is not part of this crate: any HTTP server can collect the
//! body and hand the request to [`Service::call`].
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use hermes_core::{Reply, RpcContext, TwirpError};
//! use hermes_server::{Service, ServiceDefinition};
//!
//! # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
//! # #[serde(default)]
//! # struct Size { #[prost(int32, tag = "1")] inches: i32 }
//! # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
//! # #[serde(default)]
//! # struct Hat { #[prost(int32, tag = "1")] inches: i32 }
//! let definition = ServiceDefinition::new("example", "Haberdasher")
//!     .rpc::<Size, Hat>("MakeHat", "make_hat");
//!
//! let service = Service::builder(definition)
//!     .handle("make_hat", |size: Size, _ctx: &mut RpcContext| {
//!         if size.inches <= 0 {
//!             return Ok(Reply::Error(TwirpError::invalid_argument("too small")));
//!         }
//!         Ok(Reply::output(Hat { inches: size.inches }))
//!     })
//!     .build()?;
//!
//! let request = http::Request::post("/twirp/example.Haberdasher/MakeHat")
//!     .header("content-type", "application/json")
//!     .body(Bytes::from_static(br#"{"inches": 12}"#))?;
//!
//! let response = service.call(request)?;
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.body().as_ref(), br#"{"inches":12}"#);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod definition;
mod error;
pub mod handler;
pub mod hooks;
mod method_table;
pub mod response;
mod router;
mod service;

#[cfg(test)]
mod test_support;

pub use definition::{RpcDefinition, ServiceDefinition};
pub use error::BuildError;
pub use handler::{ErasedHandler, HandlerOutcome, HandlerRegistry};
pub use hooks::{BeforeHook, ErrorHook, ExceptionHook, Hooks, SuccessHook};
pub use method_table::{AnyMessage, MessageDescriptor, MethodEntry, MethodTable};
pub use router::Router;
pub use service::{Service, ServiceBuilder};
