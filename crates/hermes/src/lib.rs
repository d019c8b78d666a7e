//! # Hermes
//!
//! **Twirp RPC over HTTP for the Themis Platform**
//!
//! Hermes turns one collected HTTP request into one HTTP response for a
//! declared protobuf service:
//!
//! - **Strict routing** - `POST {prefix}/{package.Service}/{Method}` only
//! - **Two encodings** - `application/json` and `application/protobuf`
//! - **Typed handlers** - plain functions from input message to [`Reply`](prelude::Reply)
//! - **Lifecycle hooks** - before, on_success, on_error and exception_raised
//! - **Twirp errors** - every failure becomes a JSON error body with a fixed status
//!
//! ## Quick Start
//!
//! ```rust
//! use hermes::prelude::*;
//!
//! # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
//! # #[serde(default)]
//! # struct Size { #[prost(int32, tag = "1")] inches: i32 }
//! # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
//! # #[serde(default)]
//! # struct Hat { #[prost(int32, tag = "1")] inches: i32 }
//! let config = ConfigLoader::new().with_production().load()?;
//!
//! let service = Service::builder(
//!     ServiceDefinition::new("example", "Haberdasher").rpc::<Size, Hat>("MakeHat", "make_hat"),
//! )
//! .with_settings(&config.service)
//! .handle("make_hat", |size: Size, _: &mut RpcContext| {
//!     Ok(Reply::output(Hat { inches: size.inches }))
//! })
//! .build()?;
//!
//! let request = http::Request::post("/twirp/example.Haberdasher/MakeHat")
//!     .header("content-type", "application/json")
//!     .body(bytes::Bytes::from_static(br#"{"inches":3}"#))?;
//!
//! assert_eq!(service.call(request)?.status(), 200);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → route → before hooks → handler → on_success → encode → Response
//!              ↘          ↘            ↘
//!               TwirpError → on_error → JSON error Response
//!
//! any panic or Err → exception_raised → 500 internal
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hermes_core as core;

// Re-export the dispatch engine
pub use hermes_server as server;

// Re-export configuration
pub use hermes_config as config;

// Re-export logging
pub use hermes_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hermes::prelude::*;
///
/// let err = TwirpError::not_found("no such hat");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
pub mod prelude {
    pub use hermes_core::{
        ContentType, ErrorCode, Failure, Reply, RequestId, RpcContext, RpcMessage, TwirpError,
        TwirpResult,
    };

    pub use hermes_server::{
        BuildError, Hooks, Service, ServiceBuilder, ServiceDefinition,
    };

    pub use hermes_config::{ConfigLoader, HermesConfig};

    pub use hermes_telemetry::{init_logging, LogConfig};
}
