//! # Hermes Test
//!
//! Test utilities for Hermes services: requests go straight into
//! [`Service::call`](hermes_server::Service::call) without a network
//! connection or port binding.
//!
//! ## Key Features
//!
//! - **Route helper**: [`TestClient::rpc`] builds `/twirp/{service}/{rpc}` paths
//! - **Body helpers**: JSON and protobuf request bodies
//! - **Response assertions**: status, headers and Twirp error checks
//! - **Message decoding**: [`TestResponse::message`] follows the response Content-Type
//!
//! ## Example
//!
//! ```rust
//! use hermes_core::{ErrorCode, Reply, RpcContext, TwirpError};
//! use hermes_server::{Service, ServiceDefinition};
//! use hermes_test::TestClient;
//!
//! # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
//! # #[serde(default)]
//! # struct Size { #[prost(int32, tag = "1")] inches: i32 }
//! # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
//! # #[serde(default)]
//! # struct Hat { #[prost(int32, tag = "1")] inches: i32 }
//! let service = Service::builder(
//!     ServiceDefinition::new("example", "Haberdasher").rpc::<Size, Hat>("MakeHat", "make_hat"),
//! )
//! .handle("make_hat", |size: Size, _: &mut RpcContext| {
//!     if size.inches <= 0 {
//!         return Ok(Reply::Error(TwirpError::invalid_argument("inches must be positive")));
//!     }
//!     Ok(Reply::output(Hat { inches: size.inches }))
//! })
//! .build()?;
//!
//! let client = TestClient::new(service);
//!
//! let hat: Hat = client.rpc("MakeHat").protobuf(&Size { inches: 7 }).send()?.message()?;
//! assert_eq!(hat.inches, 7);
//!
//! let response = client.rpc("MakeHat").json(&serde_json::json!({"inches": 0})).send()?;
//! response.assert_twirp_error(ErrorCode::InvalidArgument);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, DEFAULT_PREFIX};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
