//! Request routing.
//!
//! The [`Router`] validates an inbound request against the Twirp routing
//! rules and fills in the dispatch context. Every rejection is a `bad_route`
//! error carrying `twirp_invalid_route` metadata with the HTTP method and the
//! request path.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. The HTTP method is `POST`
//! 2. The `Content-Type` is one of the accepted types
//! 3. The path ends in `/{full_name}/{Method}`
//! 4. `{Method}` is a declared rpc
//! 5. The body decodes into the rpc's input type

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request};

use hermes_core::content::VALID_CONTENT_TYPES;
use hermes_core::{ContentType, RpcContext, TwirpError, INVALID_ROUTE_META};

use crate::method_table::MethodTable;

/// Resolves requests to rpcs of one service.
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<MethodTable>,
}

impl Router {
    /// Creates a router over a method table.
    #[must_use]
    pub fn new(table: Arc<MethodTable>) -> Self {
        Self { table }
    }

    /// Returns the method table.
    #[must_use]
    pub fn table(&self) -> &MethodTable {
        &self.table
    }

    /// Routes `request`, recording the rpc, content type and decoded input
    /// in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a `bad_route` error describing the first failed check.
    pub fn route(&self, request: &Request<Bytes>, ctx: &mut RpcContext) -> Result<(), TwirpError> {
        let invalid_route = format!("{} {}", request.method(), ctx.path());
        let bad_route =
            |msg: String| TwirpError::bad_route(msg).with_meta(INVALID_ROUTE_META, &invalid_route);

        if request.method() != Method::POST {
            return Err(bad_route("HTTP request method must be POST".to_string()));
        }

        let header = request
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();
        let Some(content_type) = ContentType::from_header(&header) else {
            return Err(bad_route(format!(
                "Unexpected Content-Type: {header:?}. Content-Type header must be one of {:?}",
                VALID_CONTENT_TYPES
            )));
        };

        // Trailing empty segments are dropped, so `/Method/` routes like `/Method`.
        let mut segments: Vec<&str> = request.uri().path().split('/').collect();
        while segments.last() == Some(&"") {
            segments.pop();
        }
        let len = segments.len();
        if len < 3 || segments[len - 2] != self.table.full_name() {
            return Err(bad_route(format!(
                "Invalid route. Expected format: POST {{BaseURL}}/{}/{{Method}}",
                self.table.full_name()
            )));
        }

        let rpc_name = segments[len - 1];
        let Some(entry) = self.table.lookup(rpc_name) else {
            return Err(bad_route(format!("Invalid rpc method {rpc_name:?}")));
        };

        let input = entry
            .input()
            .decode(request.body(), content_type)
            .map_err(|e| {
                bad_route(format!(
                    "Invalid request body for rpc method {rpc_name:?} with Content-Type={content_type}: {}",
                    e.to_string().trim()
                ))
            })?;

        ctx.set_method(entry.method());
        ctx.set_content_type(content_type);
        ctx.set_input(input);
        ctx.response_headers_mut().clear();
        Ok(())
    }
}
