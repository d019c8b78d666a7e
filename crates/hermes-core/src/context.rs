//! Dispatch context types.
//!
//! The [`RpcContext`] carries all per-request state through the dispatch
//! pipeline: it is created when a request arrives, filled in by the router,
//! handed to hooks and the handler, and discarded once the response has been
//! emitted.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::{Extensions, HeaderMap, Method, Request};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::ContentType;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one service sortable
/// by request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The resolved identity of an RPC method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMethod {
    /// Name of the RPC as it appears in the URL path (e.g. `MakeHat`).
    pub rpc_name: String,
    /// Identifier the handler is registered under (e.g. `make_hat`).
    pub method_id: String,
    /// Type name of the input message.
    pub input_type: &'static str,
    /// Type name of the output message.
    pub output_type: &'static str,
}

type AnyMessage = Box<dyn Any + Send + Sync>;

/// Per-request dispatch context.
///
/// Fields that only exist once routing succeeded (method, content type,
/// input) are `None` while an error response for a bad route is emitted.
///
/// # Example
///
/// ```
/// use hermes_core::RpcContext;
/// use http::Method;
///
/// let request = http::Request::builder()
///     .method(Method::POST)
///     .uri("/twirp/example.Haberdasher/MakeHat")
///     .body(())
///     .unwrap();
///
/// let ctx = RpcContext::from_request(&request);
/// assert_eq!(ctx.path(), "/twirp/example.Haberdasher/MakeHat");
/// assert!(ctx.method().is_none());
/// ```
pub struct RpcContext {
    request_id: RequestId,
    http_method: Method,
    path: String,
    request_headers: HeaderMap,
    method: Option<Arc<RpcMethod>>,
    content_type: Option<ContentType>,
    input: Option<AnyMessage>,
    output: Option<AnyMessage>,
    response_headers: HeaderMap,
    extensions: Extensions,
    started_at: Instant,
}

impl RpcContext {
    /// Creates a context for an inbound request.
    ///
    /// `path` keeps the query string, if any.
    #[must_use]
    pub fn new(http_method: Method, path: impl Into<String>, request_headers: HeaderMap) -> Self {
        Self {
            request_id: RequestId::new(),
            http_method,
            path: path.into(),
            request_headers,
            method: None,
            content_type: None,
            input: None,
            output: None,
            response_headers: HeaderMap::new(),
            extensions: Extensions::new(),
            started_at: Instant::now(),
        }
    }

    /// Creates a context from the method, URI and headers of `request`.
    #[must_use]
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let path = request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_string(), ToString::to_string);
        Self::new(request.method().clone(), path, request.headers().clone())
    }

    /// Creates an already-routed context, bypassing HTTP parsing.
    #[must_use]
    pub fn for_method(method: Arc<RpcMethod>, content_type: ContentType) -> Self {
        let path = format!("/{}", method.rpc_name);
        let mut ctx = Self::new(Method::POST, path, HeaderMap::new());
        ctx.method = Some(method);
        ctx.content_type = Some(content_type);
        ctx
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method of the request.
    #[must_use]
    pub const fn http_method(&self) -> &Method {
        &self.http_method
    }

    /// Returns the request path, including the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    /// Returns a request header value as a string.
    #[must_use]
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the resolved RPC method.
    #[must_use]
    pub fn method(&self) -> Option<&RpcMethod> {
        self.method.as_deref()
    }

    /// Returns the handler identifier of the resolved method.
    #[must_use]
    pub fn method_id(&self) -> Option<&str> {
        self.method().map(|m| m.method_id.as_str())
    }

    /// Returns the RPC name of the resolved method.
    #[must_use]
    pub fn rpc_name(&self) -> Option<&str> {
        self.method().map(|m| m.rpc_name.as_str())
    }

    /// Records the resolved method.
    pub fn set_method(&mut self, method: Arc<RpcMethod>) {
        self.method = Some(method);
    }

    /// Returns the negotiated content type.
    #[must_use]
    pub const fn content_type(&self) -> Option<ContentType> {
        self.content_type
    }

    /// Records the negotiated content type.
    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = Some(content_type);
    }

    /// Returns the decoded input, if it is an `I`.
    #[must_use]
    pub fn input<I: Any>(&self) -> Option<&I> {
        self.input.as_ref().and_then(|v| v.downcast_ref())
    }

    /// Stores the decoded input.
    pub fn set_input(&mut self, input: Box<dyn Any + Send + Sync>) {
        self.input = Some(input);
    }

    /// Returns the handler output, if it has been produced and is an `O`.
    #[must_use]
    pub fn output<O: Any>(&self) -> Option<&O> {
        self.output.as_ref().and_then(|v| v.downcast_ref())
    }

    /// Returns the handler output without a type check.
    #[must_use]
    pub fn output_any(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.output.as_deref()
    }

    /// Stores the handler output.
    pub fn set_output(&mut self, output: Box<dyn Any + Send + Sync>) {
        self.output = Some(output);
    }

    /// Returns the headers that will be merged into a success response.
    #[must_use]
    pub const fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Returns the response headers for modification.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    /// Returns the typed extension map.
    ///
    /// Before hooks use it to hand values (an authenticated user, a tenant)
    /// to handlers.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the typed extension map for modification.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Replaces the extension map.
    pub fn set_extensions(&mut self, extensions: Extensions) {
        self.extensions = extensions;
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl fmt::Debug for RpcContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcContext")
            .field("request_id", &self.request_id)
            .field("http_method", &self.http_method)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .field("has_input", &self.input.is_some())
            .field("has_output", &self.output.is_some())
            .field("response_headers", &self.response_headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderValue, AUTHORIZATION};

    fn make_hat() -> Arc<RpcMethod> {
        Arc::new(RpcMethod {
            rpc_name: "MakeHat".to_string(),
            method_id: "make_hat".to_string(),
            input_type: "Size",
            output_type: "Hat",
        })
    }

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_display() {
        let display = RequestId::new().to_string();
        assert_eq!(display.len(), 36, "UUID string should be 36 characters");
    }

    #[test]
    fn test_from_request_keeps_query() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("http://localhost/twirp/a.B/C?debug=1")
            .header(AUTHORIZATION, "Bearer abc")
            .body(())
            .unwrap();

        let ctx = RpcContext::from_request(&request);
        assert_eq!(ctx.path(), "/twirp/a.B/C?debug=1");
        assert_eq!(ctx.http_method(), &Method::POST);
        assert_eq!(ctx.request_header("authorization"), Some("Bearer abc"));
        assert!(ctx.content_type().is_none());
    }

    #[test]
    fn test_for_method() {
        let ctx = RpcContext::for_method(make_hat(), ContentType::Protobuf);
        assert_eq!(ctx.rpc_name(), Some("MakeHat"));
        assert_eq!(ctx.method_id(), Some("make_hat"));
        assert_eq!(ctx.content_type(), Some(ContentType::Protobuf));
        assert!(ctx.response_headers().is_empty());
    }

    #[test]
    fn test_typed_input_and_output() {
        let mut ctx = RpcContext::for_method(make_hat(), ContentType::Json);
        ctx.set_input(Box::new(12_i32));
        ctx.set_output(Box::new("fedora".to_string()));

        assert_eq!(ctx.input::<i32>(), Some(&12));
        assert_eq!(ctx.input::<u64>(), None);
        assert_eq!(ctx.output::<String>().map(String::as_str), Some("fedora"));
        assert!(ctx.output_any().is_some());
    }

    #[test]
    fn test_response_headers_and_extensions() {
        let mut ctx = RpcContext::for_method(make_hat(), ContentType::Json);
        ctx.response_headers_mut()
            .insert("x-hat-count", HeaderValue::from_static("3"));
        ctx.extensions_mut().insert(42_u32);

        assert_eq!(ctx.response_headers()["x-hat-count"], "3");
        assert_eq!(ctx.extensions().get::<u32>(), Some(&42));
    }

    #[test]
    fn test_debug_hides_payloads() {
        let mut ctx = RpcContext::for_method(make_hat(), ContentType::Json);
        ctx.set_input(Box::new(1_u8));
        let debug = format!("{ctx:?}");
        assert!(debug.contains("has_input: true"));
        assert!(debug.contains("MakeHat"));
    }
}
