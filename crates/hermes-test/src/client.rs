//! Test client for in-memory Twirp calls.

use std::sync::Arc;

use bytes::Bytes;
use hermes_core::RpcMessage;
use hermes_server::Service;
use http::Method;
use serde::Serialize;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Default path prefix of Twirp routes.
pub const DEFAULT_PREFIX: &str = "/twirp";

/// A client that sends requests straight into a [`Service`], without a
/// network connection.
///
/// # Example
///
/// ```ignore
/// use hermes_test::TestClient;
///
/// let client = TestClient::new(service);
///
/// let response = client
///     .rpc("MakeHat")
///     .json(&serde_json::json!({"inches": 12}))
///     .send()
///     .unwrap();
///
/// response.assert_success();
/// let hat: Hat = response.message().unwrap();
/// ```
#[must_use]
#[derive(Clone)]
pub struct TestClient {
    service: Arc<Service>,
    prefix: String,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `service`.
    pub fn new(service: Service) -> Self {
        Self::from_shared(Arc::new(service))
    }

    /// Creates a client for a shared service.
    pub fn from_shared(service: Arc<Service>) -> Self {
        Self {
            service,
            prefix: DEFAULT_PREFIX.to_string(),
            default_headers: Vec::new(),
        }
    }

    /// Sets the path prefix used by [`rpc`](Self::rpc).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the service under test.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the route of `rpc_name` on this service.
    #[must_use]
    pub fn route(&self, rpc_name: &str) -> String {
        format!("{}/{}/{}", self.prefix, self.service.full_name(), rpc_name)
    }

    /// Creates a POST request to the route of `rpc_name`.
    pub fn rpc(&self, rpc_name: &str) -> TestClientRequest<'_> {
        let uri = self.route(rpc_name);
        self.post(uri)
    }

    /// Creates a POST request to an arbitrary path.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::post(uri))
    }

    /// Creates a request with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    fn send_internal(&self, builder: TestRequestBuilder) -> Result<TestResponse, TestError> {
        let request = builder.build()?;
        let response = self.service.call(request)?;
        Ok(TestResponse::from_http(response))
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let mut builder = builder;
        for (name, value) in &client.default_headers {
            builder = builder.header(name, value);
        }
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Removes a header from the request.
    pub fn without_header(mut self, name: impl AsRef<str>) -> Self {
        self.builder = self.builder.without_header(name);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the request body as a protobuf message.
    pub fn protobuf<M: RpcMessage>(mut self, message: &M) -> Self {
        self.builder = self.builder.protobuf(message);
        self
    }

    /// Sends the request through the service.
    ///
    /// Returns `Err` for an invalid request, or for an error returned by a
    /// service built in raise mode. A panic in raise mode unwinds through.
    pub fn send(self) -> Result<TestResponse, TestError> {
        self.client.send_internal(self.builder)
    }
}
