//! Test request building.

use bytes::Bytes;
use hermes_core::content::{self, ContentType};
use hermes_core::RpcMessage;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request};
use serde::Serialize;

use crate::error::TestError;

/// Builder for a request sent to a service under test.
///
/// Building never panics: the first invalid header or body is remembered and
/// reported by [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Creates a POST request builder.
    pub fn post(uri: impl AsRef<str>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", name.as_ref())));
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", value.as_ref())));

        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) | (_, Err(e)) => self.fail(e),
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Removes a header, e.g. to send a request without Content-Type.
    pub fn without_header(mut self, name: impl AsRef<str>) -> Self {
        self.headers.remove(name.as_ref());
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the body as JSON and the Content-Type to `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.fail(e.into()),
        }
        self.content_type(content::JSON)
    }

    /// Sets the body as a protobuf-encoded message and the Content-Type to
    /// `application/protobuf`.
    pub fn protobuf<M: RpcMessage>(mut self, message: &M) -> Self {
        match content::encode(message, ContentType::Protobuf) {
            Ok(bytes) => self.body = bytes,
            Err(e) => self.fail(e.into()),
        }
        self.content_type(content::PROTOBUF)
    }

    /// Builds the HTTP request.
    pub fn build(self) -> Result<Request<Bytes>, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut request = Request::builder()
            .method(self.method)
            .uri(self.uri.as_str())
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(format!("{}: {e}", self.uri)))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }

    fn fail(&mut self, error: TestError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_post() {
        let request = TestRequestBuilder::post("/twirp/example.Haberdasher/MakeHat")
            .header("x-trace", "abc")
            .body("raw")
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().path(), "/twirp/example.Haberdasher/MakeHat");
        assert_eq!(request.headers()["x-trace"], "abc");
        assert_eq!(request.body().as_ref(), b"raw");
    }

    #[test]
    fn test_json_sets_content_type() {
        let request = TestRequestBuilder::post("/")
            .json(&serde_json::json!({"inches": 10}))
            .build()
            .unwrap();

        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.body().as_ref(), br#"{"inches":10}"#);
    }

    #[test]
    fn test_without_header() {
        let request = TestRequestBuilder::post("/")
            .content_type("application/json")
            .without_header("content-type")
            .build()
            .unwrap();

        assert!(request.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let result = TestRequestBuilder::post("/")
            .header("bad header", "x")
            .build();

        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_invalid_uri() {
        let result = TestRequestBuilder::post("http://[::1").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }
}
