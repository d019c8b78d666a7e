//! Test response wrapper.

use bytes::Bytes;
use hermes_core::content::{self, ContentType};
use hermes_core::{ErrorCode, RpcMessage, TwirpError};
use http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A response from a service under test, with helpers for assertions.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Wraps a response returned by `Service::call`.
    pub fn from_http(response: Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is 200.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decodes the success body as `M`, using the response Content-Type to
    /// pick the codec.
    pub fn message<M: RpcMessage>(&self) -> Result<M, TestError> {
        let content_type = self
            .content_type()
            .and_then(ContentType::from_header)
            .ok_or_else(|| TestError::ContentType(self.content_type().map(str::to_string)))?;
        Ok(content::decode(&self.body, content_type)?)
    }

    /// Parses the body as a Twirp error.
    pub fn twirp_error(&self) -> Result<TwirpError, TestError> {
        Ok(TwirpError::from_json(&self.body)?)
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {} with body {:?}",
            expected, self.status, self.body
        );
        self
    }

    /// Asserts a 200 response.
    ///
    /// # Panics
    ///
    /// Panics if the status is not 200.
    pub fn assert_success(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));
        assert_eq!(
            actual, expected,
            "Header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }

    /// Asserts that the Content-Type header equals `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type is missing or differs.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        self.assert_header(header::CONTENT_TYPE.as_str(), expected)
    }

    /// Asserts a Twirp error response with the given code, returning the
    /// parsed error for further checks.
    ///
    /// # Panics
    ///
    /// Panics if the body is not a Twirp error, or its code or status differ.
    pub fn assert_twirp_error(&self, code: ErrorCode) -> TwirpError {
        let error = self
            .twirp_error()
            .unwrap_or_else(|e| panic!("Expected a Twirp error body, got {:?}: {e}", self.body));
        assert_eq!(error.code(), code, "Twirp error code mismatch: {error:?}");
        assert_eq!(
            self.status,
            code.http_status(),
            "Status does not match Twirp code {}",
            code.as_str()
        );
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: StatusCode, content_type: &str, body: &'static [u8]) -> TestResponse {
        TestResponse::from_http(
            Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, content_type)
                .body(Bytes::from_static(body))
                .unwrap(),
        )
    }

    #[test]
    fn test_accessors() {
        let response = response(StatusCode::OK, "application/json", b"{\"inches\":3}");

        assert!(response.is_success());
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.text().unwrap(), "{\"inches\":3}");

        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["inches"], 3);
    }

    #[test]
    fn test_twirp_error() {
        let body = TwirpError::not_found("no hat").to_json();
        let response = TestResponse::from_http(
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
        );

        let error = response.assert_twirp_error(ErrorCode::NotFound);
        assert_eq!(error.msg(), "no hat");
    }

    #[test]
    #[should_panic(expected = "Expected status")]
    fn test_assert_status_panics() {
        response(StatusCode::BAD_REQUEST, "application/json", b"{}").assert_status(StatusCode::OK);
    }

    #[test]
    fn test_message_without_content_type() {
        let response = TestResponse::from_http(Response::new(Bytes::new()));
        let result = response.message::<()>();
        assert!(matches!(result, Err(TestError::ContentType(None))));
    }
}
