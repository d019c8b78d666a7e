//! Response construction.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};

use hermes_core::content::JSON;
use hermes_core::{ContentType, TwirpError};

/// Builds a success response.
///
/// `headers` are copied first; `Content-Type` is then set to the negotiated
/// type, replacing any value a handler or hook stored.
pub fn success(body: Bytes, content_type: ContentType, headers: &HeaderMap) -> Response<Bytes> {
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    *response.headers_mut() = headers.clone();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
    response
}

/// Builds an error response: the code's status and a JSON body.
pub fn error(err: &TwirpError) -> Response<Bytes> {
    let mut response = Response::new(err.to_json());
    *response.status_mut() = err.status_code();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CACHE_CONTROL;

    #[test]
    fn test_success_merges_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = success(Bytes::from_static(b"\x08\x01"), ContentType::Protobuf, &headers);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/protobuf");
        assert_eq!(response.headers().get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn test_error_is_json() {
        let response = error(&TwirpError::not_found("no such hat"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            response.body(),
            &Bytes::from_static(br#"{"code":"not_found","msg":"no such hat"}"#)
        );
    }
}
