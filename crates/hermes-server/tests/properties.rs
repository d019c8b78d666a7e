//! Property tests for routing and response emission.

use bytes::Bytes;
use hermes_core::{ErrorCode, Reply, RpcContext, TwirpError};
use hermes_server::{Service, ServiceDefinition};
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use proptest::prelude::*;
use prost::Message;
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
struct Size {
    #[prost(int32, tag = "1")]
    inches: i32,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
struct Hat {
    #[prost(int32, tag = "1")]
    inches: i32,
}

fn service() -> Service {
    Service::builder(
        ServiceDefinition::new("example", "Haberdasher").rpc::<Size, Hat>("MakeHat", "make_hat"),
    )
    .handle("make_hat", |size: Size, _: &mut RpcContext| {
        Ok(Reply::output(Hat {
            inches: size.inches,
        }))
    })
    .build()
    .unwrap()
}

fn request(method: Method, path: &str, content_type: &str, body: Bytes) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .unwrap()
}

fn non_post_method() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::GET),
        Just(Method::PUT),
        Just(Method::DELETE),
        Just(Method::PATCH),
        Just(Method::HEAD),
        Just(Method::OPTIONS),
    ]
}

proptest! {
    #[test]
    fn non_post_is_always_bad_route(method in non_post_method()) {
        let response = service()
            .call(request(method, "/twirp/example.Haberdasher/MakeHat", "application/json", Bytes::from_static(b"{}")))
            .unwrap();

        prop_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err = TwirpError::from_json(response.body()).unwrap();
        prop_assert_eq!(err.code(), ErrorCode::BadRoute);
    }

    #[test]
    fn unrecognized_content_type_is_bad_route(content_type in "[a-z]{1,12}/[a-z+-]{1,16}") {
        prop_assume!(content_type != "application/json" && content_type != "application/protobuf");

        let response = service()
            .call(request(Method::POST, "/twirp/example.Haberdasher/MakeHat", &content_type, Bytes::new()))
            .unwrap();

        let err = TwirpError::from_json(response.body()).unwrap();
        prop_assert_eq!(err.code(), ErrorCode::BadRoute);
        prop_assert!(err.msg().starts_with("Unexpected Content-Type:"), "unexpected message: {}", err.msg());
    }

    #[test]
    fn wrong_service_segment_is_bad_route(service_name in "[A-Za-z]{1,10}\\.[A-Za-z]{1,10}") {
        prop_assume!(service_name != "example.Haberdasher");

        let path = format!("/twirp/{service_name}/MakeHat");
        let response = service()
            .call(request(Method::POST, &path, "application/json", Bytes::from_static(b"{}")))
            .unwrap();

        let err = TwirpError::from_json(response.body()).unwrap();
        prop_assert_eq!(
            err.msg(),
            "Invalid route. Expected format: POST {BaseURL}/example.Haberdasher/{Method}"
        );
    }

    #[test]
    fn protobuf_success_round_trips(inches in any::<i32>()) {
        let body = Bytes::from(Size { inches }.encode_to_vec());
        let response = service()
            .call(request(Method::POST, "/twirp/example.Haberdasher/MakeHat", "application/protobuf", body))
            .unwrap();

        prop_assert_eq!(response.status(), StatusCode::OK);
        let hat = Hat::decode(response.body().as_ref()).unwrap();
        prop_assert_eq!(hat.inches, inches);
    }

    #[test]
    fn json_success_round_trips(inches in any::<i32>()) {
        let body = Bytes::from(serde_json::to_vec(&Size { inches }).unwrap());
        let response = service()
            .call(request(Method::POST, "/twirp/example.Haberdasher/MakeHat", "application/json", body))
            .unwrap();

        prop_assert_eq!(response.status(), StatusCode::OK);
        let hat: Hat = serde_json::from_slice(response.body()).unwrap();
        prop_assert_eq!(hat.inches, inches);
    }
}
