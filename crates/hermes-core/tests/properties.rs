//! Property tests for error codes, content types and panic payloads.

use std::any::Any;

use hermes_core::content::valid_content_type;
use hermes_core::{panic_message, ContentType, ErrorCode, Failure, TwirpError};
use proptest::prelude::*;

fn error_code() -> impl Strategy<Value = ErrorCode> {
    prop::sample::select(ErrorCode::ALL.to_vec())
}

proptest! {
    #[test]
    fn error_code_wire_name_parses_back(code in error_code()) {
        prop_assert_eq!(code.as_str().parse::<ErrorCode>().unwrap(), code);
        prop_assert_eq!(TwirpError::new(code, "x").status_code(), code.http_status());
    }

    #[test]
    fn unknown_wire_names_are_rejected(name in "[a-z_]{1,24}") {
        prop_assume!(ErrorCode::ALL.iter().all(|code| code.as_str() != name));
        prop_assert!(name.parse::<ErrorCode>().is_err());
    }

    #[test]
    fn only_exact_media_types_are_valid(value in "\\PC{0,40}") {
        let expected = value == "application/json" || value == "application/protobuf";
        prop_assert_eq!(valid_content_type(&value), expected);
        prop_assert_eq!(ContentType::from_header(&value).is_some(), expected);
    }

    #[test]
    fn media_type_parameters_are_rejected(param in "[a-z]{1,8}=[a-z0-9-]{1,8}") {
        let json_with_param = format!("application/json; {param}");
        let protobuf_with_param = format!("application/protobuf;{param}");
        prop_assert!(!valid_content_type(&json_with_param));
        prop_assert!(!valid_content_type(&protobuf_with_param));
    }

    #[test]
    fn error_body_keeps_message_and_meta(
        code in error_code(),
        msg in "\\PC{0,60}",
        meta in prop::collection::vec(("[a-z_]{1,10}", "\\PC{0,20}"), 0..4),
    ) {
        let mut error = TwirpError::new(code, msg.clone());
        for (key, value) in &meta {
            error = error.with_meta(key.clone(), value.clone());
        }

        let parsed = TwirpError::from_json(&error.to_json()).unwrap();
        prop_assert_eq!(parsed.code(), code);
        prop_assert_eq!(parsed.msg(), msg.as_str());
        prop_assert_eq!(parsed, error);
    }

    #[test]
    fn string_panic_payloads_are_described_verbatim(message in "\\PC{0,60}") {
        let payload: Box<dyn Any + Send> = Box::new(message.clone());
        prop_assert_eq!(panic_message(payload.as_ref()), message.clone());
        prop_assert_eq!(Failure::from_panic(payload).to_string(), message);
    }
}
