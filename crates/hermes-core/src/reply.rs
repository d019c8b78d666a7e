//! Handler return values.

use serde_json::{Map, Value};

use crate::TwirpError;

/// What a handler produced for one call.
///
/// A handler may answer with the declared output message, with a loosely
/// keyed record that the pipeline converts into the output type, or with a
/// structured error.
///
/// # Example
///
/// ```
/// use hermes_core::{Reply, TwirpError};
/// use serde_json::json;
///
/// # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
/// # struct Hat { #[prost(string, tag = "1")] name: String }
/// let record: Reply<Hat> = Reply::record(json!({"name": "fedora"})).unwrap();
/// let error: Reply<Hat> = TwirpError::not_found("no hats left").into();
/// assert!(matches!(error, Reply::Error(_)));
/// # let _ = record;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<O> {
    /// The declared output message.
    Output(O),
    /// A keyed record to be converted into the output message.
    Record(Map<String, Value>),
    /// A structured error.
    Error(TwirpError),
}

impl<O> Reply<O> {
    /// Wraps an output message.
    pub const fn output(output: O) -> Self {
        Self::Output(output)
    }

    /// Wraps a JSON value as a record.
    ///
    /// Returns `None` if `value` is not a JSON object.
    #[must_use]
    pub fn record(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::Record(map)),
            _ => None,
        }
    }

    /// Returns `true` for [`Reply::Error`].
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl<O> From<TwirpError> for Reply<O> {
    fn from(error: TwirpError) -> Self {
        Self::Error(error)
    }
}

impl<O> From<Result<O, TwirpError>> for Reply<O> {
    fn from(result: Result<O, TwirpError>) -> Self {
        result.map_or_else(Self::Error, Self::Output)
    }
}
