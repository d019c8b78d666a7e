//! The method table.
//!
//! A [`MethodTable`] maps rpc names (the last URL path segment) to their
//! [`MethodEntry`]. It is built once from a [`ServiceDefinition`] and never
//! mutated afterward; entries are shared via `Arc`.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use hermes_core::content::{self, CodecError};
use hermes_core::{ContentType, RpcMessage, RpcMethod};

use crate::definition::ServiceDefinition;
use crate::error::BuildError;

/// A decoded message of any registered type.
pub type AnyMessage = Box<dyn Any + Send + Sync>;

/// Type-erased codec for one message type.
trait MessageCodec: Send + Sync {
    fn decode(&self, body: &[u8], content_type: ContentType) -> Result<AnyMessage, CodecError>;
    fn encode(&self, message: &dyn Any, content_type: ContentType) -> anyhow::Result<Bytes>;
    fn from_record(&self, record: Map<String, Value>) -> Result<AnyMessage, serde_json::Error>;
}

struct Codec<M>(PhantomData<fn() -> M>);

impl<M: RpcMessage> MessageCodec for Codec<M> {
    fn decode(&self, body: &[u8], content_type: ContentType) -> Result<AnyMessage, CodecError> {
        let message: M = content::decode(body, content_type)?;
        Ok(Box::new(message))
    }

    fn encode(&self, message: &dyn Any, content_type: ContentType) -> anyhow::Result<Bytes> {
        let message = message
            .downcast_ref::<M>()
            .ok_or_else(|| anyhow!("output value is not a {}", type_name::<M>()))?;
        Ok(content::encode(message, content_type)?)
    }

    fn from_record(&self, record: Map<String, Value>) -> Result<AnyMessage, serde_json::Error> {
        let message: M = serde_json::from_value(Value::Object(record))?;
        Ok(Box::new(message))
    }
}

/// Describes a message type and knows how to decode and encode it.
#[derive(Clone)]
pub struct MessageDescriptor {
    type_name: &'static str,
    type_id: TypeId,
    codec: Arc<dyn MessageCodec>,
}

impl MessageDescriptor {
    /// Creates the descriptor for message type `M`.
    #[must_use]
    pub fn of<M: RpcMessage>() -> Self {
        Self {
            type_name: type_name::<M>(),
            type_id: TypeId::of::<M>(),
            codec: Arc::new(Codec::<M>(PhantomData)),
        }
    }

    /// Returns the Rust type name of the message.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the `TypeId` of the message.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns `true` if this descriptor describes `M`.
    #[must_use]
    pub fn is<M: Any>(&self) -> bool {
        self.type_id == TypeId::of::<M>()
    }

    /// Decodes a request body into a message of this type.
    pub fn decode(&self, body: &[u8], content_type: ContentType) -> Result<AnyMessage, CodecError> {
        self.codec.decode(body, content_type)
    }

    /// Encodes a message of this type.
    ///
    /// Fails if `message` is of another type or the codec rejects it.
    pub fn encode(&self, message: &dyn Any, content_type: ContentType) -> anyhow::Result<Bytes> {
        self.codec.encode(message, content_type)
    }

    /// Converts a keyed record into a message of this type.
    pub fn from_record(&self, record: Map<String, Value>) -> Result<AnyMessage, serde_json::Error> {
        self.codec.from_record(record)
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageDescriptor")
            .field(&self.type_name)
            .finish()
    }
}

/// One routable rpc.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    method: Arc<RpcMethod>,
    input: MessageDescriptor,
    output: MessageDescriptor,
}

impl MethodEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(
        rpc_name: impl Into<String>,
        method_id: impl Into<String>,
        input: MessageDescriptor,
        output: MessageDescriptor,
    ) -> Self {
        let method = RpcMethod {
            rpc_name: rpc_name.into(),
            method_id: method_id.into(),
            input_type: input.type_name(),
            output_type: output.type_name(),
        };
        Self {
            method: Arc::new(method),
            input,
            output,
        }
    }

    /// Returns the rpc name.
    #[must_use]
    pub fn rpc_name(&self) -> &str {
        &self.method.rpc_name
    }

    /// Returns the handler method identifier.
    #[must_use]
    pub fn method_id(&self) -> &str {
        &self.method.method_id
    }

    /// Returns the shared method identity stored in dispatch contexts.
    #[must_use]
    pub fn method(&self) -> Arc<RpcMethod> {
        Arc::clone(&self.method)
    }

    /// Returns the input message descriptor.
    #[must_use]
    pub const fn input(&self) -> &MessageDescriptor {
        &self.input
    }

    /// Returns the output message descriptor.
    #[must_use]
    pub const fn output(&self) -> &MessageDescriptor {
        &self.output
    }
}

/// Immutable table of the rpcs of one service.
///
/// # Example
///
/// ```
/// use hermes_server::{MethodTable, ServiceDefinition};
///
/// # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
/// # struct Size { #[prost(int32, tag = "1")] inches: i32 }
/// # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
/// # struct Hat { #[prost(string, tag = "1")] name: String }
/// let definition = ServiceDefinition::new("example", "Haberdasher")
///     .rpc::<Size, Hat>("MakeHat", "make_hat");
///
/// let table = MethodTable::from_definition(&definition).unwrap();
/// assert_eq!(table.full_name(), "example.Haberdasher");
/// assert_eq!(table.lookup("MakeHat").unwrap().method_id(), "make_hat");
/// assert!(table.lookup("make_hat").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct MethodTable {
    full_name: String,
    entries: IndexMap<String, Arc<MethodEntry>>,
}

impl MethodTable {
    /// Builds the table for a service definition.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingServiceName`] for an empty service name
    /// and [`BuildError::DuplicateRpc`] when two rpcs share a name.
    pub fn from_definition(definition: &ServiceDefinition) -> Result<Self, BuildError> {
        if definition.service().trim().is_empty() {
            return Err(BuildError::MissingServiceName);
        }

        let mut entries = IndexMap::with_capacity(definition.rpcs().len());
        for rpc in definition.rpcs() {
            let entry = MethodEntry::new(
                rpc.rpc_name(),
                rpc.method_id(),
                rpc.input().clone(),
                rpc.output().clone(),
            );
            if entries
                .insert(rpc.rpc_name().to_string(), Arc::new(entry))
                .is_some()
            {
                return Err(BuildError::DuplicateRpc {
                    rpc_name: rpc.rpc_name().to_string(),
                });
            }
        }

        Ok(Self {
            full_name: definition.full_name(),
            entries,
        })
    }

    /// Returns the fully-qualified service name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Looks up an rpc by name.
    #[must_use]
    pub fn lookup(&self, rpc_name: &str) -> Option<&Arc<MethodEntry>> {
        self.entries.get(rpc_name)
    }

    /// Finds the entry served by a handler method identifier.
    #[must_use]
    pub fn by_method_id(&self, method_id: &str) -> Option<&Arc<MethodEntry>> {
        self.entries.values().find(|e| e.method_id() == method_id)
    }

    /// Iterates over entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<MethodEntry>> {
        self.entries.values()
    }

    /// Returns the number of rpcs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the service declares no rpcs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{haberdasher, Hat, Size};
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let table = MethodTable::from_definition(&haberdasher()).unwrap();
        assert_eq!(table.len(), 2);

        let entry = table.lookup("MakeHat").unwrap();
        assert_eq!(entry.rpc_name(), "MakeHat");
        assert_eq!(entry.method_id(), "make_hat");
        assert!(entry.input().is::<Size>());
        assert!(entry.output().is::<Hat>());
        assert_eq!(entry.method().output_type, std::any::type_name::<Hat>());

        assert!(table.lookup("Missing").is_none());
        assert_eq!(table.by_method_id("make_hat").unwrap().rpc_name(), "MakeHat");
    }

    #[test]
    fn test_entries_keep_declaration_order() {
        let table = MethodTable::from_definition(&haberdasher()).unwrap();
        let names: Vec<_> = table.entries().map(|e| e.rpc_name()).collect();
        assert_eq!(names, ["MakeHat", "ListHats"]);
    }

    #[test]
    fn test_duplicate_rpc_rejected() {
        let definition = haberdasher().rpc::<Size, Hat>("MakeHat", "make_hat_again");
        let err = MethodTable::from_definition(&definition).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateRpc { rpc_name } if rpc_name == "MakeHat"));
    }

    #[test]
    fn test_missing_service_name_rejected() {
        let definition = ServiceDefinition::new("example", " ");
        assert!(matches!(
            MethodTable::from_definition(&definition),
            Err(BuildError::MissingServiceName)
        ));
    }

    #[test]
    fn test_descriptor_codec() {
        let descriptor = MessageDescriptor::of::<Size>();
        let decoded = descriptor
            .decode(br#"{"inches":7}"#, ContentType::Json)
            .unwrap();
        assert_eq!(decoded.downcast_ref::<Size>().unwrap().inches, 7);

        let bytes = descriptor
            .encode(&Size { inches: 7 }, ContentType::Protobuf)
            .unwrap();
        assert_eq!(&bytes[..], &[0x08, 0x07]);

        assert!(descriptor.encode(&Hat::default(), ContentType::Json).is_err());
    }

    #[test]
    fn test_descriptor_from_record() {
        let descriptor = MessageDescriptor::of::<Hat>();
        let Value::Object(record) = json!({"name": "bowler", "inches": 9}) else {
            unreachable!()
        };
        let hat = descriptor.from_record(record).unwrap();
        assert_eq!(hat.downcast_ref::<Hat>().unwrap().name, "bowler");

        let Value::Object(bad) = json!({"inches": "nine"}) else {
            unreachable!()
        };
        assert!(descriptor.from_record(bad).is_err());
    }
}
