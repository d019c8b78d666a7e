//! Handler registration and invocation.
//!
//! Handlers are plain closures registered per method identifier:
//!
//! ```text
//! Fn(I, &mut RpcContext) -> anyhow::Result<Reply<O>>
//! ```
//!
//! The registry erases the message types so handlers for every rpc of a
//! service can live in one map. The declared types are remembered and
//! checked against the method table when the service is built.
//!
//! At request time the adapter normalizes what the handler returned:
//!
//! - `Reply::Output` and `Reply::Error` pass through unchanged
//! - `Reply::Record` is converted into `O`, or becomes an `internal` error
//! - `Err(anyhow::Error)` is an unexpected failure for the pipeline to handle

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::Value;

use hermes_core::{Reply, RpcContext, RpcMessage, TwirpError};

use crate::method_table::{AnyMessage, MethodEntry};

/// What an erased handler produced: an output message or a declared error.
pub type HandlerOutcome = Result<AnyMessage, TwirpError>;

/// A type-erased handler function.
pub type ErasedHandler =
    Arc<dyn Fn(&mut RpcContext) -> anyhow::Result<HandlerOutcome> + Send + Sync>;

struct Registered {
    handler: ErasedHandler,
    input: (TypeId, &'static str),
    output: (TypeId, &'static str),
}

/// Registry mapping method identifiers to handlers.
///
/// # Example
///
/// ```rust
/// use hermes_server::HandlerRegistry;
///
/// let registry = HandlerRegistry::new();
/// assert!(registry.is_empty());
/// assert!(!registry.contains("make_hat"));
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Registered>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for a method identifier.
    ///
    /// Registering the same identifier twice replaces the first handler.
    pub fn register<I, O, F>(&mut self, method_id: impl Into<String>, handler: F)
    where
        I: RpcMessage,
        O: RpcMessage,
        F: Fn(I, &mut RpcContext) -> anyhow::Result<Reply<O>> + Send + Sync + 'static,
    {
        let method_id = method_id.into();
        let id = method_id.clone();
        let erased: ErasedHandler = Arc::new(move |ctx: &mut RpcContext| {
            let input = ctx
                .input::<I>()
                .cloned()
                .ok_or_else(|| anyhow!("input for {id} is not a {}", type_name::<I>()))?;

            Ok(match handler(input, ctx)? {
                Reply::Output(output) => Ok(Box::new(output) as AnyMessage),
                Reply::Error(err) => Err(err),
                Reply::Record(record) => serde_json::from_value::<O>(Value::Object(record))
                    .map(|output| Box::new(output) as AnyMessage)
                    .map_err(|e| {
                        TwirpError::internal(format!(
                            "Handler method {id} returned a record that does not match {}: {e}",
                            type_name::<O>()
                        ))
                    }),
            })
        });

        self.handlers.insert(
            method_id,
            Registered {
                handler: erased,
                input: (TypeId::of::<I>(), type_name::<I>()),
                output: (TypeId::of::<O>(), type_name::<O>()),
            },
        );
    }

    /// Looks up a handler by method identifier.
    #[must_use]
    pub fn get(&self, method_id: &str) -> Option<&ErasedHandler> {
        self.handlers.get(method_id).map(|r| &r.handler)
    }

    /// Checks if a handler is registered for a method identifier.
    #[must_use]
    pub fn contains(&self, method_id: &str) -> bool {
        self.handlers.contains_key(method_id)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns an iterator over registered method identifiers.
    pub fn method_ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Returns `input -> output` type names of a handler whose types differ
    /// from `entry`, or `None` if they agree.
    pub(crate) fn type_mismatch(&self, method_id: &str, entry: &MethodEntry) -> Option<String> {
        let registered = self.handlers.get(method_id)?;
        let agrees = registered.input.0 == entry.input().type_id()
            && registered.output.0 == entry.output().type_id();
        (!agrees).then(|| format!("{} -> {}", registered.input.1, registered.output.1))
    }

    /// Invokes the handler for the method recorded in `ctx`.
    ///
    /// A missing handler yields an `unimplemented` error.
    ///
    /// # Errors
    ///
    /// Returns the handler's own `Err`, or an error if `ctx` was not routed.
    pub fn invoke(&self, ctx: &mut RpcContext) -> anyhow::Result<HandlerOutcome> {
        let method_id = ctx
            .method_id()
            .ok_or_else(|| anyhow!("dispatch context has no resolved method"))?
            .to_string();

        match self.get(&method_id) {
            Some(handler) => {
                tracing::debug!(method_id = %method_id, "invoking handler");
                handler(ctx)
            }
            None => Ok(Err(TwirpError::unimplemented(format!(
                "Handler method {method_id} is not implemented."
            )))),
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("method_ids", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method_table::MethodTable;
    use crate::test_support::{haberdasher, Hat, HatList, Size};
    use hermes_core::{ContentType, ErrorCode};
    use serde_json::json;

    fn routed_ctx(rpc_name: &str, input: Size) -> RpcContext {
        let table = MethodTable::from_definition(&haberdasher()).unwrap();
        let entry = table.lookup(rpc_name).unwrap();
        let mut ctx = RpcContext::for_method(entry.method(), ContentType::Json);
        ctx.set_input(Box::new(input));
        ctx
    }

    #[test]
    fn test_registry_new() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_invoke_output() {
        let mut registry = HandlerRegistry::new();
        registry.register("make_hat", |size: Size, _ctx: &mut RpcContext| {
            Ok(Reply::output(Hat {
                inches: size.inches,
                ..Hat::default()
            }))
        });
        assert!(registry.contains("make_hat"));

        let mut ctx = routed_ctx("MakeHat", Size { inches: 8 });
        let output = registry.invoke(&mut ctx).unwrap().unwrap();
        assert_eq!(output.downcast_ref::<Hat>().unwrap().inches, 8);
    }

    #[test]
    fn test_invoke_declared_error_passes_through() {
        let mut registry = HandlerRegistry::new();
        registry.register("make_hat", |_: Size, _: &mut RpcContext| {
            Ok(Reply::<Hat>::Error(TwirpError::invalid_argument("too small")))
        });

        let mut ctx = routed_ctx("MakeHat", Size { inches: 1 });
        let err = registry.invoke(&mut ctx).unwrap().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.msg(), "too small");
    }

    #[test]
    fn test_invoke_record_is_converted() {
        let mut registry = HandlerRegistry::new();
        registry.register("make_hat", |size: Size, _: &mut RpcContext| {
            Ok(Reply::<Hat>::record(json!({"inches": size.inches, "color": "red"})).unwrap())
        });

        let mut ctx = routed_ctx("MakeHat", Size { inches: 5 });
        let output = registry.invoke(&mut ctx).unwrap().unwrap();
        let hat = output.downcast_ref::<Hat>().unwrap();
        assert_eq!(hat.inches, 5);
        assert_eq!(hat.color, "red");
    }

    #[test]
    fn test_invoke_mismatched_record_is_internal() {
        let mut registry = HandlerRegistry::new();
        registry.register("make_hat", |_: Size, _: &mut RpcContext| {
            Ok(Reply::<Hat>::record(json!({"inches": "huge"})).unwrap())
        });

        let mut ctx = routed_ctx("MakeHat", Size::default());
        let err = registry.invoke(&mut ctx).unwrap().unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);
        assert!(err.msg().starts_with("Handler method make_hat returned a record"));
    }

    #[test]
    fn test_invoke_missing_handler_is_unimplemented() {
        let registry = HandlerRegistry::new();
        let mut ctx = routed_ctx("ListHats", Size::default());
        let err = registry.invoke(&mut ctx).unwrap().unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unimplemented);
        assert_eq!(err.msg(), "Handler method list_hats is not implemented.");
    }

    #[test]
    fn test_invoke_propagates_failure() {
        let mut registry = HandlerRegistry::new();
        registry.register("list_hats", |_: Size, _: &mut RpcContext| {
            Err::<Reply<HatList>, _>(anyhow!("warehouse offline"))
        });

        let mut ctx = routed_ctx("ListHats", Size::default());
        let err = registry.invoke(&mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "warehouse offline");
    }

    #[test]
    fn test_handler_can_set_response_headers() {
        let mut registry = HandlerRegistry::new();
        registry.register("make_hat", |_: Size, ctx: &mut RpcContext| {
            ctx.response_headers_mut()
                .insert("x-hat-source", http::HeaderValue::from_static("attic"));
            Ok(Reply::output(Hat::default()))
        });

        let mut ctx = routed_ctx("MakeHat", Size::default());
        registry.invoke(&mut ctx).unwrap().unwrap();
        assert_eq!(ctx.response_headers()["x-hat-source"], "attic");
    }

    #[test]
    fn test_type_mismatch() {
        let table = MethodTable::from_definition(&haberdasher()).unwrap();
        let mut registry = HandlerRegistry::new();
        registry.register("make_hat", |_: Size, _: &mut RpcContext| {
            Ok(Reply::output(HatList::default()))
        });

        let entry = table.by_method_id("make_hat").unwrap();
        let found = registry.type_mismatch("make_hat", entry).unwrap();
        assert!(found.ends_with("HatList"));

        let entry = table.by_method_id("list_hats").unwrap();
        assert!(registry.type_mismatch("make_hat", entry).is_none());
    }
}
