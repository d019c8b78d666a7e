//! The service and its dispatch pipeline.
//!
//! A [`Service`] is built once with a [`ServiceBuilder`] and is immutable
//! afterward. [`Service::call`] runs one request through the pipeline:
//!
//! 1. Route the request; a routing error becomes an error response
//! 2. Run before hooks; a returned error becomes an error response
//! 3. Invoke the handler; a declared error becomes an error response
//! 4. Emit the success response
//!
//! Any unexpected failure along the way (a hook or handler returning `Err`,
//! a panic, an output that cannot be encoded) is caught at one boundary,
//! reported to the exception_raised hooks and turned into a 500 `internal`
//! error. In raise-exceptions mode returned errors come back to the caller
//! as `Err` and panics resume unwinding with their original payload.

use std::any::type_name;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use http::{Extensions, Request, Response};
use serde_json::{Map, Value};

use hermes_config::ServiceSettings;
use hermes_core::{
    panic_message, ContentType, Failure, Reply, RpcContext, RpcMessage, TwirpError, TwirpResult,
};
use hermes_telemetry::{log_rpc_completed, log_rpc_failure};

use crate::definition::ServiceDefinition;
use crate::error::BuildError;
use crate::handler::{HandlerOutcome, HandlerRegistry};
use crate::hooks::Hooks;
use crate::method_table::{AnyMessage, MethodEntry, MethodTable};
use crate::response;
use crate::router::Router;

/// Builder for a [`Service`].
///
/// # Example
///
/// ```
/// use hermes_core::{Reply, RpcContext};
/// use hermes_server::{Service, ServiceDefinition};
///
/// # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
/// # struct Size { #[prost(int32, tag = "1")] inches: i32 }
/// # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
/// # struct Hat { #[prost(int32, tag = "1")] inches: i32 }
/// let definition = ServiceDefinition::new("example", "Haberdasher")
///     .rpc::<Size, Hat>("MakeHat", "make_hat");
///
/// let service = Service::builder(definition)
///     .handle("make_hat", |size: Size, _ctx: &mut RpcContext| {
///         Ok(Reply::output(Hat { inches: size.inches }))
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(service.full_name(), "example.Haberdasher");
/// ```
#[must_use]
pub struct ServiceBuilder {
    definition: ServiceDefinition,
    handlers: HandlerRegistry,
    hooks: Hooks,
    raise_exceptions: bool,
}

impl ServiceBuilder {
    /// Creates a builder for a service definition.
    pub fn new(definition: ServiceDefinition) -> Self {
        Self {
            definition,
            handlers: HandlerRegistry::new(),
            hooks: Hooks::new(),
            raise_exceptions: false,
        }
    }

    /// Registers the handler for a method identifier.
    pub fn handle<I, O, F>(mut self, method_id: impl Into<String>, handler: F) -> Self
    where
        I: RpcMessage,
        O: RpcMessage,
        F: Fn(I, &mut RpcContext) -> anyhow::Result<Reply<O>> + Send + Sync + 'static,
    {
        self.handlers.register(method_id, handler);
        self
    }

    /// Appends a set of hooks.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = self.hooks.merge(hooks);
        self
    }

    /// Appends a before hook.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request<Bytes>, &mut RpcContext) -> anyhow::Result<Option<TwirpError>>
            + Send
            + Sync
            + 'static,
    {
        self.hooks = self.hooks.before(hook);
        self
    }

    /// Appends an on_success hook.
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.on_success(hook);
        self
    }

    /// Appends an on_error hook.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TwirpError, &RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.on_error(hook);
        self
    }

    /// Appends an exception_raised hook.
    pub fn exception_raised<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Failure, &RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.exception_raised(hook);
        self
    }

    /// Returns unexpected failures to the caller instead of converting them.
    ///
    /// Meant for test harnesses; exception_raised hooks do not run.
    pub fn raise_exceptions(mut self, raise: bool) -> Self {
        self.raise_exceptions = raise;
        self
    }

    /// Applies settings loaded from configuration.
    pub fn with_settings(self, settings: &ServiceSettings) -> Self {
        self.raise_exceptions(settings.raise_exceptions)
    }

    /// Validates the handlers against the definition and freezes the service.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the definition is invalid or a handler
    /// does not match any rpc.
    pub fn build(self) -> Result<Service, BuildError> {
        let table = Arc::new(MethodTable::from_definition(&self.definition)?);

        for method_id in self.handlers.method_ids() {
            let Some(entry) = table.by_method_id(method_id) else {
                return Err(BuildError::UnknownMethod {
                    method_id: method_id.to_string(),
                });
            };
            if let Some(found) = self.handlers.type_mismatch(method_id, entry) {
                return Err(BuildError::HandlerTypeMismatch {
                    method_id: method_id.to_string(),
                    expected: format!(
                        "{} -> {}",
                        entry.input().type_name(),
                        entry.output().type_name()
                    ),
                    found,
                });
            }
        }

        for entry in table.entries() {
            if !self.handlers.contains(entry.method_id()) {
                tracing::debug!(
                    service = %table.full_name(),
                    rpc = %entry.rpc_name(),
                    "no handler registered, calls will be unimplemented"
                );
            }
        }

        Ok(Service {
            package: self.definition.package().to_string(),
            name: self.definition.service().to_string(),
            router: Router::new(Arc::clone(&table)),
            table,
            handlers: self.handlers,
            hooks: self.hooks,
            raise_exceptions: self.raise_exceptions,
        })
    }
}

/// A frozen, shareable RPC service.
///
/// `Service` is `Send + Sync`; wrap it in an `Arc` to serve from many
/// threads.
pub struct Service {
    package: String,
    name: String,
    table: Arc<MethodTable>,
    router: Router,
    handlers: HandlerRegistry,
    hooks: Hooks,
    raise_exceptions: bool,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("full_name", &self.table.full_name())
            .field("rpcs", &self.table.len())
            .field("handlers", &self.handlers)
            .field("hooks", &self.hooks)
            .field("raise_exceptions", &self.raise_exceptions)
            .finish()
    }
}

impl Service {
    /// Creates a builder for a service definition.
    pub fn builder(definition: ServiceDefinition) -> ServiceBuilder {
        ServiceBuilder::new(definition)
    }

    /// Returns the package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fully-qualified service name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.table.full_name()
    }

    /// Returns the method table.
    #[must_use]
    pub fn table(&self) -> &MethodTable {
        &self.table
    }

    /// Iterates over the rpcs in declaration order.
    pub fn rpcs(&self) -> impl Iterator<Item = &MethodEntry> {
        self.table.entries().map(Arc::as_ref)
    }

    /// Returns `true` if failures are returned instead of converted.
    #[must_use]
    pub const fn raises_exceptions(&self) -> bool {
        self.raise_exceptions
    }

    /// Dispatches one request.
    ///
    /// Always returns a well-formed response unless the service was built
    /// with [`ServiceBuilder::raise_exceptions`]. In that mode returned
    /// errors come back as `Err` and panics resume unwinding with their
    /// original payload.
    pub fn call(&self, request: Request<Bytes>) -> Result<Response<Bytes>, Failure> {
        let mut ctx = RpcContext::from_request(&request);
        let span = tracing::debug_span!(
            "rpc",
            request_id = %ctx.request_id(),
            method = %request.method(),
            path = %ctx.path(),
        );
        let _guard = span.enter();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(&request, &mut ctx)));
        let failure = match outcome {
            Ok(Ok(response)) => {
                log_completion(&response, &ctx);
                return Ok(response);
            }
            Ok(Err(failure)) => failure,
            Err(payload) if self.raise_exceptions => {
                log_rpc_failure!(panic_message(payload.as_ref()), "panic");
                panic::resume_unwind(payload);
            }
            Err(payload) => Failure::from_panic(payload),
        };

        log_rpc_failure!(failure, failure.kind());
        if self.raise_exceptions {
            return Err(failure);
        }

        let response = self.exception_response(failure, &ctx);
        log_completion(&response, &ctx);
        Ok(response)
    }

    fn dispatch(
        &self,
        request: &Request<Bytes>,
        ctx: &mut RpcContext,
    ) -> Result<Response<Bytes>, Failure> {
        if let Err(err) = self.router.route(request, ctx) {
            tracing::debug!(code = %err.code(), msg = %err.msg(), "request rejected by router");
            return self.error_response(&err, ctx);
        }

        if let Some(err) = self.hooks.run_before(request, ctx)? {
            return self.error_response(&err, ctx);
        }

        match self.handlers.invoke(ctx)? {
            Ok(output) => self.success_response(output, ctx),
            Err(err) => {
                tracing::debug!(code = %err.code(), msg = %err.msg(), "handler returned error");
                self.error_response(&err, ctx)
            }
        }
    }

    fn success_response(
        &self,
        output: AnyMessage,
        ctx: &mut RpcContext,
    ) -> Result<Response<Bytes>, Failure> {
        ctx.set_output(output);
        self.hooks.run_on_success(ctx)?;

        let (Some(rpc_name), Some(content_type)) = (ctx.rpc_name(), ctx.content_type()) else {
            return Err(anyhow!("dispatch context was not routed").into());
        };
        let entry = self
            .table
            .lookup(rpc_name)
            .ok_or_else(|| anyhow!("rpc {rpc_name} vanished from the method table"))?;
        let output = ctx
            .output_any()
            .ok_or_else(|| anyhow!("handler output missing from context"))?;
        let body = entry.output().encode(output, content_type)?;

        Ok(response::success(body, content_type, ctx.response_headers()))
    }

    fn error_response(
        &self,
        err: &TwirpError,
        ctx: &RpcContext,
    ) -> Result<Response<Bytes>, Failure> {
        self.hooks.run_on_error(err, ctx)?;
        Ok(response::error(err))
    }

    fn exception_response(&self, failure: Failure, ctx: &RpcContext) -> Response<Bytes> {
        let effective = self.hooks.run_exception_raised(failure, ctx);
        response::error(&TwirpError::internal_with(&effective))
    }

    /// Calls an rpc's handler directly, bypassing HTTP parsing and hooks.
    ///
    /// The call runs with a protobuf content type and the given extensions.
    /// An unknown rpc yields `bad_route`; failures are never converted.
    /// A handler panic unwinds through this call unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`Failure`] when the handler returns `Err`, or when `I`
    /// and `O` are not the rpc's declared types.
    pub fn call_rpc<I: RpcMessage, O: RpcMessage>(
        &self,
        rpc_name: &str,
        input: I,
        extensions: Extensions,
    ) -> Result<TwirpResult<O>, Failure> {
        let Some(entry) = self.table.lookup(rpc_name) else {
            return Ok(Err(invalid_rpc(rpc_name)));
        };
        if !entry.input().is::<I>() || !entry.output().is::<O>() {
            return Err(anyhow!(
                "rpc {rpc_name} takes {} -> {}, not {} -> {}",
                entry.input().type_name(),
                entry.output().type_name(),
                type_name::<I>(),
                type_name::<O>()
            )
            .into());
        }

        let outcome = self.invoke_direct(entry, Box::new(input), extensions)?;
        match outcome {
            Ok(output) => output
                .downcast::<O>()
                .map(|o| Ok(*o))
                .map_err(|_| anyhow!("handler output is not a {}", type_name::<O>()).into()),
            Err(err) => Ok(Err(err)),
        }
    }

    /// Like [`call_rpc`](Self::call_rpc), with the input given as a keyed
    /// record and the output returned type-erased.
    ///
    /// # Errors
    ///
    /// Returns a [`Failure`] when the record does not convert into the input
    /// type, or when the handler returns `Err`.
    pub fn call_rpc_record(
        &self,
        rpc_name: &str,
        record: Map<String, Value>,
        extensions: Extensions,
    ) -> Result<TwirpResult<AnyMessage>, Failure> {
        let Some(entry) = self.table.lookup(rpc_name) else {
            return Ok(Err(invalid_rpc(rpc_name)));
        };
        let input = entry.input().from_record(record).map_err(|e| {
            anyhow!(
                "record does not convert into {}: {e}",
                entry.input().type_name()
            )
        })?;
        self.invoke_direct(entry, input, extensions)
    }

    fn invoke_direct(
        &self,
        entry: &MethodEntry,
        input: AnyMessage,
        extensions: Extensions,
    ) -> Result<HandlerOutcome, Failure> {
        let mut ctx = RpcContext::for_method(entry.method(), ContentType::Protobuf);
        ctx.set_extensions(extensions);
        ctx.set_input(input);

        self.handlers.invoke(&mut ctx).map_err(Failure::from)
    }
}

fn invalid_rpc(rpc_name: &str) -> TwirpError {
    TwirpError::bad_route(format!("Invalid rpc method {rpc_name:?}"))
}

fn log_completion(response: &Response<Bytes>, ctx: &RpcContext) {
    log_rpc_completed!(
        response.status().as_u16(),
        ctx.rpc_name().unwrap_or("-"),
        ctx.elapsed().as_secs_f64() * 1000.0
    );
}
