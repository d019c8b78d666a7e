//! Declarative service definitions.
//!
//! A [`ServiceDefinition`] is what generated protocol code hands to the
//! dispatch engine: the package, the service name and one [`RpcDefinition`]
//! per rpc.

use hermes_core::RpcMessage;

use crate::method_table::MessageDescriptor;

/// One rpc declared by a service.
#[derive(Debug, Clone)]
pub struct RpcDefinition {
    rpc_name: String,
    method_id: String,
    input: MessageDescriptor,
    output: MessageDescriptor,
}

impl RpcDefinition {
    /// Creates an rpc definition from explicit descriptors.
    #[must_use]
    pub fn new(
        rpc_name: impl Into<String>,
        method_id: impl Into<String>,
        input: MessageDescriptor,
        output: MessageDescriptor,
    ) -> Self {
        Self {
            rpc_name: rpc_name.into(),
            method_id: method_id.into(),
            input,
            output,
        }
    }

    /// Returns the rpc name (e.g. `MakeHat`).
    #[must_use]
    pub fn rpc_name(&self) -> &str {
        &self.rpc_name
    }

    /// Returns the handler method identifier (e.g. `make_hat`).
    #[must_use]
    pub fn method_id(&self) -> &str {
        &self.method_id
    }

    /// Returns the input descriptor.
    #[must_use]
    pub const fn input(&self) -> &MessageDescriptor {
        &self.input
    }

    /// Returns the output descriptor.
    #[must_use]
    pub const fn output(&self) -> &MessageDescriptor {
        &self.output
    }
}

/// A service and its rpcs.
///
/// # Example
///
/// ```
/// use hermes_server::ServiceDefinition;
///
/// # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
/// # struct Size { #[prost(int32, tag = "1")] inches: i32 }
/// # #[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
/// # struct Hat { #[prost(string, tag = "1")] name: String }
/// let definition = ServiceDefinition::new("example", "Haberdasher")
///     .rpc::<Size, Hat>("MakeHat", "make_hat");
///
/// assert_eq!(definition.full_name(), "example.Haberdasher");
/// assert_eq!(definition.rpcs().len(), 1);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ServiceDefinition {
    package: String,
    service: String,
    rpcs: Vec<RpcDefinition>,
}

impl ServiceDefinition {
    /// Creates a definition with no rpcs.
    ///
    /// `package` may be empty.
    pub fn new(package: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            service: service.into(),
            rpcs: Vec::new(),
        }
    }

    /// Declares an rpc taking `I` and returning `O`.
    pub fn rpc<I: RpcMessage, O: RpcMessage>(
        self,
        rpc_name: impl Into<String>,
        method_id: impl Into<String>,
    ) -> Self {
        self.with_rpc(RpcDefinition::new(
            rpc_name,
            method_id,
            MessageDescriptor::of::<I>(),
            MessageDescriptor::of::<O>(),
        ))
    }

    /// Declares a pre-built rpc definition.
    pub fn with_rpc(mut self, rpc: RpcDefinition) -> Self {
        self.rpcs.push(rpc);
        self
    }

    /// Returns the package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the declared rpcs.
    #[must_use]
    pub fn rpcs(&self) -> &[RpcDefinition] {
        &self.rpcs
    }

    /// Returns `{package}.{service}`, or just the service name when the
    /// package is empty.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.service.clone()
        } else {
            format!("{}.{}", self.package, self.service)
        }
    }
}
