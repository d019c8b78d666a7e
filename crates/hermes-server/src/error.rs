//! Service construction errors.

use thiserror::Error;

/// Error returned when a [`Service`](crate::Service) cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The service definition has an empty service name.
    #[error("service name must not be empty")]
    MissingServiceName,

    /// Two rpcs share the same name.
    #[error("rpc {rpc_name:?} is declared more than once")]
    DuplicateRpc {
        /// The repeated rpc name.
        rpc_name: String,
    },

    /// A handler was registered for a method identifier no rpc uses.
    #[error("handler registered for unknown method {method_id:?}")]
    UnknownMethod {
        /// The unmatched method identifier.
        method_id: String,
    },

    /// A handler's message types differ from the rpc's declaration.
    #[error("handler for {method_id:?} has type {found}, but the rpc declares {expected}")]
    HandlerTypeMismatch {
        /// The method identifier.
        method_id: String,
        /// Declared `input -> output` types.
        expected: String,
        /// The handler's `input -> output` types.
        found: String,
    },
}
