//! Unexpected failures.
//!
//! A [`Failure`] is anything that went wrong outside the [`TwirpError`]
//! protocol: a handler or hook returning `Err(anyhow::Error)`, a panic caught
//! at the pipeline boundary, or a response that could not be encoded.
//!
//! [`TwirpError`]: crate::TwirpError

use std::any::Any;

use thiserror::Error;

/// Fallback description for panics whose payload is not a string.
const OPAQUE_PANIC: &str = "handler panicked";

/// An unexpected failure raised while processing a request.
#[derive(Debug, Error)]
pub enum Failure {
    /// An error returned by user code.
    #[error(transparent)]
    Error(#[from] anyhow::Error),

    /// A panic caught at the pipeline boundary.
    #[error("{message}")]
    Panic {
        /// The panic message, when the payload was a string.
        message: String,
    },
}

impl Failure {
    /// Builds a failure from a payload returned by `std::panic::catch_unwind`.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::Panic {
            message: panic_message(payload.as_ref()),
        }
    }

    /// Returns `"panic"` or `"error"`, used as the `cause` metadata value.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Panic { .. } => "panic",
        }
    }

    /// Returns `true` if the failure was a caught panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panic { .. })
    }
}

/// Describes a panic payload without consuming it.
///
/// String payloads are returned as is; any other payload type is described
/// with a fixed placeholder.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| OPAQUE_PANIC.to_string())
}
