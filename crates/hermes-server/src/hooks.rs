//! Service hooks.
//!
//! Hooks observe (and in the case of before hooks, gate) every call:
//!
//! - **before**: runs after routing, before the handler; may short-circuit
//!   with a [`TwirpError`]
//! - **on_success**: runs after the handler produced an output
//! - **on_error**: runs before any error response is emitted
//! - **exception_raised**: runs when an unexpected failure reaches the
//!   pipeline boundary
//!
//! Each list runs in registration order. Hooks are collected on a [`Hooks`]
//! value (or directly on the service builder) and frozen when the service is
//! built.
//!
//! # Example
//!
//! ```rust
//! use hermes_server::Hooks;
//! use hermes_core::TwirpError;
//!
//! let hooks = Hooks::new()
//!     .before(|request, _ctx| {
//!         if request.headers().contains_key("authorization") {
//!             Ok(None)
//!         } else {
//!             Ok(Some(TwirpError::unauthenticated("missing credentials")))
//!         }
//!     })
//!     .on_error(|err, _ctx| {
//!         eprintln!("rpc failed: {err}");
//!         Ok(())
//!     });
//!
//! assert_eq!(hooks.before_count(), 1);
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use http::Request;

use hermes_core::{Failure, RpcContext, TwirpError};

/// A hook run before the handler.
///
/// Returning `Ok(Some(err))` skips the handler and responds with `err`.
pub type BeforeHook = Arc<
    dyn Fn(&Request<Bytes>, &mut RpcContext) -> anyhow::Result<Option<TwirpError>> + Send + Sync,
>;

/// A hook run after the handler produced an output.
pub type SuccessHook = Arc<dyn Fn(&RpcContext) -> anyhow::Result<()> + Send + Sync>;

/// A hook run before an error response is emitted.
pub type ErrorHook = Arc<dyn Fn(&TwirpError, &RpcContext) -> anyhow::Result<()> + Send + Sync>;

/// A hook run when an unexpected failure is caught.
pub type ExceptionHook = Arc<dyn Fn(&Failure, &RpcContext) -> anyhow::Result<()> + Send + Sync>;

/// Ordered hook lists of a service.
#[derive(Clone, Default)]
#[must_use]
pub struct Hooks {
    before: Vec<(String, BeforeHook)>,
    on_success: Vec<(String, SuccessHook)>,
    on_error: Vec<(String, ErrorHook)>,
    exception_raised: Vec<(String, ExceptionHook)>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.len())
            .field("on_success", &self.on_success.len())
            .field("on_error", &self.on_error.len())
            .field("exception_raised", &self.exception_raised.len())
            .finish()
    }
}

impl Hooks {
    /// Creates empty hook lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a before hook.
    pub fn before<F>(self, hook: F) -> Self
    where
        F: Fn(&Request<Bytes>, &mut RpcContext) -> anyhow::Result<Option<TwirpError>>
            + Send
            + Sync
            + 'static,
    {
        let name = format!("before_{}", self.before.len());
        self.before_named(name, hook)
    }

    /// Appends a named before hook.
    ///
    /// Like `before` but with a custom name for logging.
    pub fn before_named<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Request<Bytes>, &mut RpcContext) -> anyhow::Result<Option<TwirpError>>
            + Send
            + Sync
            + 'static,
    {
        self.before.push((name.into(), Arc::new(hook)));
        self
    }

    /// Appends an on_success hook.
    pub fn on_success<F>(self, hook: F) -> Self
    where
        F: Fn(&RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = format!("on_success_{}", self.on_success.len());
        self.on_success_named(name, hook)
    }

    /// Appends a named on_success hook.
    pub fn on_success_named<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_success.push((name.into(), Arc::new(hook)));
        self
    }

    /// Appends an on_error hook.
    pub fn on_error<F>(self, hook: F) -> Self
    where
        F: Fn(&TwirpError, &RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = format!("on_error_{}", self.on_error.len());
        self.on_error_named(name, hook)
    }

    /// Appends a named on_error hook.
    pub fn on_error_named<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&TwirpError, &RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_error.push((name.into(), Arc::new(hook)));
        self
    }

    /// Appends an exception_raised hook.
    pub fn exception_raised<F>(self, hook: F) -> Self
    where
        F: Fn(&Failure, &RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = format!("exception_raised_{}", self.exception_raised.len());
        self.exception_raised_named(name, hook)
    }

    /// Appends a named exception_raised hook.
    pub fn exception_raised_named<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Failure, &RpcContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.exception_raised.push((name.into(), Arc::new(hook)));
        self
    }

    /// Returns the number of before hooks.
    pub fn before_count(&self) -> usize {
        self.before.len()
    }

    /// Returns the number of on_success hooks.
    pub fn on_success_count(&self) -> usize {
        self.on_success.len()
    }

    /// Returns the number of on_error hooks.
    pub fn on_error_count(&self) -> usize {
        self.on_error.len()
    }

    /// Returns the number of exception_raised hooks.
    pub fn exception_raised_count(&self) -> usize {
        self.exception_raised.len()
    }

    /// Appends another set of hooks after this one's.
    pub fn merge(mut self, other: Hooks) -> Self {
        self.before.extend(other.before);
        self.on_success.extend(other.on_success);
        self.on_error.extend(other.on_error);
        self.exception_raised.extend(other.exception_raised);
        self
    }

    /// Runs before hooks in order, stopping at the first that returns an
    /// error response.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure; later hooks do not run.
    pub fn run_before(
        &self,
        request: &Request<Bytes>,
        ctx: &mut RpcContext,
    ) -> Result<Option<TwirpError>, Failure> {
        for (name, hook) in &self.before {
            tracing::trace!(hook = %name, "running before hook");
            if let Some(err) = hook(request, ctx).map_err(|e| hook_failed(name, e))? {
                tracing::debug!(hook = %name, code = %err.code(), "before hook short-circuited");
                return Ok(Some(err));
            }
        }
        Ok(None)
    }

    /// Runs on_success hooks in order.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure.
    pub fn run_on_success(&self, ctx: &RpcContext) -> Result<(), Failure> {
        for (name, hook) in &self.on_success {
            tracing::trace!(hook = %name, "running on_success hook");
            hook(ctx).map_err(|e| hook_failed(name, e))?;
        }
        Ok(())
    }

    /// Runs on_error hooks in order.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure.
    pub fn run_on_error(&self, err: &TwirpError, ctx: &RpcContext) -> Result<(), Failure> {
        for (name, hook) in &self.on_error {
            tracing::trace!(hook = %name, "running on_error hook");
            hook(err, ctx).map_err(|e| hook_failed(name, e))?;
        }
        Ok(())
    }

    /// Runs every exception_raised hook with the original failure and
    /// returns the effective failure.
    ///
    /// Each hook is isolated: a hook that fails or panics does not stop the
    /// rest. The last hook failure replaces `failure`; without hook failures
    /// `failure` is returned unchanged.
    pub fn run_exception_raised(&self, failure: Failure, ctx: &RpcContext) -> Failure {
        let mut effective = None;
        for (name, hook) in &self.exception_raised {
            tracing::trace!(hook = %name, "running exception_raised hook");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook(&failure, ctx)));
            let hook_failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => hook_failed(name, e),
                Err(payload) => Failure::from_panic(payload),
            };
            tracing::warn!(hook = %name, error = %hook_failure, "exception_raised hook failed");
            effective = Some(hook_failure);
        }
        effective.unwrap_or(failure)
    }
}

fn hook_failed(name: &str, error: anyhow::Error) -> Failure {
    tracing::warn!(hook = %name, error = %error, "hook failed");
    Failure::from(error)
}
