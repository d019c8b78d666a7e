//! Structured logging for the Hermes RPC framework.
//!
//! Hermes logs through `tracing`. This crate installs the subscriber:
//!
//! - **JSON** output for production, one object per line
//! - **Pretty** or **compact** output for development
//! - An `EnvFilter` driven by a directive string such as `"info"` or
//!   `"hermes_server=debug,warn"`
//!
//! The dispatch pipeline opens one `rpc` span per request carrying the
//! request id, HTTP method and path, so every event inside a call is
//! correlated. Field names are listed in [`logging::fields`].
//!
//! # Example
//!
//! ```rust,no_run
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! # Ok::<(), hermes_telemetry::TelemetryError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
