//! Typed configuration for Hermes.
//!
//! Supports:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! [`HermesConfig`] has two sections:
//!
//! - [`ServiceSettings`] - Dispatch pipeline settings
//! - [`LoggingSettings`] - Log level, format and service name
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! hermes_telemetry::init_logging(&config.logging.to_log_config()).ok();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [service]
//! raise_exceptions = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! service_name = "haberdasher"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values are overridden with `PREFIX__SECTION__KEY`, for example:
//!
//! - `HERMES__SERVICE__RAISE_EXCEPTIONS=true`
//! - `HERMES__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HermesConfig;
pub use error::ConfigError;
pub use hermes_telemetry::LogFormat;
pub use loader::ConfigLoader;
pub use schema::{LoggingSettings, ServiceSettings};
