//! Top-level configuration type.

use hermes_telemetry::{create_env_filter, LogFormat};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingSettings, ServiceSettings};

/// Complete Hermes configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert!(!config.service.raise_exceptions);
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Dispatch pipeline settings.
    #[serde(default)]
    pub service: ServiceSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl HermesConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `logging.level` is not a valid filter directive
    /// - `logging.service_name` is blank while logging is enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        if self.logging.enabled && self.logging.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.service_name",
                "must not be empty when logging is enabled",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty colored logs at debug level, with failures raised to the caller.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::HermesConfig;
    ///
    /// let config = HermesConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.service.raise_exceptions);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.service.raise_exceptions = true;

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.span_events = true;
        config.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, LogFormat};
    ///
    /// let config = HermesConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// assert!(!config.service.raise_exceptions);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.service.raise_exceptions = false;

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;
        config.logging.span_events = false;

        config
    }
}
