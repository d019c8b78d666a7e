//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use hermes_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// Service configuration section.
///
/// Controls how the dispatch pipeline treats unexpected failures.
///
/// # Example
///
/// ```
/// use hermes_config::ServiceSettings;
///
/// let settings = ServiceSettings::default();
/// assert!(!settings.raise_exceptions);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ServiceSettings {
    /// Return unexpected failures to the caller instead of answering with a
    /// 500 `internal` error. Only meant for test harnesses.
    #[serde(default)]
    pub raise_exceptions: bool,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include span open/close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Service name announced in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            span_events: false,
            include_location: false,
            service_name: default_service_name(),
        }
    }
}

impl LoggingSettings {
    /// Converts the section into a logging setup for `hermes-telemetry`.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::LoggingSettings;
    ///
    /// let log_config = LoggingSettings::default().to_log_config();
    /// assert_eq!(log_config.level, "info");
    /// ```
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ansi: self.ansi_enabled,
            span_events: self.span_events,
            include_location: self.include_location,
            service_name: self.service_name.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "hermes-service".to_string()
}
