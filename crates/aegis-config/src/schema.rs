//! Configuration section types.

use aegis_advice::DEFAULT_FAILURE_DESCRIPTION;
use aegis_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Exception handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExceptionHandlerConfig {
    /// Install the exception handling interceptor.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log errors that no handler is bound for at error level.
    #[serde(default = "default_true")]
    pub log_unmapped: bool,

    /// Status message sent when a handler method fails.
    #[serde(default = "default_handler_failure_description")]
    pub handler_failure_description: String,
}

impl Default for ExceptionHandlerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_unmapped: true,
            handler_failure_description: default_handler_failure_description(),
        }
    }
}

fn default_handler_failure_description() -> String {
    DEFAULT_FAILURE_DESCRIPTION.to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g. "info" or "aegis_interceptor=trace,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the subscriber settings used by
    /// [`aegis_telemetry::init_logging`].
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            file_line_info: self.include_location,
            include_target: true,
            ansi_enabled: self.ansi_enabled,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Record exception handling metrics.
    #[serde(default)]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_handler_defaults() {
        let config = ExceptionHandlerConfig::default();
        assert!(config.enabled);
        assert!(config.log_unmapped);
        assert_eq!(config.handler_failure_description, DEFAULT_FAILURE_DESCRIPTION);
        assert_eq!(
            config.handler_failure_description,
            "server error while handling exception"
        );
    }

    #[test]
    fn test_exception_handler_partial_deserialize() {
        let config: ExceptionHandlerConfig = toml::from_str("log_unmapped = false").unwrap();
        assert!(config.enabled);
        assert!(!config.log_unmapped);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ExceptionHandlerConfig, _> = toml::from_str("enable = false");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_deserialize() {
        let config: LoggingConfig = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_to_log_config() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            ..Default::default()
        };
        let log = config.to_log_config();

        assert_eq!(log.level, "debug");
        assert!(!log.json_format);
        assert!(log.file_line_info);
    }

    #[test]
    fn test_metrics_disabled_by_default() {
        assert!(!MetricsConfig::default().enabled);
    }
}
