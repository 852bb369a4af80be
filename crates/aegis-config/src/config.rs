//! Main configuration type.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ExceptionHandlerConfig, LoggingConfig, MetricsConfig};

/// Complete Aegis configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use aegis_config::AegisConfig;
///
/// let config = AegisConfig::default();
/// assert!(config.exception_handler.enabled);
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AegisConfig {
    /// Exception handling configuration.
    #[serde(default)]
    pub exception_handler: ExceptionHandlerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AegisConfig {
    /// Configuration with the exception handling interceptor turned off.
    #[must_use]
    pub fn disabled() -> Self {
        let mut config = Self::default();
        config.exception_handler.enabled = false;
        config
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The log level is not a valid filter directive
    /// - The handler failure description is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = aegis_telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        if self
            .exception_handler
            .handler_failure_description
            .trim()
            .is_empty()
        {
            return Err(ConfigError::invalid_value(
                "exception_handler.handler_failure_description",
                "must not be empty",
            ));
        }

        Ok(())
    }
}
