//! # Aegis Telemetry
//!
//! Observability for the Aegis exception handling pipeline.
//!
//! ## Features
//!
//! - **Logging**: `tracing-subscriber` installation with JSON or pretty output
//! - **Metrics**: a [`MetricsObserver`] counting handling outcomes and status
//!   codes, exposed in Prometheus text format
//!
//! ## Example
//!
//! ```rust,ignore
//! use aegis_telemetry::{init_logging, init_metrics, LogConfig, MetricsObserver};
//!
//! init_logging(&LogConfig::production())?;
//! init_metrics()?;
//!
//! let observer = Arc::new(MetricsObserver::new());
//! ```

#![doc(html_root_url = "https://docs.rs/aegis-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};
pub use self::metrics::{init_metrics, render_metrics, MetricsObserver};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
