//! Typed configuration for Aegis.
//!
//! This crate provides a strongly-typed configuration for the exception
//! handling pipeline with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [exception_handler]
//! enabled = true
//! log_unmapped = true
//! handler_failure_description = "server error while handling exception"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables of the form
//! `PREFIX__SECTION__KEY`, for example:
//!
//! - `AEGIS__EXCEPTION_HANDLER__ENABLED=false`
//! - `AEGIS__LOGGING__LEVEL=aegis_interceptor=trace,info`
//! - `AEGIS__METRICS__ENABLED=true`

#![doc(html_root_url = "https://docs.rs/aegis-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::AegisConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ExceptionHandlerConfig, LogFormat, LoggingConfig, MetricsConfig};
