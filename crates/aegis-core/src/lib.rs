//! # Aegis Core
//!
//! Core types and traits for the Aegis exception-to-status mapping layer.
//!
//! This crate provides the foundational types used throughout Aegis:
//!
//! - [`ErrorType`] / [`TypeHierarchy`] - Error type identifiers and their explicit ancestry
//! - [`Fault`] - The application error raised during a call
//! - [`StatusError`] - A status with trailers, the outcome of exception handling
//! - [`ExceptionHandler`] - The extension point mapping faults to statuses
//! - [`DispatchObserver`] - Injected observer for handling decisions
//! - [`ConfigurationError`] - Fatal startup errors

#![doc(html_root_url = "https://docs.rs/aegis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod error_type;
mod fault;
mod handler;
pub mod observer;
mod status;

pub use error::{ConfigurationError, ConfigurationResult};
pub use error_type::{ErrorType, TypeHierarchy, TypeHierarchyBuilder};
pub use fault::{Fault, SharedError};
pub use handler::{CompositeExceptionHandler, ExceptionHandler};
pub use observer::{DispatchObserver, NoopObserver, TracingObserver};
pub use status::{derive_status, merge_metadata, StatusError};

// Re-export the status types handlers construct.
pub use tonic::metadata::MetadataMap;
pub use tonic::{Code, Status};
