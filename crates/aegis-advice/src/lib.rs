//! # Aegis Advice
//!
//! Exception advice: handler methods grouped on provider objects, bound to
//! error types once at startup and dispatched per failing call.
//!
//! - [`ExceptionAdvice`] / [`HandlerMethod`] - Explicit handler registration
//! - [`HandlerRegistry`] - Immutable error type to handler index
//! - [`HandlerResolver`] - Closest-ancestor resolution
//! - [`AdviceExceptionHandler`] - Dispatch with outcome normalization
//!
//! ## Example
//!
//! ```
//! use aegis_advice::{
//!     AdviceExceptionHandler, ExceptionAdvice, HandlerMethod, HandlerOutcome, HandlerRegistry,
//!     HandlerResolver,
//! };
//! use aegis_core::{ErrorType, ExceptionHandler, Fault, TypeHierarchy};
//! use std::sync::Arc;
//! use tonic::{Code, Status};
//!
//! const VALIDATION: ErrorType = ErrorType::new("Validation");
//! const MISSING_FIELD: ErrorType = ErrorType::new("MissingField");
//!
//! struct ValidationAdvice;
//!
//! impl ExceptionAdvice for ValidationAdvice {
//!     fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
//!         vec![HandlerMethod::new("validation", |_: &Self, args| {
//!             let error = args.require_error()?;
//!             Ok(Some(HandlerOutcome::Status(Status::invalid_argument(error.to_string()))))
//!         })
//!         .param(VALIDATION)]
//!     }
//! }
//!
//! let hierarchy = TypeHierarchy::builder()
//!     .declare(MISSING_FIELD, [VALIDATION])
//!     .build()?;
//! let registry = HandlerRegistry::builder(Arc::new(hierarchy))
//!     .advice(Arc::new(ValidationAdvice))?
//!     .build();
//! let handler = AdviceExceptionHandler::new(HandlerResolver::new(Arc::new(registry)));
//!
//! let outcome = handler
//!     .handle_exception(&Fault::new(MISSING_FIELD, "name"))
//!     .expect("mapped");
//! assert_eq!(outcome.code(), Code::InvalidArgument);
//! # Ok::<(), aegis_core::ConfigurationError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/aegis-advice/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod advice;
mod dispatcher;
mod method;
mod registry;
mod resolver;

pub use advice::ExceptionAdvice;
pub use dispatcher::{AdviceExceptionHandler, DEFAULT_FAILURE_DESCRIPTION};
pub use method::{HandlerArgs, HandlerMethod, HandlerOutcome, HandlerResult};
pub use registry::{HandlerBinding, HandlerRegistry, HandlerRegistryBuilder};
pub use resolver::HandlerResolver;
