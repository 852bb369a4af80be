//! # Aegis
//!
//! **Exception-to-status mapping for RPC services**
//!
//! Aegis turns errors raised anywhere in a server call's lifecycle into a
//! single well-defined status close:
//!
//! - **Exception Advice** – Handler methods grouped on provider objects,
//!   resolved by closest error-type ancestor
//! - **Call Interception** – Start, listener and close failures funnelled
//!   through the handler exactly once
//! - **Safe Fallback** – Unmapped errors and failing handlers still produce
//!   a status
//! - **Observability** – Structured logging and Prometheus counters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aegis::prelude::*;
//! use aegis_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().with_env_prefix("AEGIS").load()?;
//! aegis::init_telemetry(&config)?;
//!
//! let chain = InterceptorChain::builder(service)
//!     .interceptor(ExceptionHandling::new(&config).advice(MyAdvice).build()?.unwrap())
//!     .build();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! runtime → ExceptionHandlerInterceptor → other interceptors → service
//!                 │ wraps call + listener
//!                 ▼
//!           FallbackHandler → CompositeExceptionHandler → AdviceExceptionHandler
//!                 │                                            │ HandlerResolver
//!                 ▼                                            ▼
//!           derive_status                               HandlerRegistry
//! ```

#![doc(html_root_url = "https://docs.rs/aegis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod wiring;

pub use wiring::{init_telemetry, ExceptionHandling};

// Re-export core types
pub use aegis_core as core;

// Re-export advice types
pub use aegis_advice as advice;

// Re-export interceptor types
pub use aegis_interceptor as interceptor;

// Re-export configuration types
pub use aegis_config as config;

// Re-export telemetry types
pub use aegis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use aegis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::ExceptionHandling;

    pub use aegis_core::{
        derive_status, ConfigurationError, DispatchObserver, ErrorType, ExceptionHandler, Fault,
        MetadataMap, StatusError, TypeHierarchy,
    };

    pub use aegis_advice::{
        AdviceExceptionHandler, ExceptionAdvice, HandlerArgs, HandlerMethod, HandlerOutcome,
        HandlerResult,
    };

    pub use aegis_interceptor::{
        ExceptionHandlerInterceptor, InterceptorChain, Listener, ServerCall, ServerCallHandler,
        ServerInterceptor, SharedCall, SharedListener,
    };

    pub use aegis_config::{AegisConfig, ConfigLoader};
}
