//! # Aegis Interceptor
//!
//! The server interceptor that guarantees every RPC call is closed with a
//! structured status, whatever the application raised.
//!
//! - [`ExceptionHandlerInterceptor`] - Wraps calls and listeners at the outermost position
//! - [`ExceptionHandledCall`] - Resolves errors escaping through `close`
//! - [`ExceptionHandlerListener`] - Resolves errors raised by lifecycle hooks
//! - [`FallbackHandler`] - Derives a status when nothing mapped the error
//! - [`CallState`] - At-most-once error dispatch per call
//! - [`InterceptorChain`] - Ordered interceptors in front of a service
//!
//! The call primitives ([`ServerCall`], [`Listener`],
//! [`ServerCallHandler`]) are the contract an RPC runtime adaptor
//! implements.

#![doc(html_root_url = "https://docs.rs/aegis-interceptor/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod call;
mod chain;
mod fallback;
mod handled_call;
mod interceptor;
mod listener;
mod state;

pub use call::{
    CallError, Listener, MethodDescriptor, MethodType, NoopListener, ServerCall, ServerCallHandler,
    SharedCall, SharedListener,
};
pub use chain::{BoxedInterceptor, InterceptorChain, InterceptorChainBuilder};
pub use fallback::FallbackHandler;
pub use handled_call::ExceptionHandledCall;
pub use interceptor::{
    ExceptionHandlerInterceptor, ServerInterceptor, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE,
};
pub use listener::ExceptionHandlerListener;
pub use state::{CallPhase, CallState};
