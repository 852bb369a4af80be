//! # Aegis Test
//!
//! Test utilities for Aegis, providing in-memory stand-ins for the RPC
//! runtime so interceptors can be exercised without a transport.
//!
//! ## Key Features
//!
//! - **Recording Call**: [`MockServerCall`] records headers, messages and closes
//! - **Scripted Listener**: [`ScriptedListener`] fails or panics on chosen events
//! - **Service Double**: [`TestService`] starts, fails or panics on call start
//! - **Counting Handler**: [`CountingHandler`] records dispatched errors
//!
//! ## Example
//!
//! ```
//! use aegis_core::{ErrorType, Fault, MetadataMap};
//! use aegis_interceptor::{
//!     ExceptionHandlerInterceptor, InterceptorChain, Listener, ServerCallHandler,
//! };
//! use aegis_test::{CountingHandler, ListenerEvent, MockServerCall, ScriptedListener, TestService};
//! use std::sync::Arc;
//! use tonic::Code;
//!
//! let listener = Arc::new(
//!     ScriptedListener::<()>::new()
//!         .fail_on(ListenerEvent::HalfClose, Fault::new(ErrorType::ANY, "boom")),
//! );
//! let handler = Arc::new(CountingHandler::unmapped());
//! let chain = InterceptorChain::builder(TestService::<(), ()>::listening(listener))
//!     .interceptor(ExceptionHandlerInterceptor::new(handler.clone()))
//!     .build();
//!
//! let call = MockServerCall::<(), ()>::unary("svc/Method");
//! let wrapped = chain.start_call(call.clone(), &MetadataMap::new()).unwrap();
//! wrapped.on_half_close().unwrap();
//!
//! assert_eq!(handler.invocations(), 1);
//! assert_eq!(call.last_close().unwrap().code(), Code::Unknown);
//! ```

#![doc(html_root_url = "https://docs.rs/aegis-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod call;
mod handler;
mod listener;

pub use call::{MockServerCall, RecordedClose};
pub use handler::{CountingHandler, TestService};
pub use listener::{ListenerEvent, ScriptedListener};
