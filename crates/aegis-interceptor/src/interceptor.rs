//! Server interceptors and the exception handling interceptor.

use crate::{
    ExceptionHandledCall, ExceptionHandlerListener, FallbackHandler, NoopListener,
    ServerCallHandler, SharedCall, SharedListener,
};
use aegis_core::{DispatchObserver, ExceptionHandler, Fault, MetadataMap, TracingObserver};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Order of an interceptor that wraps every other interceptor.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Order of an interceptor that runs closest to the service.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Intercepts calls before they reach the service handler.
///
/// Interceptors are ordered by [`order`](Self::order): lower values run
/// further out and observe everything raised by interceptors after them.
pub trait ServerInterceptor<Req, Resp>: Send + Sync {
    /// Returns the name of this interceptor.
    ///
    /// This name is used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Returns the position of this interceptor in a chain.
    fn order(&self) -> i32 {
        0
    }

    /// Intercepts `call`, usually by delegating to `next`.
    fn intercept_call(
        &self,
        call: SharedCall<Req, Resp>,
        headers: &MetadataMap,
        next: &dyn ServerCallHandler<Req, Resp>,
    ) -> Result<SharedListener<Req>, Fault>;
}

/// Guarantees that every call closes with a resolved status.
///
/// The interceptor wraps the call in an [`ExceptionHandledCall`] and its
/// listener in an [`ExceptionHandlerListener`]. Errors raised while
/// starting the call are resolved and the call is closed directly; the
/// runtime then gets a [`NoopListener`].
///
/// It runs at [`HIGHEST_PRECEDENCE`].
#[derive(Clone)]
pub struct ExceptionHandlerInterceptor {
    handler: Arc<dyn ExceptionHandler>,
    observer: Arc<dyn DispatchObserver>,
}

impl ExceptionHandlerInterceptor {
    /// Creates an interceptor resolving errors through `handler`.
    #[must_use]
    pub fn new(handler: Arc<dyn ExceptionHandler>) -> Self {
        Self {
            handler,
            observer: Arc::new(TracingObserver::new()),
        }
    }

    /// Replaces the observer notified of fallback decisions.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the fallback policy used for each call.
    #[must_use]
    pub fn fallback(&self) -> FallbackHandler {
        FallbackHandler::new(Arc::clone(&self.handler), Arc::clone(&self.observer))
    }
}

impl<Req, Resp> ServerInterceptor<Req, Resp> for ExceptionHandlerInterceptor
where
    Req: 'static,
    Resp: 'static,
{
    fn name(&self) -> &'static str {
        "exception-handler"
    }

    fn order(&self) -> i32 {
        HIGHEST_PRECEDENCE
    }

    fn intercept_call(
        &self,
        call: SharedCall<Req, Resp>,
        headers: &MetadataMap,
        next: &dyn ServerCallHandler<Req, Resp>,
    ) -> Result<SharedListener<Req>, Fault> {
        let handled = Arc::new(ExceptionHandledCall::new(call, self.fallback()));
        let downstream: SharedCall<Req, Resp> = handled.clone();

        let started = catch_unwind(AssertUnwindSafe(|| next.start_call(downstream, headers)))
            .unwrap_or_else(|payload| Err(Fault::from_panic(payload)));

        match started {
            Ok(listener) => Ok(Arc::new(ExceptionHandlerListener::new(listener, handled))),
            Err(error) => {
                tracing::trace!(
                    error_type = %error.kind(),
                    error = %error,
                    "Failed to start exception handler call"
                );
                handled.handle_failure(&error)?;
                Ok(Arc::new(NoopListener))
            }
        }
    }
}

impl fmt::Debug for ExceptionHandlerInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandlerInterceptor")
            .finish_non_exhaustive()
    }
}
