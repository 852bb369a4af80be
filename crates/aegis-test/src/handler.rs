//! Exception handler and service doubles.

use aegis_core::{ExceptionHandler, Fault, MetadataMap, StatusError};
use aegis_interceptor::{ServerCallHandler, SharedCall, SharedListener};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps an [`ExceptionHandler`] and records every error it is asked about.
pub struct CountingHandler {
    inner: Arc<dyn ExceptionHandler>,
    seen: Mutex<Vec<Fault>>,
}

impl CountingHandler {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn ExceptionHandler>) -> Self {
        Self {
            inner,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Creates a handler that never maps anything.
    #[must_use]
    pub fn unmapped() -> Self {
        Self::new(Arc::new(|_: &Fault| -> Option<StatusError> { None }))
    }

    /// Returns how many times the handler was invoked.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.seen.lock().len()
    }

    /// Returns the errors the handler was invoked with.
    #[must_use]
    pub fn seen(&self) -> Vec<Fault> {
        self.seen.lock().clone()
    }
}

impl ExceptionHandler for CountingHandler {
    fn handle_exception(&self, error: &Fault) -> Option<StatusError> {
        self.seen.lock().push(error.clone());
        self.inner.handle_exception(error)
    }
}

impl fmt::Debug for CountingHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingHandler")
            .field("invocations", &self.invocations())
            .finish_non_exhaustive()
    }
}

enum Behavior<Req> {
    Listen(SharedListener<Req>),
    Fail(Fault),
    Panic(String),
}

/// A [`ServerCallHandler`] standing in for the service at the end of a chain.
///
/// It keeps the call it was started with, so tests can act on the call as
/// the service would (for example close it themselves).
pub struct TestService<Req, Resp> {
    behavior: Behavior<Req>,
    started: Mutex<Option<SharedCall<Req, Resp>>>,
    starts: AtomicUsize,
}

impl<Req, Resp> TestService<Req, Resp> {
    fn with(behavior: Behavior<Req>) -> Self {
        Self {
            behavior,
            started: Mutex::new(None),
            starts: AtomicUsize::new(0),
        }
    }

    /// Starts calls with `listener`.
    #[must_use]
    pub fn listening(listener: SharedListener<Req>) -> Self {
        Self::with(Behavior::Listen(listener))
    }

    /// Fails every start with `error`.
    #[must_use]
    pub fn failing(error: Fault) -> Self {
        Self::with(Behavior::Fail(error))
    }

    /// Panics on every start.
    #[must_use]
    pub fn panicking(message: impl Into<String>) -> Self {
        Self::with(Behavior::Panic(message.into()))
    }

    /// Returns the call most recently started, as seen by the service.
    #[must_use]
    pub fn started_call(&self) -> Option<SharedCall<Req, Resp>> {
        self.started.lock().clone()
    }

    /// Returns how many calls were started.
    #[must_use]
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl<Req, Resp> ServerCallHandler<Req, Resp> for TestService<Req, Resp> {
    fn start_call(
        &self,
        call: SharedCall<Req, Resp>,
        _headers: &MetadataMap,
    ) -> Result<SharedListener<Req>, Fault> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.started.lock() = Some(call);
        match &self.behavior {
            Behavior::Listen(listener) => Ok(Arc::clone(listener)),
            Behavior::Fail(error) => Err(error.clone()),
            Behavior::Panic(message) => panic!("{message}"),
        }
    }
}

impl<Req, Resp> fmt::Debug for TestService<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestService")
            .field("starts", &self.starts())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockServerCall;
    use aegis_core::ErrorType;
    use aegis_interceptor::{NoopListener, ServerCall};
    use tonic::{Code, Status};

    #[test]
    fn test_counting_handler_records_and_delegates() {
        let handler = CountingHandler::new(Arc::new(|_: &Fault| {
            Some(StatusError::from(Status::internal("mapped")))
        }));
        let outcome = handler.handle_exception(&Fault::bare(ErrorType::ANY)).unwrap();

        assert_eq!(outcome.code(), Code::Internal);
        assert_eq!(handler.invocations(), 1);
        assert_eq!(handler.seen()[0].kind(), ErrorType::ANY);
        assert!(CountingHandler::unmapped()
            .handle_exception(&Fault::bare(ErrorType::ANY))
            .is_none());
    }

    #[test]
    fn test_service_keeps_started_call() {
        let service = TestService::<(), ()>::listening(Arc::new(NoopListener));
        let call = MockServerCall::<(), ()>::unary("svc/M");

        assert!(service.start_call(call, &MetadataMap::new()).is_ok());
        assert_eq!(service.starts(), 1);
        assert_eq!(
            service.started_call().unwrap().method_descriptor().full_name(),
            "svc/M"
        );
    }

    #[test]
    fn test_failing_service() {
        let service = TestService::<(), ()>::failing(Fault::new(ErrorType::ANY, "no"));
        let call = MockServerCall::<(), ()>::unary("svc/M");
        assert!(service.start_call(call, &MetadataMap::new()).is_err());
    }
}
