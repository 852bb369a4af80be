//! Exception dispatch to advice handler methods.

use crate::{HandlerOutcome, HandlerResolver, HandlerResult};
use aegis_core::{
    derive_status, DispatchObserver, ExceptionHandler, Fault, StatusError, TracingObserver,
};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tonic::Status;

/// Default description of the status produced when a handler method fails.
pub const DEFAULT_FAILURE_DESCRIPTION: &str = "server error while handling exception";

/// An [`ExceptionHandler`] that dispatches to advice handler methods.
///
/// `handle_exception` never panics and never fails:
///
/// - unmatched errors and handlers returning `Ok(None)` yield `None`;
/// - a handler returning an outcome yields the normalized status;
/// - a handler returning `Err` or panicking yields `INTERNAL`, with the
///   original error recorded as suppressed on the failure.
#[derive(Clone)]
pub struct AdviceExceptionHandler {
    resolver: HandlerResolver,
    observer: Arc<dyn DispatchObserver>,
    failure_description: String,
}

impl AdviceExceptionHandler {
    /// Creates a dispatcher that logs through `tracing`.
    #[must_use]
    pub fn new(resolver: HandlerResolver) -> Self {
        Self {
            resolver,
            observer: Arc::new(TracingObserver::new()),
            failure_description: DEFAULT_FAILURE_DESCRIPTION.to_string(),
        }
    }

    /// Replaces the observer notified of dispatch decisions.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Sets the description of the status produced when a handler fails.
    #[must_use]
    pub fn with_failure_description(mut self, description: impl Into<String>) -> Self {
        self.failure_description = description.into();
        self
    }

    /// Returns the resolver.
    #[must_use]
    pub fn resolver(&self) -> &HandlerResolver {
        &self.resolver
    }

    fn invoke(&self, error: &Fault) -> HandlerResult {
        let Some(binding) = self.resolver.resolve(error.kind()) else {
            return Ok(None);
        };
        tracing::trace!(
            error_type = %error.kind(),
            method = %binding.qualified_name(),
            "Invoking exception handler method"
        );
        let args = binding.bind(self.resolver.hierarchy(), error);
        match catch_unwind(AssertUnwindSafe(|| binding.invoke(&args))) {
            Ok(result) => result,
            Err(payload) => Err(Fault::from_panic(payload)),
        }
    }

    fn failure(&self, error: &Fault, failure: Fault) -> StatusError {
        let failure = if failure.same_as(error) {
            failure
        } else {
            failure.with_suppressed(error.clone())
        };
        self.observer.on_handler_failure(&failure);

        let mut status = Status::internal(self.failure_description.clone());
        status.set_source(Arc::new(failure));
        StatusError::from(status)
    }
}

fn normalize(outcome: HandlerOutcome) -> StatusError {
    match outcome {
        HandlerOutcome::Status(status) => StatusError::from(status),
        HandlerOutcome::StatusWithMetadata(error) => error,
        HandlerOutcome::Error(fault) => {
            let (status, _) = derive_status(&fault).into_parts();
            StatusError::from(status)
        }
    }
}

impl ExceptionHandler for AdviceExceptionHandler {
    fn handle_exception(&self, error: &Fault) -> Option<StatusError> {
        tracing::debug!(
            error_type = %error.kind(),
            error = %error,
            "Exception caught during call execution"
        );
        match self.invoke(error) {
            Ok(Some(outcome)) => {
                let outcome = normalize(outcome);
                self.observer.on_dispatch(error, &outcome);
                Some(outcome)
            }
            Ok(None) => None,
            Err(failure) => Some(self.failure(error, failure)),
        }
    }
}

impl fmt::Debug for AdviceExceptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceExceptionHandler")
            .field("resolver", &self.resolver)
            .field("failure_description", &self.failure_description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExceptionAdvice, HandlerMethod, HandlerRegistry};
    use aegis_core::{ErrorType, MetadataMap, TypeHierarchy};
    use parking_lot::Mutex;
    use std::error::Error;
    use tonic::Code;

    const ILLEGAL_ARGUMENT: ErrorType = ErrorType::new("IllegalArgument");
    const UNSUPPORTED: ErrorType = ErrorType::new("UnsupportedOperation");
    const NULL_POINTER: ErrorType = ErrorType::new("NullPointer");
    const RUNTIME: ErrorType = ErrorType::new("Runtime");
    const SILENT: ErrorType = ErrorType::new("Silent");
    const PANICKY: ErrorType = ErrorType::new("Panicky");
    const WRAPPED: ErrorType = ErrorType::new("Wrapped");
    const RETHROWN: ErrorType = ErrorType::new("Rethrown");

    struct TestAdvice;

    impl ExceptionAdvice for TestAdvice {
        fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
            vec![
                HandlerMethod::new("illegal_argument", |_: &Self, args| {
                    let error = args.require_error()?;
                    let mut trailers = MetadataMap::new();
                    trailers.insert("reason", "validation".parse().unwrap());
                    Ok(Some(HandlerOutcome::StatusWithMetadata(StatusError::new(
                        Status::invalid_argument(error.message().unwrap_or_default()),
                        trailers,
                    ))))
                })
                .param(ILLEGAL_ARGUMENT),
                HandlerMethod::new("unsupported", |_: &Self, _| {
                    Err(Fault::new(NULL_POINTER, "handler bug"))
                })
                .param(UNSUPPORTED),
                HandlerMethod::new("runtime", |_: &Self, _| {
                    Ok(Some(HandlerOutcome::Status(Status::unavailable("try later"))))
                })
                .param(RUNTIME),
                HandlerMethod::new("silent", |_: &Self, _| Ok(None)).param(SILENT),
                HandlerMethod::new("panicky", |_: &Self, _| panic!("handler panicked"))
                    .param(PANICKY),
                HandlerMethod::new("wrapped", |_: &Self, _| {
                    Ok(Some(HandlerOutcome::Error(Fault::from_status(
                        Status::permission_denied("nope"),
                    ))))
                })
                .param(WRAPPED),
                HandlerMethod::new("rethrown", |_: &Self, args| {
                    Err(args.require_error()?.clone())
                })
                .param(RETHROWN),
            ]
        }
    }

    #[derive(Default)]
    struct Recording {
        dispatched: Mutex<Vec<Code>>,
        failures: Mutex<Vec<Fault>>,
    }

    impl DispatchObserver for Recording {
        fn on_dispatch(&self, _error: &Fault, outcome: &StatusError) {
            self.dispatched.lock().push(outcome.code());
        }

        fn on_handler_failure(&self, failure: &Fault) {
            self.failures.lock().push(failure.clone());
        }
    }

    fn handler(observer: Arc<Recording>) -> AdviceExceptionHandler {
        let hierarchy = TypeHierarchy::builder()
            .declare(RUNTIME, [ErrorType::ANY])
            .declare(ILLEGAL_ARGUMENT, [RUNTIME])
            .declare(UNSUPPORTED, [RUNTIME])
            .build()
            .unwrap();
        let registry = HandlerRegistry::builder(Arc::new(hierarchy))
            .advice(Arc::new(TestAdvice))
            .unwrap()
            .build();
        AdviceExceptionHandler::new(HandlerResolver::new(Arc::new(registry)))
            .with_observer(observer)
    }

    #[test]
    fn test_status_with_metadata_keeps_trailers() {
        let observer = Arc::new(Recording::default());
        let handler = handler(observer.clone());

        let outcome = handler
            .handle_exception(&Fault::new(ILLEGAL_ARGUMENT, "bad input"))
            .unwrap();

        assert_eq!(outcome.code(), Code::InvalidArgument);
        assert_eq!(outcome.status().message(), "bad input");
        assert_eq!(outcome.trailers().get("reason").unwrap(), "validation");
        assert_eq!(*observer.dispatched.lock(), vec![Code::InvalidArgument]);
    }

    #[test]
    fn test_subtype_without_own_handler_uses_ancestor() {
        let handler = handler(Arc::new(Recording::default()));
        let outcome = handler.handle_exception(&Fault::bare(RUNTIME)).unwrap();
        assert_eq!(outcome.code(), Code::Unavailable);
        assert!(outcome.trailers().is_empty());
    }

    #[test]
    fn test_handler_error_becomes_internal_with_suppressed_original() {
        let observer = Arc::new(Recording::default());
        let handler = handler(observer.clone());
        let original = Fault::new(UNSUPPORTED, "not here");

        let outcome = handler.handle_exception(&original).unwrap();

        assert_eq!(outcome.code(), Code::Internal);
        assert_eq!(outcome.status().message(), DEFAULT_FAILURE_DESCRIPTION);
        let failures = observer.failures.lock();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), NULL_POINTER);
        assert_eq!(failures[0].suppressed().len(), 1);
        assert_eq!(failures[0].suppressed()[0].to_string(), original.to_string());
        assert!(outcome.status().source().is_some());
    }

    #[test]
    fn test_rethrown_original_is_not_suppressed_into_itself() {
        let observer = Arc::new(Recording::default());
        let handler = handler(observer.clone());

        let outcome = handler.handle_exception(&Fault::bare(RETHROWN)).unwrap();

        assert_eq!(outcome.code(), Code::Internal);
        assert!(observer.failures.lock()[0].suppressed().is_empty());
    }

    #[test]
    fn test_handler_panic_becomes_internal() {
        let observer = Arc::new(Recording::default());
        let handler = handler(observer.clone()).with_failure_description("handler crashed");

        let outcome = handler.handle_exception(&Fault::bare(PANICKY)).unwrap();

        assert_eq!(outcome.code(), Code::Internal);
        assert_eq!(outcome.status().message(), "handler crashed");
        assert_eq!(observer.failures.lock()[0].kind(), ErrorType::PANIC);
    }

    #[test]
    fn test_returning_nothing_is_unmapped() {
        let handler = handler(Arc::new(Recording::default()));
        assert!(handler.handle_exception(&Fault::bare(SILENT)).is_none());
    }

    #[test]
    fn test_unmatched_error_is_unmapped() {
        let handler = handler(Arc::new(Recording::default()));
        assert!(handler
            .handle_exception(&Fault::bare(ErrorType::new("Elsewhere")))
            .is_none());
    }

    #[test]
    fn test_error_outcome_derives_status() {
        let handler = handler(Arc::new(Recording::default()));
        let outcome = handler.handle_exception(&Fault::bare(WRAPPED)).unwrap();
        assert_eq!(outcome.code(), Code::PermissionDenied);
        assert_eq!(outcome.status().message(), "nope");
        assert!(outcome.trailers().is_empty());
    }
}
