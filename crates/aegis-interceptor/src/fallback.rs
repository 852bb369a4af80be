//! The terminal fallback policy.

use aegis_core::{derive_status, DispatchObserver, ExceptionHandler, Fault, StatusError};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Resolves every error to a status outcome.
///
/// The wrapped handler is asked first. If it declines, or panics, the
/// status is derived from the error's own cause chain with
/// [`derive_status`].
#[derive(Clone)]
pub struct FallbackHandler {
    handler: Arc<dyn ExceptionHandler>,
    observer: Arc<dyn DispatchObserver>,
}

impl FallbackHandler {
    /// Wraps a handler.
    #[must_use]
    pub fn new(handler: Arc<dyn ExceptionHandler>, observer: Arc<dyn DispatchObserver>) -> Self {
        Self { handler, observer }
    }

    /// Resolves `error` to an outcome. Never fails.
    #[must_use]
    pub fn resolve(&self, error: &Fault) -> StatusError {
        match catch_unwind(AssertUnwindSafe(|| self.handler.handle_exception(error))) {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                self.observer.on_unmapped(error);
                self.derive(error)
            }
            Err(payload) => {
                let panic = Fault::from_panic(payload);
                tracing::trace!(
                    error = %error,
                    panic = %panic,
                    "Handler unable to handle exception"
                );
                self.derive(error)
            }
        }
    }

    fn derive(&self, error: &Fault) -> StatusError {
        let outcome = derive_status(error);
        self.observer.on_fallback(error, &outcome);
        outcome
    }
}

impl ExceptionHandler for FallbackHandler {
    fn handle_exception(&self, error: &Fault) -> Option<StatusError> {
        Some(self.resolve(error))
    }
}

impl fmt::Debug for FallbackHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackHandler").finish_non_exhaustive()
    }
}
