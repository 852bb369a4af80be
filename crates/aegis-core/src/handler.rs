//! The exception handler extension point.
//!
//! An [`ExceptionHandler`] turns a [`Fault`] into a [`StatusError`], or
//! declines with `None` so that the caller can fall back to deriving a
//! status from the fault itself.

use crate::{Fault, StatusError};
use std::fmt;
use std::sync::Arc;

/// Converts application errors into RPC status outcomes.
///
/// Returning `None` means "no mapping": the error is not one this handler
/// knows about. Implementations must not panic; callers that cannot afford
/// a panic guard against it anyway.
///
/// Closures implement this trait:
///
/// ```
/// use aegis_core::{ErrorType, ExceptionHandler, Fault, StatusError};
/// use tonic::{Code, Status};
///
/// let handler = |fault: &Fault| -> Option<StatusError> {
///     (fault.kind() == ErrorType::PANIC).then(|| Status::internal("panicked").into())
/// };
///
/// let outcome = handler.handle_exception(&Fault::new(ErrorType::PANIC, "boom"));
/// assert_eq!(outcome.unwrap().code(), Code::Internal);
/// ```
pub trait ExceptionHandler: Send + Sync + 'static {
    /// Maps `error` to a status outcome, or returns `None` if unmapped.
    fn handle_exception(&self, error: &Fault) -> Option<StatusError>;
}

impl<F> ExceptionHandler for F
where
    F: Fn(&Fault) -> Option<StatusError> + Send + Sync + 'static,
{
    fn handle_exception(&self, error: &Fault) -> Option<StatusError> {
        self(error)
    }
}

/// Asks several handlers in order; the first outcome wins.
#[derive(Clone, Default)]
pub struct CompositeExceptionHandler {
    handlers: Vec<Arc<dyn ExceptionHandler>>,
}

impl CompositeExceptionHandler {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    #[must_use]
    pub fn with(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Returns the number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl FromIterator<Arc<dyn ExceptionHandler>> for CompositeExceptionHandler {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ExceptionHandler>>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl ExceptionHandler for CompositeExceptionHandler {
    fn handle_exception(&self, error: &Fault) -> Option<StatusError> {
        self.handlers
            .iter()
            .find_map(|handler| handler.handle_exception(error))
    }
}

impl fmt::Debug for CompositeExceptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeExceptionHandler")
            .field("handler_count", &self.handlers.len())
            .finish()
    }
}
