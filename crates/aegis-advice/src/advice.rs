//! The exception advice provider trait.

use crate::HandlerMethod;

/// A provider grouping one or more exception handler methods.
///
/// Advice instances are registered with a
/// [`HandlerRegistry`](crate::HandlerRegistry) once at startup. The
/// registry calls [`exception_handlers`](Self::exception_handlers) a single
/// time per instance and binds each returned method to the instance.
///
/// # Example
///
/// ```
/// use aegis_advice::{ExceptionAdvice, HandlerMethod, HandlerOutcome};
/// use aegis_core::ErrorType;
/// use tonic::Status;
///
/// const NOT_FOUND: ErrorType = ErrorType::new("NotFound");
///
/// struct LookupAdvice {
///     resource: &'static str,
/// }
///
/// impl ExceptionAdvice for LookupAdvice {
///     fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
///         vec![HandlerMethod::new("handle_not_found", |advice: &Self, _args| {
///             Ok(Some(HandlerOutcome::Status(Status::not_found(advice.resource))))
///         })
///         .param(NOT_FOUND)]
///     }
/// }
///
/// let advice = LookupAdvice { resource: "user" };
/// assert_eq!(advice.exception_handlers().len(), 1);
/// ```
pub trait ExceptionAdvice: Send + Sync + Sized + 'static {
    /// Returns the exception handler methods this advice provides.
    fn exception_handlers(&self) -> Vec<HandlerMethod<Self>>;

    /// Returns the name used for this advice in diagnostics.
    ///
    /// The name does not identify the advice: registering another instance
    /// of the same type is a no-op, while a different type with the same
    /// name conflicts like any other advice.
    fn advice_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
