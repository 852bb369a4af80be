//! Handler method descriptors.
//!
//! A [`HandlerMethod`] is the explicit registration-time description of one
//! exception handling function on an advice type: the error types it
//! handles, the parameter types it declares, and the function itself.

use aegis_core::{ErrorType, Fault, StatusError};
use std::fmt;
use std::sync::Arc;
use tonic::Status;

/// What a handler method returns when it succeeds.
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    /// A bare status; the call is closed with empty trailers.
    Status(Status),
    /// A status with its own trailers.
    StatusWithMetadata(StatusError),
    /// A generic error; the status is derived from its cause chain.
    Error(Fault),
}

impl From<Status> for HandlerOutcome {
    fn from(status: Status) -> Self {
        Self::Status(status)
    }
}

impl From<StatusError> for HandlerOutcome {
    fn from(error: StatusError) -> Self {
        Self::StatusWithMetadata(error)
    }
}

impl From<Fault> for HandlerOutcome {
    fn from(fault: Fault) -> Self {
        Self::Error(fault)
    }
}

/// Result of invoking a handler method.
///
/// - `Ok(Some(_))`: the error was mapped.
/// - `Ok(None)`: the method returned nothing; treated as unmapped.
/// - `Err(_)`: the method itself failed.
pub type HandlerResult = Result<Option<HandlerOutcome>, Fault>;

/// Arguments passed to a handler method.
///
/// There is one slot per declared parameter. Only the first parameter
/// whose type is equal to or an ancestor of the error's type receives the
/// error; every other slot stays empty, even if it could also accept it.
#[derive(Debug, Clone, Default)]
pub struct HandlerArgs {
    slots: Vec<Option<Fault>>,
}

impl HandlerArgs {
    pub(crate) fn new(slots: Vec<Option<Fault>>) -> Self {
        Self { slots }
    }

    /// Returns the argument bound to parameter `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Fault> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Returns the error being handled, if a parameter accepted it.
    #[must_use]
    pub fn error(&self) -> Option<&Fault> {
        self.slots.iter().flatten().next()
    }

    /// Returns the error being handled or a failure describing its absence.
    pub fn require_error(&self) -> Result<&Fault, Fault> {
        self.error().ok_or_else(|| {
            Fault::new(
                ErrorType::ILLEGAL_STATE,
                "handler invoked without an exception argument",
            )
        })
    }

    /// Returns the number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the method declares no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

pub(crate) type MethodFn<A> = Arc<dyn Fn(&A, &HandlerArgs) -> HandlerResult + Send + Sync>;

/// Description of one exception handling method of advice type `A`.
///
/// # Example
///
/// ```
/// use aegis_advice::{HandlerMethod, HandlerOutcome};
/// use aegis_core::ErrorType;
/// use tonic::Status;
///
/// const INVALID_ARGUMENT: ErrorType = ErrorType::new("InvalidArgument");
///
/// struct ValidationAdvice;
///
/// let method = HandlerMethod::new("handle_invalid_argument", |_: &ValidationAdvice, args| {
///     let error = args.require_error()?;
///     Ok(Some(HandlerOutcome::Status(Status::invalid_argument(
///         error.message().unwrap_or_default(),
///     ))))
/// })
/// .param(INVALID_ARGUMENT);
///
/// assert_eq!(method.name(), "handle_invalid_argument");
/// assert_eq!(method.params(), &[INVALID_ARGUMENT]);
/// ```
pub struct HandlerMethod<A> {
    name: &'static str,
    handles: Vec<ErrorType>,
    params: Vec<ErrorType>,
    func: MethodFn<A>,
}

impl<A> HandlerMethod<A> {
    /// Creates a method descriptor with no parameters and no listed types.
    pub fn new<F>(name: &'static str, func: F) -> Self
    where
        F: Fn(&A, &HandlerArgs) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            name,
            handles: Vec::new(),
            params: Vec::new(),
            func: Arc::new(func),
        }
    }

    /// Explicitly lists an error type this method handles.
    ///
    /// When no types are listed, the first parameter type is used.
    #[must_use]
    pub fn handles(mut self, error_type: ErrorType) -> Self {
        self.handles.push(error_type);
        self
    }

    /// Declares the next parameter of this method.
    #[must_use]
    pub fn param(mut self, error_type: ErrorType) -> Self {
        self.params.push(error_type);
        self
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the explicitly listed error types.
    #[must_use]
    pub fn listed(&self) -> &[ErrorType] {
        &self.handles
    }

    /// Returns the declared parameter types.
    #[must_use]
    pub fn params(&self) -> &[ErrorType] {
        &self.params
    }

    pub(crate) fn into_parts(self) -> (&'static str, Vec<ErrorType>, Vec<ErrorType>, MethodFn<A>) {
        (self.name, self.handles, self.params, self.func)
    }
}

impl<A> fmt::Debug for HandlerMethod<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("name", &self.name)
            .field("handles", &self.handles)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
