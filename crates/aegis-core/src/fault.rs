//! The application error flowing through the exception handling pipeline.
//!
//! A [`Fault`] is what a call lifecycle entry point "throws": it carries an
//! [`ErrorType`] used for handler resolution, an optional message, an
//! optional source error and any suppressed errors collected while it was
//! being handled.

use crate::{ErrorType, StatusError};
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tonic::Status;

/// Shared, type-erased error.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// An application error raised during a call.
///
/// Faults are cheap to clone. Clones share identity, which
/// [`same_as`](Self::same_as) exposes; modifying a fault that has live
/// clones detaches it from them.
///
/// # Example
///
/// ```
/// use aegis_core::{ErrorType, Fault};
///
/// const INVALID_ARGUMENT: ErrorType = ErrorType::new("InvalidArgument");
///
/// let fault = Fault::new(INVALID_ARGUMENT, "bad input");
/// assert_eq!(fault.kind(), INVALID_ARGUMENT);
/// assert_eq!(fault.message(), Some("bad input"));
/// assert_eq!(fault.to_string(), "InvalidArgument: bad input");
/// ```
#[derive(Clone)]
pub struct Fault {
    inner: Arc<FaultInner>,
}

#[derive(Clone)]
struct FaultInner {
    kind: ErrorType,
    message: Option<String>,
    source: Option<SharedError>,
    suppressed: Vec<SharedError>,
}

impl Fault {
    /// Creates a fault of the given type with a message.
    #[must_use]
    pub fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        Self::build(kind, Some(message.into()), None)
    }

    /// Creates a fault of the given type without a message.
    #[must_use]
    pub fn bare(kind: ErrorType) -> Self {
        Self::build(kind, None, None)
    }

    /// Wraps an arbitrary error as a fault of the given type.
    ///
    /// The error's display text becomes the message and the error itself
    /// becomes the source.
    pub fn from_error<E>(kind: ErrorType, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        let message = error.to_string();
        Self::build(kind, Some(message), Some(Arc::new(error)))
    }

    /// Wraps a status as a fault of type [`ErrorType::STATUS`].
    #[must_use]
    pub fn from_status(status: Status) -> Self {
        Self::from_status_error(StatusError::from(status))
    }

    /// Wraps a status with trailers as a fault of type [`ErrorType::STATUS`].
    #[must_use]
    pub fn from_status_error(error: StatusError) -> Self {
        let message = error.status().message().to_string();
        Self::build(ErrorType::STATUS, Some(message), Some(Arc::new(error)))
    }

    /// Converts a caught panic payload into a fault of type [`ErrorType::PANIC`].
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        Self::new(ErrorType::PANIC, message)
    }

    fn build(kind: ErrorType, message: Option<String>, source: Option<SharedError>) -> Self {
        Self {
            inner: Arc::new(FaultInner {
                kind,
                message,
                source,
                suppressed: Vec::new(),
            }),
        }
    }

    /// Sets the source (cause) of this fault.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.inner).source = Some(Arc::new(source));
        self
    }

    /// Records an error that was suppressed while this fault was raised.
    #[must_use]
    pub fn with_suppressed<E>(mut self, suppressed: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.inner)
            .suppressed
            .push(Arc::new(suppressed));
        self
    }

    /// Returns the error type used for handler resolution.
    #[must_use]
    pub fn kind(&self) -> ErrorType {
        self.inner.kind
    }

    /// Returns the message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.inner.message.as_deref()
    }

    /// Returns the errors suppressed while this fault was raised.
    #[must_use]
    pub fn suppressed(&self) -> &[SharedError] {
        &self.inner.suppressed
    }

    /// Returns `true` if both values are clones of the same fault.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the first error of type `E` in this fault's source chain.
    #[must_use]
    pub fn find_in_chain<E: Error + 'static>(&self) -> Option<&E> {
        let mut current: Option<&(dyn Error + 'static)> = Some(self);
        while let Some(error) = current {
            if let Some(found) = error.downcast_ref::<E>() {
                return Some(found);
            }
            current = error.source();
        }
        None
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("kind", &self.inner.kind)
            .field("message", &self.inner.message)
            .field("source", &self.inner.source)
            .field("suppressed", &self.inner.suppressed.len())
            .finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.message {
            Some(message) => write!(f, "{}: {}", self.inner.kind, message),
            None => write!(f, "{}", self.inner.kind),
        }
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn Error + 'static))
    }
}

impl From<Status> for Fault {
    fn from(status: Status) -> Self {
        Self::from_status(status)
    }
}

impl From<StatusError> for Fault {
    fn from(error: StatusError) -> Self {
        Self::from_status_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    const IO: ErrorType = ErrorType::new("Io");

    #[test]
    fn test_display_with_and_without_message() {
        assert_eq!(Fault::new(IO, "disk full").to_string(), "Io: disk full");
        assert_eq!(Fault::bare(IO).to_string(), "Io");
    }

    #[test]
    fn test_from_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "broken pipe");
        let fault = Fault::from_error(IO, io);
        assert_eq!(fault.message(), Some("broken pipe"));
        assert!(fault.source().is_some());
        assert!(fault.find_in_chain::<std::io::Error>().is_some());
    }

    #[test]
    fn test_clone_shares_identity() {
        let fault = Fault::new(IO, "x");
        let clone = fault.clone();
        assert!(fault.same_as(&clone));
        assert!(!fault.same_as(&Fault::new(IO, "x")));
    }

    #[test]
    fn test_suppressed_changes_identity() {
        let original = Fault::new(IO, "original");
        let failure = Fault::new(ErrorType::PANIC, "handler");
        let witness = failure.clone();
        let failure = failure.with_suppressed(original);

        assert_eq!(failure.suppressed().len(), 1);
        assert_eq!(failure.suppressed()[0].to_string(), "Io: original");
        assert!(witness.suppressed().is_empty());
    }

    #[test]
    fn test_from_status_is_found_in_chain() {
        let fault = Fault::from(Status::not_found("missing"));
        assert_eq!(fault.kind(), ErrorType::STATUS);
        let status = fault.find_in_chain::<Status>().unwrap();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[test]
    fn test_from_panic_payloads() {
        let from_str = Fault::from_panic(Box::new("boom"));
        assert_eq!(from_str.kind(), ErrorType::PANIC);
        assert_eq!(from_str.message(), Some("boom"));

        let from_string = Fault::from_panic(Box::new(String::from("kaboom")));
        assert_eq!(from_string.message(), Some("kaboom"));

        let opaque = Fault::from_panic(Box::new(42_u32));
        assert_eq!(opaque.message(), Some("panic with non-string payload"));
    }
}
