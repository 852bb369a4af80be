//! Status values and the standard error-to-status derivation.
//!
//! [`StatusError`] is the normalized outcome of exception handling: a
//! [`tonic::Status`] paired with the trailing metadata to close the call
//! with. [`derive_status`] is the last-resort derivation used when no
//! handler produces an outcome.

use crate::Fault;
use std::error::Error;
use std::fmt;
use tonic::metadata::MetadataMap;
use tonic::{Code, Status};

/// A status together with the trailers that accompany it.
///
/// This is the value every path through the exception handling pipeline
/// ends in; it is always fully populated.
///
/// # Example
///
/// ```
/// use aegis_core::StatusError;
/// use tonic::metadata::MetadataMap;
/// use tonic::{Code, Status};
///
/// let mut trailers = MetadataMap::new();
/// trailers.insert("error-code", "E42".parse().unwrap());
///
/// let error = StatusError::new(Status::unimplemented("not supported"), trailers);
/// assert_eq!(error.code(), Code::Unimplemented);
/// assert_eq!(error.trailers().get("error-code").unwrap(), "E42");
/// ```
#[derive(Debug, Clone)]
pub struct StatusError {
    status: Status,
    trailers: MetadataMap,
}

impl StatusError {
    /// Creates a status error with trailers.
    #[must_use]
    pub fn new(status: Status, trailers: MetadataMap) -> Self {
        Self { status, trailers }
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the status code.
    #[must_use]
    pub fn code(&self) -> Code {
        self.status.code()
    }

    /// Returns the trailers.
    #[must_use]
    pub fn trailers(&self) -> &MetadataMap {
        &self.trailers
    }

    /// Splits this value into its status and trailers.
    #[must_use]
    pub fn into_parts(self) -> (Status, MetadataMap) {
        (self.status, self.trailers)
    }
}

impl From<Status> for StatusError {
    fn from(status: Status) -> Self {
        Self::new(status, MetadataMap::new())
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.status.code(), self.status.message())
    }
}

impl Error for StatusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.status)
    }
}

/// Derives a status from a fault and its cause chain.
///
/// The status is the runtime's own derivation
/// ([`Status::from_error`]): the first [`Status`] found in the chain, or
/// `UNKNOWN` carrying the fault's text and the fault itself as source.
/// Trailers come from the first [`StatusError`] in the chain, if any.
#[must_use]
pub fn derive_status(fault: &Fault) -> StatusError {
    let trailers = fault
        .find_in_chain::<StatusError>()
        .map(|error| error.trailers().clone())
        .unwrap_or_default();
    let status = Status::from_error(Box::new(fault.clone()));
    StatusError::new(status, trailers)
}

/// Merges `extra` into `base`. Keys present in `extra` replace the values
/// `base` had for them.
#[must_use]
pub fn merge_metadata(base: MetadataMap, extra: MetadataMap) -> MetadataMap {
    if extra.is_empty() {
        return base;
    }
    let mut headers = base.into_headers();
    headers.extend(extra.into_headers());
    MetadataMap::from_headers(headers)
}
