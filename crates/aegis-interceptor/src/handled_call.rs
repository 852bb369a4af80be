//! A server call that routes escaped errors through exception handling.

use crate::{
    CallError, CallPhase, CallState, FallbackHandler, MethodDescriptor, ServerCall, SharedCall,
};
use aegis_core::{merge_metadata, ErrorType, Fault, MetadataMap, StatusError};
use std::error::Error;
use std::fmt;
use tonic::{Code, Status};

/// Wraps a call so that every close carries a resolved status.
///
/// Closing with `UNKNOWN` and a source means an error escaped a layer
/// below the interceptor without being handled. That source is resolved
/// through the fallback handler before the real close happens, and the
/// resolved trailers are merged into the ones supplied, replacing any
/// supplied value under the same key. Such a close arriving while another
/// error is already being handled is dropped; the resolved close for that
/// error closes the call.
pub struct ExceptionHandledCall<Req, Resp> {
    delegate: SharedCall<Req, Resp>,
    fallback: FallbackHandler,
    state: CallState,
}

impl<Req, Resp> ExceptionHandledCall<Req, Resp> {
    /// Wraps `delegate`.
    #[must_use]
    pub fn new(delegate: SharedCall<Req, Resp>, fallback: FallbackHandler) -> Self {
        Self {
            delegate,
            fallback,
            state: CallState::new(),
        }
    }

    /// Returns the call's error state.
    #[must_use]
    pub fn state(&self) -> &CallState {
        &self.state
    }

    /// Handles an error raised while processing this call.
    ///
    /// The first error seen while the call is active is resolved and the
    /// call is closed with the outcome. Later errors are dropped.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorType::ILLEGAL_STATE`] fault if closing the call
    /// with the resolved status fails.
    pub fn handle_failure(&self, error: &Fault) -> Result<(), Fault> {
        if !self.state.try_error() {
            tracing::debug!(
                error_type = %error.kind(),
                closed = self.state.is_closed(),
                "Ignoring error for call already handling an error or closed"
            );
            return Ok(());
        }

        let outcome = self.fallback.resolve(error);
        self.close_resolved(outcome, MetadataMap::new())
            .map_err(|source| {
                Fault::new(ErrorType::ILLEGAL_STATE, "Failed to close the call").with_source(source)
            })
    }

    fn close_resolved(&self, outcome: StatusError, trailers: MetadataMap) -> Result<(), CallError> {
        let (status, resolved) = outcome.into_parts();
        self.close_delegate(status, merge_metadata(trailers, resolved))
    }

    fn close_delegate(&self, status: Status, trailers: MetadataMap) -> Result<(), CallError> {
        if !self.state.mark_closed() {
            return Err(CallError::AlreadyClosed);
        }
        self.delegate.close(status, trailers)
    }
}

fn escaped_cause(status: &Status) -> Option<Fault> {
    if status.code() != Code::Unknown {
        return None;
    }
    let source = status.source()?;
    let fault = if let Some(fault) = source.downcast_ref::<Fault>() {
        fault.clone()
    } else if let Some(error) = source.downcast_ref::<StatusError>() {
        Fault::from_status_error(error.clone())
    } else {
        Fault::new(ErrorType::ANY, source.to_string())
    };
    Some(fault)
}

impl<Req, Resp> ServerCall<Req, Resp> for ExceptionHandledCall<Req, Resp> {
    fn method_descriptor(&self) -> &MethodDescriptor {
        self.delegate.method_descriptor()
    }

    fn send_headers(&self, headers: MetadataMap) -> Result<(), CallError> {
        self.delegate.send_headers(headers)
    }

    fn send_message(&self, message: Resp) -> Result<(), CallError> {
        self.delegate.send_message(message)
    }

    fn close(&self, status: Status, trailers: MetadataMap) -> Result<(), CallError> {
        match escaped_cause(&status) {
            Some(cause) if self.state.try_error() => {
                let outcome = self.fallback.resolve(&cause);
                self.close_resolved(outcome, trailers)
            }
            Some(cause) if self.state.phase() == CallPhase::Errored => {
                tracing::debug!(
                    error_type = %cause.kind(),
                    "Dropping escaped close while another error is being handled"
                );
                Ok(())
            }
            _ => self.close_delegate(status, trailers),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.delegate.is_cancelled()
    }

    fn is_ready(&self) -> bool {
        self.delegate.is_ready()
    }
}

impl<Req, Resp> fmt::Debug for ExceptionHandledCall<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandledCall")
            .field("method", self.delegate.method_descriptor())
            .field("state", &self.state.phase())
            .finish_non_exhaustive()
    }
}
