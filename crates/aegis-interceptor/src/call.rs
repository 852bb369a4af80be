//! Server call primitives.
//!
//! These are the contracts the interceptor needs from the RPC runtime: a
//! call object that can send and close, a listener receiving the call's
//! lifecycle events, and a handler starting calls.
//!
//! All methods take `&self`. Runtimes may deliver lifecycle events for the
//! same call from several threads, so implementations synchronize
//! internally.

use aegis_core::{Fault, MetadataMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tonic::Status;

/// A call shared between the runtime, interceptors and listeners.
pub type SharedCall<Req, Resp> = Arc<dyn ServerCall<Req, Resp>>;

/// A listener shared between the runtime and interceptors.
pub type SharedListener<Req> = Arc<dyn Listener<Req>>;

/// Errors raised by a [`ServerCall`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The call was already closed.
    #[error("call already closed")]
    AlreadyClosed,

    /// The transport failed.
    #[error("transport error: {message}")]
    Transport {
        /// Error description.
        message: String,
    },
}

impl CallError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// The shape of an RPC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodType {
    /// One request, one response.
    Unary,
    /// A request stream, one response.
    ClientStreaming,
    /// One request, a response stream.
    ServerStreaming,
    /// Request and response streams.
    BidiStreaming,
}

/// Describes the RPC method a call belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    full_name: String,
    method_type: MethodType,
}

impl MethodDescriptor {
    /// Creates a descriptor from a full name such as `pkg.Service/Method`.
    #[must_use]
    pub fn new(full_name: impl Into<String>, method_type: MethodType) -> Self {
        Self {
            full_name: full_name.into(),
            method_type,
        }
    }

    /// Creates a unary method descriptor.
    #[must_use]
    pub fn unary(full_name: impl Into<String>) -> Self {
        Self::new(full_name, MethodType::Unary)
    }

    /// Returns the full method name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the service part of the full name.
    #[must_use]
    pub fn service_name(&self) -> Option<&str> {
        self.full_name.rsplit_once('/').map(|(service, _)| service)
    }

    /// Returns the method part of the full name.
    #[must_use]
    pub fn method_name(&self) -> &str {
        self.full_name
            .rsplit_once('/')
            .map_or(self.full_name.as_str(), |(_, method)| method)
    }

    /// Returns the method type.
    #[must_use]
    pub fn method_type(&self) -> MethodType {
        self.method_type
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// The server side of one RPC.
pub trait ServerCall<Req, Resp>: Send + Sync {
    /// Returns the descriptor of the called method.
    fn method_descriptor(&self) -> &MethodDescriptor;

    /// Sends response headers.
    fn send_headers(&self, headers: MetadataMap) -> Result<(), CallError>;

    /// Sends one response message.
    fn send_message(&self, message: Resp) -> Result<(), CallError>;

    /// Closes the call with a status and trailers.
    ///
    /// A call is closed exactly once; closing again fails with
    /// [`CallError::AlreadyClosed`].
    fn close(&self, status: Status, trailers: MetadataMap) -> Result<(), CallError>;

    /// Returns `true` if the peer cancelled the call.
    fn is_cancelled(&self) -> bool;

    /// Returns `true` if a message can be sent without buffering.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Receives the lifecycle events of one call.
///
/// An `Err` from any hook means the application failed while processing
/// the event.
pub trait Listener<Req>: Send + Sync {
    /// The call is ready to send messages.
    fn on_ready(&self) -> Result<(), Fault> {
        Ok(())
    }

    /// A request message arrived.
    fn on_message(&self, message: Req) -> Result<(), Fault> {
        let _ = message;
        Ok(())
    }

    /// The client finished sending.
    fn on_half_close(&self) -> Result<(), Fault> {
        Ok(())
    }

    /// The call completed after being closed.
    fn on_complete(&self) -> Result<(), Fault> {
        Ok(())
    }

    /// The call was cancelled.
    fn on_cancel(&self) -> Result<(), Fault> {
        Ok(())
    }
}

/// A listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl<Req> Listener<Req> for NoopListener {}

/// Starts calls, producing their listeners.
pub trait ServerCallHandler<Req, Resp>: Send + Sync {
    /// Starts `call`, returning the listener for its events.
    fn start_call(
        &self,
        call: SharedCall<Req, Resp>,
        headers: &MetadataMap,
    ) -> Result<SharedListener<Req>, Fault>;
}

impl<Req, Resp, F> ServerCallHandler<Req, Resp> for F
where
    F: Fn(SharedCall<Req, Resp>, &MetadataMap) -> Result<SharedListener<Req>, Fault> + Send + Sync,
{
    fn start_call(
        &self,
        call: SharedCall<Req, Resp>,
        headers: &MetadataMap,
    ) -> Result<SharedListener<Req>, Fault> {
        self(call, headers)
    }
}
