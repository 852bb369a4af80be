//! A listener that routes lifecycle failures through exception handling.

use crate::{ExceptionHandledCall, Listener, SharedListener};
use aegis_core::Fault;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Guards a delegate listener's lifecycle hooks.
///
/// An `Err` or panic from the delegate is handled through the call's
/// [`handle_failure`](ExceptionHandledCall::handle_failure): the first one
/// resolves a status and closes the call, later ones are dropped. Once an
/// error was seen, readiness, message and half-close events are no longer
/// delivered. Completion and cancellation are always delivered.
///
/// The hooks return `Err` only when closing the call itself failed.
pub struct ExceptionHandlerListener<Req, Resp> {
    delegate: SharedListener<Req>,
    call: Arc<ExceptionHandledCall<Req, Resp>>,
}

impl<Req, Resp> ExceptionHandlerListener<Req, Resp> {
    /// Wraps `delegate`, reporting failures to `call`.
    #[must_use]
    pub fn new(delegate: SharedListener<Req>, call: Arc<ExceptionHandledCall<Req, Resp>>) -> Self {
        Self { delegate, call }
    }

    fn skip(&self) -> bool {
        self.call.state().is_errored()
    }

    fn guard<F>(&self, event: F) -> Result<(), Fault>
    where
        F: FnOnce(&dyn Listener<Req>) -> Result<(), Fault>,
    {
        let result = catch_unwind(AssertUnwindSafe(|| event(self.delegate.as_ref())))
            .unwrap_or_else(|payload| Err(Fault::from_panic(payload)));
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.call.handle_failure(&error),
        }
    }
}

impl<Req, Resp> Listener<Req> for ExceptionHandlerListener<Req, Resp> {
    fn on_ready(&self) -> Result<(), Fault> {
        if self.skip() {
            return Ok(());
        }
        self.guard(|listener| listener.on_ready())
    }

    fn on_message(&self, message: Req) -> Result<(), Fault> {
        if self.skip() {
            return Ok(());
        }
        self.guard(|listener| listener.on_message(message))
    }

    fn on_half_close(&self) -> Result<(), Fault> {
        if self.skip() {
            return Ok(());
        }
        self.guard(|listener| listener.on_half_close())
    }

    fn on_complete(&self) -> Result<(), Fault> {
        self.guard(|listener| listener.on_complete())
    }

    fn on_cancel(&self) -> Result<(), Fault> {
        self.guard(|listener| listener.on_cancel())
    }
}

impl<Req, Resp> fmt::Debug for ExceptionHandlerListener<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandlerListener")
            .field("call", &self.call)
            .finish_non_exhaustive()
    }
}
