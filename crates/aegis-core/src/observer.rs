//! Dispatch observation.
//!
//! Components of the exception handling pipeline report what they did to a
//! [`DispatchObserver`] handed to them at construction. The default
//! observer is [`TracingObserver`]; metrics recording lives in
//! `aegis-telemetry`.

use crate::{Fault, StatusError};
use std::fmt;
use std::sync::Arc;

/// Receives notifications from the exception handling pipeline.
///
/// All hooks default to doing nothing.
pub trait DispatchObserver: Send + Sync + 'static {
    /// A handler mapped `error` to `outcome`.
    fn on_dispatch(&self, error: &Fault, outcome: &StatusError) {
        let _ = (error, outcome);
    }

    /// No handler is bound for `error`'s type hierarchy.
    fn on_unmapped(&self, error: &Fault) {
        let _ = error;
    }

    /// A handler failed; `failure` carries the original error as suppressed.
    fn on_handler_failure(&self, failure: &Fault) {
        let _ = failure;
    }

    /// `outcome` was derived from `error` because nothing mapped it.
    fn on_fallback(&self, error: &Fault, outcome: &StatusError) {
        let _ = (error, outcome);
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

/// Observer that logs notifications through `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    log_unmapped: bool,
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingObserver {
    /// Creates an observer that logs unmapped errors.
    #[must_use]
    pub const fn new() -> Self {
        Self { log_unmapped: true }
    }

    /// Sets whether unmapped errors are logged at error level.
    #[must_use]
    pub const fn log_unmapped(mut self, enabled: bool) -> Self {
        self.log_unmapped = enabled;
        self
    }
}

impl DispatchObserver for TracingObserver {
    fn on_dispatch(&self, error: &Fault, outcome: &StatusError) {
        tracing::debug!(
            error_type = %error.kind(),
            code = ?outcome.code(),
            "Exception mapped to status"
        );
    }

    fn on_unmapped(&self, error: &Fault) {
        if self.log_unmapped {
            tracing::error!(error_type = %error.kind(), error = %error, "Unknown exception");
        }
    }

    fn on_handler_failure(&self, failure: &Fault) {
        tracing::error!(
            error_type = %failure.kind(),
            error = %failure,
            suppressed = failure.suppressed().len(),
            "Exception thrown during invocation of exception handler method"
        );
    }

    fn on_fallback(&self, error: &Fault, outcome: &StatusError) {
        tracing::trace!(
            error_type = %error.kind(),
            code = ?outcome.code(),
            "Status derived from unmapped exception"
        );
    }
}

/// Forwards every notification to several observers.
#[derive(Clone, Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn DispatchObserver>>,
}

impl CompositeObserver {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer.
    #[must_use]
    pub fn with(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl DispatchObserver for CompositeObserver {
    fn on_dispatch(&self, error: &Fault, outcome: &StatusError) {
        for observer in &self.observers {
            observer.on_dispatch(error, outcome);
        }
    }

    fn on_unmapped(&self, error: &Fault) {
        for observer in &self.observers {
            observer.on_unmapped(error);
        }
    }

    fn on_handler_failure(&self, failure: &Fault) {
        for observer in &self.observers {
            observer.on_handler_failure(failure);
        }
    }

    fn on_fallback(&self, error: &Fault, outcome: &StatusError) {
        for observer in &self.observers {
            observer.on_fallback(error, outcome);
        }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observer_count", &self.observers.len())
            .finish()
    }
}
