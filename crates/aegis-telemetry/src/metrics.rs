//! Prometheus metrics for exception handling.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `aegis_exceptions_total` | Counter | `outcome` | Errors resolved, by how they were resolved |
//! | `aegis_status_codes_total` | Counter | `code` | Status codes produced for errors |
//! | `aegis_unmapped_exceptions_total` | Counter | `error_type` | Errors no handler was bound for |
//!
//! `outcome` is one of `mapped`, `handler_failure` or `fallback`.
//!
//! # Example
//!
//! ```rust,ignore
//! use aegis_telemetry::{init_metrics, render_metrics, MetricsObserver};
//!
//! init_metrics()?;
//! let observer = Arc::new(MetricsObserver::new());
//! // hand `observer` to the dispatcher and interceptor
//! println!("{}", render_metrics().unwrap_or_default());
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use aegis_core::{DispatchObserver, Fault, StatusError};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tonic::Code;

/// Counter of resolved errors, labelled by `outcome`.
pub const EXCEPTIONS_TOTAL: &str = "aegis_exceptions_total";

/// Counter of produced status codes, labelled by `code`.
pub const STATUS_CODES_TOTAL: &str = "aegis_status_codes_total";

/// Counter of errors without a bound handler, labelled by `error_type`.
pub const UNMAPPED_EXCEPTIONS_TOTAL: &str = "aegis_unmapped_exceptions_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder as the global metrics recorder.
///
/// Calling it again after a successful install is a no-op.
///
/// # Errors
///
/// Returns [`TelemetryError::MetricsInit`] if another recorder is already
/// installed.
pub fn init_metrics() -> TelemetryResult<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for all standard metrics.
pub fn register_metric_descriptions() {
    describe_counter!(
        EXCEPTIONS_TOTAL,
        "Total number of call errors resolved to a status"
    );
    describe_counter!(
        STATUS_CODES_TOTAL,
        "Total number of status codes produced for call errors"
    );
    describe_counter!(
        UNMAPPED_EXCEPTIONS_TOTAL,
        "Total number of call errors no exception handler was bound for"
    );
}

fn record_outcome(outcome: &'static str, code: Code) {
    counter!(EXCEPTIONS_TOTAL, "outcome" => outcome).increment(1);
    counter!(STATUS_CODES_TOTAL, "code" => format!("{code:?}")).increment(1);
}

/// A [`DispatchObserver`] recording handling decisions as metrics.
///
/// Records through whatever recorder is current, so it can be used with
/// [`init_metrics`] or any other `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl MetricsObserver {
    /// Creates the observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DispatchObserver for MetricsObserver {
    fn on_dispatch(&self, _error: &Fault, outcome: &StatusError) {
        record_outcome("mapped", outcome.code());
    }

    fn on_unmapped(&self, error: &Fault) {
        counter!(UNMAPPED_EXCEPTIONS_TOTAL, "error_type" => error.kind().name()).increment(1);
    }

    fn on_handler_failure(&self, _failure: &Fault) {
        record_outcome("handler_failure", Code::Internal);
    }

    fn on_fallback(&self, _error: &Fault, outcome: &StatusError) {
        record_outcome("fallback", outcome.code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::ErrorType;
    use tonic::Status;

    fn recorded(f: impl FnOnce(&MetricsObserver)) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || f(&MetricsObserver::new()));
        handle.render()
    }

    #[test]
    fn test_dispatch_counts_outcome_and_code() {
        let fault = Fault::bare(ErrorType::ANY);
        let rendered = recorded(|observer| {
            let outcome = StatusError::from(Status::invalid_argument("bad"));
            observer.on_dispatch(&fault, &outcome);
            observer.on_dispatch(&fault, &outcome);
        });

        assert!(rendered.contains(r#"aegis_exceptions_total{outcome="mapped"} 2"#));
        assert!(rendered.contains(r#"aegis_status_codes_total{code="InvalidArgument"} 2"#));
    }

    #[test]
    fn test_failure_and_fallback_counted_separately() {
        let fault = Fault::new(ErrorType::new("Unbound"), "nope");
        let rendered = recorded(|observer| {
            observer.on_handler_failure(&fault);
            observer.on_unmapped(&fault);
            observer.on_fallback(&fault, &StatusError::from(Status::unknown("nope")));
        });

        assert!(rendered.contains(r#"aegis_exceptions_total{outcome="handler_failure"} 1"#));
        assert!(rendered.contains(r#"aegis_exceptions_total{outcome="fallback"} 1"#));
        assert!(rendered.contains(r#"aegis_status_codes_total{code="Internal"} 1"#));
        assert!(rendered.contains(r#"aegis_status_codes_total{code="Unknown"} 1"#));
        assert!(rendered.contains(r#"aegis_unmapped_exceptions_total{error_type="Unbound"} 1"#));
    }

    #[test]
    fn test_recording_without_recorder_does_not_panic() {
        MetricsObserver::new().on_handler_failure(&Fault::bare(ErrorType::ANY));
        register_metric_descriptions();
    }
}
