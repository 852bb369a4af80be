//! Assembly of the exception handling interceptor from configuration.

use aegis_advice::{
    AdviceExceptionHandler, ExceptionAdvice, HandlerRegistry, HandlerRegistryBuilder,
    HandlerResolver,
};
use aegis_config::{AegisConfig, ExceptionHandlerConfig};
use aegis_core::observer::CompositeObserver;
use aegis_core::{
    CompositeExceptionHandler, ConfigurationResult, DispatchObserver, ExceptionHandler,
    TracingObserver, TypeHierarchy,
};
use aegis_interceptor::ExceptionHandlerInterceptor;
use aegis_telemetry::{MetricsObserver, TelemetryResult};
use std::fmt;
use std::sync::Arc;

type Registration =
    Box<dyn FnOnce(HandlerRegistryBuilder) -> ConfigurationResult<HandlerRegistryBuilder> + Send>;

/// Builds an [`ExceptionHandlerInterceptor`] from configuration, a type
/// hierarchy, advice providers and additional handlers.
///
/// Advice handlers are consulted first, then the additional handlers in
/// the order they were added. The first one to map an error wins.
///
/// # Example
///
/// ```
/// use aegis::prelude::*;
/// use aegis::ExceptionHandling;
/// use aegis_config::AegisConfig;
/// use tonic::Status;
///
/// const NOT_FOUND: ErrorType = ErrorType::new("NotFound");
///
/// struct Lookups;
///
/// impl ExceptionAdvice for Lookups {
///     fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
///         vec![HandlerMethod::new("not_found", |_: &Self, _| {
///             Ok(Some(Status::not_found("no such record").into()))
///         })
///         .handles(NOT_FOUND)]
///     }
/// }
///
/// let interceptor = ExceptionHandling::new(&AegisConfig::default())
///     .advice(Lookups)
///     .build()?
///     .expect("enabled by default");
/// # Ok::<(), aegis_core::ConfigurationError>(())
/// ```
pub struct ExceptionHandling {
    config: ExceptionHandlerConfig,
    metrics: bool,
    hierarchy: Arc<TypeHierarchy>,
    registrations: Vec<Registration>,
    handlers: Vec<Arc<dyn ExceptionHandler>>,
    observers: Vec<Arc<dyn DispatchObserver>>,
}

impl ExceptionHandling {
    /// Starts from `config` with an empty type hierarchy.
    #[must_use]
    pub fn new(config: &AegisConfig) -> Self {
        Self {
            config: config.exception_handler.clone(),
            metrics: config.metrics.enabled,
            hierarchy: Arc::new(TypeHierarchy::default()),
            registrations: Vec::new(),
            handlers: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Sets the type hierarchy handlers are resolved against.
    #[must_use]
    pub fn hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.hierarchy = Arc::new(hierarchy);
        self
    }

    /// Registers an advice provider.
    #[must_use]
    pub fn advice<A: ExceptionAdvice>(self, advice: A) -> Self {
        self.shared_advice(Arc::new(advice))
    }

    /// Registers an advice provider that is shared with other components.
    #[must_use]
    pub fn shared_advice<A: ExceptionAdvice>(mut self, advice: Arc<A>) -> Self {
        self.registrations
            .push(Box::new(move |builder: HandlerRegistryBuilder| builder.advice(advice)));
        self
    }

    /// Adds a handler consulted after the advice handlers.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Adds an observer notified alongside the logging observer.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds the interceptor.
    ///
    /// Returns `Ok(None)` when exception handling is disabled.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`](aegis_core::ConfigurationError)
    /// raised while registering advice.
    pub fn build(self) -> ConfigurationResult<Option<ExceptionHandlerInterceptor>> {
        if !self.config.enabled {
            tracing::debug!("Exception handling disabled by configuration");
            return Ok(None);
        }

        let mut observer = CompositeObserver::new()
            .with(Arc::new(TracingObserver::new().log_unmapped(self.config.log_unmapped)));
        if self.metrics {
            observer = observer.with(Arc::new(MetricsObserver::new()));
        }
        for extra in self.observers {
            observer = observer.with(extra);
        }
        let observer: Arc<dyn DispatchObserver> = Arc::new(observer);

        let mut builder = HandlerRegistry::builder(self.hierarchy);
        for register in self.registrations {
            builder = register(builder)?;
        }
        let registry = builder.build();

        let mut handler = CompositeExceptionHandler::new();
        if !registry.is_empty() {
            let advice = AdviceExceptionHandler::new(HandlerResolver::new(Arc::new(registry)))
                .with_observer(Arc::clone(&observer))
                .with_failure_description(self.config.handler_failure_description);
            handler = handler.with(Arc::new(advice));
        }
        for extra in self.handlers {
            handler = handler.with(extra);
        }

        tracing::debug!(handlers = handler.len(), "Exception handling configured");
        Ok(Some(
            ExceptionHandlerInterceptor::new(Arc::new(handler)).with_observer(observer),
        ))
    }
}

impl fmt::Debug for ExceptionHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandling")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .field("advice_count", &self.registrations.len())
            .field("handler_count", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

/// Installs logging and, when enabled, the metrics recorder described by
/// `config`.
///
/// # Errors
///
/// Returns an error if a global subscriber or recorder is already
/// installed, or the log level is invalid.
pub fn init_telemetry(config: &AegisConfig) -> TelemetryResult<()> {
    aegis_telemetry::init_logging(&config.logging.to_log_config())?;
    if config.metrics.enabled {
        aegis_telemetry::init_metrics()?;
    }
    Ok(())
}
