//! Ordered interceptor chain.
//!
//! The chain is built once and is immutable afterwards. Interceptors are
//! stably sorted by [`ServerInterceptor::order`]; the first interceptor
//! wraps all the others and the service handler sits at the end.
//!
//! # Example
//!
//! ```
//! use aegis_core::{Fault, MetadataMap};
//! use aegis_interceptor::{
//!     InterceptorChain, NoopListener, ServerCallHandler, ServerInterceptor, SharedCall,
//!     SharedListener,
//! };
//! use std::sync::Arc;
//!
//! struct Audit;
//!
//! impl ServerInterceptor<String, String> for Audit {
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//!
//!     fn intercept_call(
//!         &self,
//!         call: SharedCall<String, String>,
//!         headers: &MetadataMap,
//!         next: &dyn ServerCallHandler<String, String>,
//!     ) -> Result<SharedListener<String>, Fault> {
//!         next.start_call(call, headers)
//!     }
//! }
//!
//! fn service(
//!     _call: SharedCall<String, String>,
//!     _headers: &MetadataMap,
//! ) -> Result<SharedListener<String>, Fault> {
//!     Ok(Arc::new(NoopListener))
//! }
//!
//! let chain = InterceptorChain::builder(service).interceptor(Audit).build();
//!
//! assert_eq!(chain.interceptor_names(), vec!["audit"]);
//! ```

use crate::{ServerCallHandler, ServerInterceptor, SharedCall, SharedListener};
use aegis_core::{Fault, MetadataMap};
use std::fmt;
use std::sync::Arc;

/// A type-erased interceptor that can be stored in a vector.
pub type BoxedInterceptor<Req, Resp> = Arc<dyn ServerInterceptor<Req, Resp>>;

/// An ordered, immutable chain of interceptors in front of a service handler.
pub struct InterceptorChain<Req, Resp> {
    interceptors: Vec<BoxedInterceptor<Req, Resp>>,
    service: Arc<dyn ServerCallHandler<Req, Resp>>,
}

impl<Req, Resp> InterceptorChain<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
{
    /// Creates a chain builder ending at `service`.
    #[must_use]
    pub fn builder<H>(service: H) -> InterceptorChainBuilder<Req, Resp>
    where
        H: ServerCallHandler<Req, Resp> + 'static,
    {
        InterceptorChainBuilder::new(Arc::new(service))
    }

    /// Returns the names of all interceptors in order.
    #[must_use]
    pub fn interceptor_names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Returns the number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain has no interceptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl<Req, Resp> ServerCallHandler<Req, Resp> for InterceptorChain<Req, Resp> {
    fn start_call(
        &self,
        call: SharedCall<Req, Resp>,
        headers: &MetadataMap,
    ) -> Result<SharedListener<Req>, Fault> {
        Next {
            chain: self,
            index: 0,
        }
        .start_call(call, headers)
    }
}

impl<Req, Resp> fmt::Debug for InterceptorChain<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.interceptors.iter().map(|i| i.name()).collect();
        f.debug_struct("InterceptorChain")
            .field("interceptors", &names)
            .finish_non_exhaustive()
    }
}

/// The remainder of a chain, handed to each interceptor.
struct Next<'a, Req, Resp> {
    chain: &'a InterceptorChain<Req, Resp>,
    index: usize,
}

impl<Req, Resp> ServerCallHandler<Req, Resp> for Next<'_, Req, Resp> {
    fn start_call(
        &self,
        call: SharedCall<Req, Resp>,
        headers: &MetadataMap,
    ) -> Result<SharedListener<Req>, Fault> {
        match self.chain.interceptors.get(self.index) {
            Some(interceptor) => {
                let next = Next {
                    chain: self.chain,
                    index: self.index + 1,
                };
                interceptor.intercept_call(call, headers, &next)
            }
            None => self.chain.service.start_call(call, headers),
        }
    }
}

/// Builder for constructing an [`InterceptorChain`].
pub struct InterceptorChainBuilder<Req, Resp> {
    interceptors: Vec<BoxedInterceptor<Req, Resp>>,
    service: Arc<dyn ServerCallHandler<Req, Resp>>,
}

impl<Req, Resp> InterceptorChainBuilder<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
{
    fn new(service: Arc<dyn ServerCallHandler<Req, Resp>>) -> Self {
        Self {
            interceptors: Vec::new(),
            service,
        }
    }

    /// Adds an interceptor.
    #[must_use]
    pub fn interceptor<I>(self, interceptor: I) -> Self
    where
        I: ServerInterceptor<Req, Resp> + 'static,
    {
        self.boxed(Arc::new(interceptor))
    }

    /// Adds a shared interceptor.
    #[must_use]
    pub fn boxed(mut self, interceptor: BoxedInterceptor<Req, Resp>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Builds the chain, ordering interceptors by [`ServerInterceptor::order`].
    ///
    /// Interceptors with equal order keep the order they were added in.
    #[must_use]
    pub fn build(mut self) -> InterceptorChain<Req, Resp> {
        self.interceptors.sort_by_key(|interceptor| interceptor.order());
        tracing::debug!(
            interceptors = ?self.interceptors.iter().map(|i| i.name()).collect::<Vec<_>>(),
            "Interceptor chain built"
        );
        InterceptorChain {
            interceptors: self.interceptors,
            service: self.service,
        }
    }
}

impl<Req, Resp> fmt::Debug for InterceptorChainBuilder<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChainBuilder")
            .field("interceptor_count", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}
