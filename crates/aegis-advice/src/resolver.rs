//! Handler resolution.

use crate::{HandlerBinding, HandlerRegistry};
use aegis_core::{ErrorType, TypeHierarchy};
use std::sync::Arc;

/// Resolves the most specific handler binding for an error type.
///
/// Among all bound types that are ancestors of the error type, the one at
/// the smallest inheritance distance wins. Equally distant candidates are
/// decided by registration order, first registered wins.
#[derive(Debug, Clone)]
pub struct HandlerResolver {
    registry: Arc<HandlerRegistry>,
}

impl HandlerResolver {
    /// Creates a resolver over a registry.
    #[must_use]
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the closest binding for `error_type`, or `None` if no bound
    /// type is an ancestor of it.
    #[must_use]
    pub fn resolve(&self, error_type: ErrorType) -> Option<&HandlerBinding> {
        let hierarchy = self.registry.hierarchy();
        self.registry
            .iter()
            .filter_map(|(bound, binding)| {
                hierarchy
                    .distance(bound, error_type)
                    .map(|distance| (distance, binding))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, binding)| binding)
    }

    /// Returns `true` if some handler is bound for `error_type` or an ancestor.
    #[must_use]
    pub fn is_mapped(&self, error_type: ErrorType) -> bool {
        self.resolve(error_type).is_some()
    }

    /// Returns the hierarchy used for resolution.
    #[must_use]
    pub fn hierarchy(&self) -> &TypeHierarchy {
        self.registry.hierarchy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExceptionAdvice, HandlerMethod};

    const IO: ErrorType = ErrorType::new("Io");
    const FILE_NOT_FOUND: ErrorType = ErrorType::new("FileNotFound");
    const RETRYABLE: ErrorType = ErrorType::new("Retryable");
    const AUDITED: ErrorType = ErrorType::new("Audited");
    const LOCK_TIMEOUT: ErrorType = ErrorType::new("LockTimeout");
    const UNRELATED: ErrorType = ErrorType::new("Unrelated");

    struct Listed(Vec<(&'static str, ErrorType)>);

    impl ExceptionAdvice for Listed {
        fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
            self.0
                .iter()
                .map(|(name, ty)| HandlerMethod::new(*name, |_: &Self, _| Ok(None)).param(*ty))
                .collect()
        }
    }

    fn resolver_for(methods: Vec<(&'static str, ErrorType)>) -> HandlerResolver {
        let hierarchy = TypeHierarchy::builder()
            .declare(FILE_NOT_FOUND, [IO])
            .declare(LOCK_TIMEOUT, [IO, RETRYABLE, AUDITED])
            .build()
            .unwrap();
        let registry = HandlerRegistry::builder(Arc::new(hierarchy))
            .advice(Arc::new(Listed(methods)))
            .unwrap()
            .build();
        HandlerResolver::new(Arc::new(registry))
    }

    #[test]
    fn test_most_specific_binding_wins() {
        let resolver = resolver_for(vec![
            ("any", ErrorType::ANY),
            ("io", IO),
            ("file_not_found", FILE_NOT_FOUND),
        ]);

        assert_eq!(resolver.resolve(FILE_NOT_FOUND).unwrap().method(), "file_not_found");
        assert_eq!(resolver.resolve(IO).unwrap().method(), "io");
        assert_eq!(resolver.resolve(UNRELATED).unwrap().method(), "any");
    }

    #[test]
    fn test_unmatched_type_resolves_to_none() {
        let resolver = resolver_for(vec![("io", IO)]);
        assert!(resolver.resolve(UNRELATED).is_none());
        assert!(!resolver.is_mapped(UNRELATED));
        assert!(resolver.is_mapped(FILE_NOT_FOUND));
    }

    #[test]
    fn test_equal_distance_uses_registration_order() {
        let resolver = resolver_for(vec![("audited", AUDITED), ("retryable", RETRYABLE)]);
        assert_eq!(resolver.resolve(LOCK_TIMEOUT).unwrap().method(), "audited");

        let resolver = resolver_for(vec![("retryable", RETRYABLE), ("audited", AUDITED)]);
        assert_eq!(resolver.resolve(LOCK_TIMEOUT).unwrap().method(), "retryable");
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let resolver = resolver_for(vec![("io", IO), ("retryable", RETRYABLE)]);
        let first = resolver.resolve(LOCK_TIMEOUT).unwrap().method();
        for _ in 0..16 {
            assert_eq!(resolver.resolve(LOCK_TIMEOUT).unwrap().method(), first);
        }
    }
}
