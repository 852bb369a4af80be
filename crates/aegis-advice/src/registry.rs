//! The handler registry.
//!
//! The registry is the immutable index from error types to handler
//! bindings, built once at startup from a set of advice instances.

use crate::method::MethodFn;
use crate::{ExceptionAdvice, HandlerArgs, HandlerResult};
use aegis_core::{ConfigurationError, ConfigurationResult, ErrorType, Fault, TypeHierarchy};
use indexmap::IndexMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

type Invoker = Arc<dyn Fn(&HandlerArgs) -> HandlerResult + Send + Sync>;

/// The association of one handler method with the advice instance owning it.
pub struct HandlerBinding {
    advice_type: TypeId,
    position: usize,
    advice: &'static str,
    method: &'static str,
    params: Vec<ErrorType>,
    invoker: Invoker,
}

impl HandlerBinding {
    fn new<A: ExceptionAdvice>(
        advice: Arc<A>,
        position: usize,
        method: &'static str,
        params: Vec<ErrorType>,
        func: MethodFn<A>,
    ) -> Self {
        let name = advice.advice_name();
        Self {
            advice_type: TypeId::of::<A>(),
            position,
            advice: name,
            method,
            params,
            invoker: Arc::new(move |args: &HandlerArgs| func(advice.as_ref(), args)),
        }
    }

    /// Returns the name of the owning advice.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        self.advice
    }

    /// Returns the method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Returns the declared parameter types.
    #[must_use]
    pub fn params(&self) -> &[ErrorType] {
        &self.params
    }

    /// Returns `advice::method`, used in diagnostics.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.advice, self.method)
    }

    /// Returns `true` if both bindings refer to the same method of the same advice type.
    ///
    /// A method is identified by the advice type and its position in
    /// [`exception_handlers`](ExceptionAdvice::exception_handlers), not by
    /// name, so two methods sharing a name are still distinct.
    #[must_use]
    pub fn is_same_method(&self, other: &Self) -> bool {
        self.advice_type == other.advice_type && self.position == other.position
    }

    /// Builds the arguments for invoking this binding with `error`.
    ///
    /// The error fills the first parameter whose type is equal to or an
    /// ancestor of the error's type. Other parameters stay empty.
    #[must_use]
    pub fn bind(&self, hierarchy: &TypeHierarchy, error: &Fault) -> HandlerArgs {
        let mut slots = vec![None; self.params.len()];
        if let Some(index) = self
            .params
            .iter()
            .position(|param| hierarchy.is_assignable(*param, error.kind()))
        {
            slots[index] = Some(error.clone());
        }
        HandlerArgs::new(slots)
    }

    /// Invokes the handler method on its advice instance.
    pub fn invoke(&self, args: &HandlerArgs) -> HandlerResult {
        (self.invoker)(args)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("advice", &self.advice)
            .field("method", &self.method)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Immutable index of error types to handler bindings.
///
/// Bindings keep registration order; the resolver uses it to break ties
/// between equally distant ancestors.
///
/// # Example
///
/// ```
/// use aegis_advice::{ExceptionAdvice, HandlerMethod, HandlerOutcome, HandlerRegistry};
/// use aegis_core::{ErrorType, TypeHierarchy};
/// use std::sync::Arc;
/// use tonic::Status;
///
/// const NOT_FOUND: ErrorType = ErrorType::new("NotFound");
///
/// struct Advice;
///
/// impl ExceptionAdvice for Advice {
///     fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
///         vec![HandlerMethod::new("not_found", |_: &Self, _| {
///             Ok(Some(HandlerOutcome::Status(Status::not_found("missing"))))
///         })
///         .param(NOT_FOUND)]
///     }
/// }
///
/// let hierarchy = Arc::new(TypeHierarchy::builder().build()?);
/// let registry = HandlerRegistry::builder(hierarchy)
///     .advice(Arc::new(Advice))?
///     .build();
///
/// assert_eq!(registry.len(), 1);
/// assert!(registry.get(NOT_FOUND).is_some());
/// # Ok::<(), aegis_core::ConfigurationError>(())
/// ```
pub struct HandlerRegistry {
    hierarchy: Arc<TypeHierarchy>,
    bindings: IndexMap<ErrorType, Arc<HandlerBinding>>,
}

impl HandlerRegistry {
    /// Creates a registry builder over the given hierarchy.
    #[must_use]
    pub fn builder(hierarchy: Arc<TypeHierarchy>) -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new(hierarchy)
    }

    /// Returns the type hierarchy used for resolution.
    #[must_use]
    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    /// Returns the binding registered for exactly `error_type`.
    #[must_use]
    pub fn get(&self, error_type: ErrorType) -> Option<&HandlerBinding> {
        self.bindings.get(&error_type).map(AsRef::as_ref)
    }

    /// Iterates over bindings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ErrorType, &HandlerBinding)> {
        self.bindings
            .iter()
            .map(|(error_type, binding)| (*error_type, binding.as_ref()))
    }

    /// Returns the number of bound error types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no error type is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`HandlerRegistry`].
pub struct HandlerRegistryBuilder {
    hierarchy: Arc<TypeHierarchy>,
    bindings: IndexMap<ErrorType, Arc<HandlerBinding>>,
}

impl HandlerRegistryBuilder {
    fn new(hierarchy: Arc<TypeHierarchy>) -> Self {
        Self {
            hierarchy,
            bindings: IndexMap::new(),
        }
    }

    /// Registers every handler method of `advice`.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::NoMappedException`] if a method lists no
    ///   types and declares no parameters.
    /// - [`ConfigurationError::ParameterTypeMismatch`] if a listed type is
    ///   not accepted by any parameter.
    /// - [`ConfigurationError::AmbiguousMapping`] if a type is already bound
    ///   to a different method.
    pub fn advice<A: ExceptionAdvice>(mut self, advice: Arc<A>) -> ConfigurationResult<Self> {
        let methods = advice.exception_handlers();
        tracing::debug!(
            advice = advice.advice_name(),
            methods = methods.len(),
            "Registering exception advice"
        );

        for (position, method) in methods.into_iter().enumerate() {
            let (name, listed, params, func) = method.into_parts();
            let qualified = format!("{}::{}", advice.advice_name(), name);
            let mapped = self.mapped_types(&qualified, &listed, &params)?;
            let binding = Arc::new(HandlerBinding::new(
                Arc::clone(&advice),
                position,
                name,
                params,
                func,
            ));
            for error_type in mapped {
                self.bind(error_type, &binding)?;
            }
        }
        Ok(self)
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            hierarchy: self.hierarchy,
            bindings: self.bindings,
        }
    }

    fn mapped_types(
        &self,
        method: &str,
        listed: &[ErrorType],
        params: &[ErrorType],
    ) -> ConfigurationResult<Vec<ErrorType>> {
        if listed.is_empty() {
            return params
                .first()
                .map(|first| vec![*first])
                .ok_or_else(|| ConfigurationError::no_mapped_exception(method));
        }

        // A method without parameters may list any type.
        if !params.is_empty() {
            for declared in listed {
                let accepted = params
                    .iter()
                    .any(|param| self.hierarchy.is_assignable(*param, *declared));
                if !accepted {
                    return Err(ConfigurationError::parameter_type_mismatch(
                        method, *declared, params,
                    ));
                }
            }
        }

        let mut mapped = listed.to_vec();
        mapped.dedup();
        Ok(mapped)
    }

    fn bind(
        &mut self,
        error_type: ErrorType,
        binding: &Arc<HandlerBinding>,
    ) -> ConfigurationResult<()> {
        match self.bindings.get(&error_type) {
            Some(existing) if existing.is_same_method(binding) => {
                tracing::debug!(
                    error_type = %error_type,
                    method = %existing.qualified_name(),
                    "Handler method already bound, keeping first registration"
                );
                Ok(())
            }
            Some(existing) => Err(ConfigurationError::ambiguous_mapping(
                error_type,
                existing.qualified_name(),
                binding.qualified_name(),
            )),
            None => {
                self.bindings.insert(error_type, Arc::clone(binding));
                Ok(())
            }
        }
    }
}

impl fmt::Debug for HandlerRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistryBuilder")
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandlerMethod, HandlerOutcome};
    use tonic::{Code, Status};

    const IO: ErrorType = ErrorType::new("Io");
    const FILE_NOT_FOUND: ErrorType = ErrorType::new("FileNotFound");
    const TIMEOUT: ErrorType = ErrorType::new("Timeout");

    fn hierarchy() -> Arc<TypeHierarchy> {
        Arc::new(
            TypeHierarchy::builder()
                .declare(FILE_NOT_FOUND, [IO])
                .declare(TIMEOUT, [IO])
                .build()
                .unwrap(),
        )
    }

    fn status(code: Code) -> HandlerResult {
        Ok(Some(HandlerOutcome::Status(Status::new(code, "mapped"))))
    }

    struct IoAdvice;

    impl ExceptionAdvice for IoAdvice {
        fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
            vec![
                HandlerMethod::new("io", |_: &Self, _| status(Code::Unavailable)).param(IO),
                HandlerMethod::new("missing", |_: &Self, _| status(Code::NotFound))
                    .handles(FILE_NOT_FOUND)
                    .param(IO),
            ]
        }
    }

    struct OtherIoAdvice;

    impl ExceptionAdvice for OtherIoAdvice {
        fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
            vec![HandlerMethod::new("io", |_: &Self, _| status(Code::Internal)).param(IO)]
        }
    }

    struct OverloadedAdvice;

    impl ExceptionAdvice for OverloadedAdvice {
        fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
            vec![
                HandlerMethod::new("handle", |_: &Self, _| status(Code::NotFound)).param(IO),
                HandlerMethod::new("handle", |_: &Self, _| status(Code::Aborted))
                    .handles(IO)
                    .param(ErrorType::ANY),
            ]
        }
    }

    struct RenamedAdvice;

    impl ExceptionAdvice for RenamedAdvice {
        fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
            vec![HandlerMethod::new("io", |_: &Self, _| status(Code::Internal)).param(IO)]
        }

        fn advice_name(&self) -> &'static str {
            std::any::type_name::<IoAdvice>()
        }
    }

    struct ListingAdvice(Vec<ErrorType>, Vec<ErrorType>);

    impl ExceptionAdvice for ListingAdvice {
        fn exception_handlers(&self) -> Vec<HandlerMethod<Self>> {
            let mut method = HandlerMethod::new("listed", |_: &Self, _| Ok(None));
            for ty in &self.0 {
                method = method.handles(*ty);
            }
            for ty in &self.1 {
                method = method.param(*ty);
            }
            vec![method]
        }
    }

    #[test]
    fn test_infers_type_from_first_parameter() {
        let registry = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(IoAdvice))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(IO).unwrap().method(), "io");
        assert_eq!(registry.get(FILE_NOT_FOUND).unwrap().method(), "missing");
        assert!(registry.get(TIMEOUT).is_none());
    }

    #[test]
    fn test_only_first_parameter_is_inferred() {
        let registry = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(ListingAdvice(vec![], vec![TIMEOUT, FILE_NOT_FOUND])))
            .unwrap()
            .build();

        assert!(registry.get(TIMEOUT).is_some());
        assert!(registry.get(FILE_NOT_FOUND).is_none());
    }

    #[test]
    fn test_no_mapped_exception() {
        let err = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(ListingAdvice(vec![], vec![])))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NoMappedException { .. }));
        assert!(err.to_string().contains("listed"));
    }

    #[test]
    fn test_parameter_type_mismatch() {
        let err = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(ListingAdvice(vec![IO], vec![TIMEOUT])))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::parameter_type_mismatch(
                format!("{}::listed", std::any::type_name::<ListingAdvice>()),
                IO,
                &[TIMEOUT],
            )
        );
    }

    #[test]
    fn test_listed_types_without_parameters_are_accepted() {
        let registry = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(ListingAdvice(vec![IO, TIMEOUT], vec![])))
            .unwrap()
            .build();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_ambiguous_mapping_names_both_methods() {
        let err = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(IoAdvice))
            .unwrap()
            .advice(Arc::new(OtherIoAdvice))
            .unwrap_err();

        match err {
            ConfigurationError::AmbiguousMapping {
                error_type,
                existing,
                duplicate,
            } => {
                assert_eq!(error_type, IO);
                assert!(existing.ends_with("IoAdvice::io"));
                assert!(duplicate.ends_with("OtherIoAdvice::io"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_method_registered_twice_is_idempotent() {
        let first = Arc::new(IoAdvice);
        let registry = HandlerRegistry::builder(hierarchy())
            .advice(Arc::clone(&first))
            .unwrap()
            .advice(Arc::new(IoAdvice))
            .unwrap()
            .build();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_methods_sharing_a_name_are_ambiguous() {
        let err = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(OverloadedAdvice))
            .unwrap_err();

        match err {
            ConfigurationError::AmbiguousMapping {
                error_type,
                existing,
                duplicate,
            } => {
                assert_eq!(error_type, IO);
                assert!(existing.ends_with("OverloadedAdvice::handle"));
                assert!(duplicate.ends_with("OverloadedAdvice::handle"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_advice_types_sharing_a_name_are_ambiguous() {
        let result = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(IoAdvice))
            .unwrap()
            .advice(Arc::new(RenamedAdvice));

        assert!(matches!(
            result,
            Err(ConfigurationError::AmbiguousMapping { error_type, .. }) if error_type == IO
        ));
    }

    #[test]
    fn test_bind_fills_first_assignable_slot_only() {
        let registry = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(ListingAdvice(
                vec![FILE_NOT_FOUND],
                vec![TIMEOUT, IO, FILE_NOT_FOUND],
            )))
            .unwrap()
            .build();
        let binding = registry.get(FILE_NOT_FOUND).unwrap();
        let fault = Fault::new(FILE_NOT_FOUND, "config.toml");
        let args = binding.bind(registry.hierarchy(), &fault);

        assert_eq!(args.len(), 3);
        assert!(args.get(0).is_none());
        assert!(args.get(1).unwrap().same_as(&fault));
        assert!(args.get(2).is_none());
    }

    #[test]
    fn test_iteration_keeps_registration_order() {
        let registry = HandlerRegistry::builder(hierarchy())
            .advice(Arc::new(ListingAdvice(vec![TIMEOUT, IO, FILE_NOT_FOUND], vec![])))
            .unwrap()
            .build();
        let order: Vec<_> = registry.iter().map(|(ty, _)| ty).collect();
        assert_eq!(order, vec![TIMEOUT, IO, FILE_NOT_FOUND]);
    }
}
