//! Startup-time configuration errors.
//!
//! Everything in this module is fatal: a [`ConfigurationError`] aborts
//! construction of the type hierarchy or the handler registry and is meant
//! to propagate to the application's startup failure path.

use crate::ErrorType;
use thiserror::Error;

/// Result type alias using [`ConfigurationError`].
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Errors detected while building the hierarchy or the handler registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A type explicitly listed on a handler method is not accepted by any
    /// of the method's parameters.
    #[error(
        "parameter type mismatch: no parameter of handler method `{method}` [{}] is equal to or an ancestor of declared exception `{declared}`",
        join(.params)
    )]
    ParameterTypeMismatch {
        /// The handler method.
        method: String,
        /// The explicitly listed error type.
        declared: ErrorType,
        /// The method's parameter types.
        params: Vec<ErrorType>,
    },

    /// A handler method lists no error types and has no parameters.
    #[error("no mapped exception: handler method `{method}` lists no error types and has no parameters")]
    NoMappedException {
        /// The handler method.
        method: String,
    },

    /// Two distinct handler methods are bound to the same error type.
    #[error("ambiguous mapping for `{error_type}`: {{{existing}, {duplicate}}}")]
    AmbiguousMapping {
        /// The contested error type.
        error_type: ErrorType,
        /// The method bound first.
        existing: String,
        /// The method that tried to bind second.
        duplicate: String,
    },

    /// A type is declared as its own ancestor.
    #[error("cyclic type hierarchy: `{error_type}` is its own ancestor")]
    CyclicHierarchy {
        /// A type on the cycle.
        error_type: ErrorType,
    },

    /// The root type was declared with parents.
    #[error("the root error type cannot have parents")]
    RootRedeclared,
}

impl ConfigurationError {
    /// Creates a parameter type mismatch error.
    #[must_use]
    pub fn parameter_type_mismatch(
        method: impl Into<String>,
        declared: ErrorType,
        params: &[ErrorType],
    ) -> Self {
        Self::ParameterTypeMismatch {
            method: method.into(),
            declared,
            params: params.to_vec(),
        }
    }

    /// Creates a no mapped exception error.
    #[must_use]
    pub fn no_mapped_exception(method: impl Into<String>) -> Self {
        Self::NoMappedException {
            method: method.into(),
        }
    }

    /// Creates an ambiguous mapping error.
    #[must_use]
    pub fn ambiguous_mapping(
        error_type: ErrorType,
        existing: impl Into<String>,
        duplicate: impl Into<String>,
    ) -> Self {
        Self::AmbiguousMapping {
            error_type,
            existing: existing.into(),
            duplicate: duplicate.into(),
        }
    }
}

fn join(types: &[ErrorType]) -> String {
    types
        .iter()
        .map(|ty| ty.name())
        .collect::<Vec<_>>()
        .join(", ")
}
