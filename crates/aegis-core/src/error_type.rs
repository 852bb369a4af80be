//! Error type identifiers and the explicit error type hierarchy.
//!
//! Rust has no class inheritance, so the "is this error a kind of that
//! error" question is answered by a [`TypeHierarchy`] declared once at
//! startup. Each declared type lists its parents in order: the first parent
//! plays the role of the superclass, the remaining ones the role of
//! implemented interfaces.
//!
//! Every hierarchy is rooted at [`ErrorType::ANY`]. Types that are never
//! declared, or are declared without parents, descend directly from it.
//!
//! # Example
//!
//! ```
//! use aegis_core::{ErrorType, TypeHierarchy};
//!
//! const RUNTIME: ErrorType = ErrorType::new("RuntimeError");
//! const INVALID_ARGUMENT: ErrorType = ErrorType::new("InvalidArgument");
//!
//! let hierarchy = TypeHierarchy::builder()
//!     .declare(RUNTIME, [])
//!     .declare(INVALID_ARGUMENT, [RUNTIME])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(hierarchy.distance(RUNTIME, INVALID_ARGUMENT), Some(1));
//! assert_eq!(hierarchy.distance(ErrorType::ANY, INVALID_ARGUMENT), Some(2));
//! assert!(!hierarchy.is_assignable(INVALID_ARGUMENT, RUNTIME));
//! ```

use crate::ConfigurationError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Identifier of an error type.
///
/// Identifiers are compared by name, so two constants with the same name
/// denote the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorType(&'static str);

impl ErrorType {
    /// Root of every hierarchy. A handler bound to it catches everything.
    pub const ANY: Self = Self("Error");

    /// A panic caught at a call lifecycle entry point or inside a handler.
    pub const PANIC: Self = Self("Panic");

    /// An error that already carries an RPC status.
    pub const STATUS: Self = Self("StatusError");

    /// A broken call object, raised when closing a call fails.
    pub const ILLEGAL_STATE: Self = Self("IllegalState");

    /// Creates a new error type identifier.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the name of this error type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

const ROOT_PARENTS: [ErrorType; 1] = [ErrorType::ANY];

/// Immutable error type hierarchy.
///
/// Built once with [`TypeHierarchy::builder`] and shared read-only
/// afterwards; all queries are pure.
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    parents: HashMap<ErrorType, Vec<ErrorType>>,
}

impl TypeHierarchy {
    /// Creates a new hierarchy builder.
    #[must_use]
    pub fn builder() -> TypeHierarchyBuilder {
        TypeHierarchyBuilder::new()
    }

    /// Returns the direct parents of `ty`, superclass first.
    ///
    /// [`ErrorType::ANY`] has no parents.
    #[must_use]
    pub fn parents(&self, ty: ErrorType) -> &[ErrorType] {
        if ty == ErrorType::ANY {
            return &[];
        }
        match self.parents.get(&ty) {
            Some(parents) if !parents.is_empty() => parents,
            _ => &ROOT_PARENTS,
        }
    }

    /// Returns the number of inheritance steps from `ty` up to `ancestor`.
    ///
    /// The walk is breadth-first over [`parents`](Self::parents), so the
    /// result is the length of the shortest path. Returns `Some(0)` when
    /// both are the same type and `None` when `ancestor` is not an
    /// ancestor of `ty`.
    #[must_use]
    pub fn distance(&self, ancestor: ErrorType, ty: ErrorType) -> Option<usize> {
        self.ancestors(ty)
            .into_iter()
            .find(|(candidate, _)| *candidate == ancestor)
            .map(|(_, depth)| depth)
    }

    /// Returns `true` if an error of type `ty` can be handled as `ancestor`.
    #[must_use]
    pub fn is_assignable(&self, ancestor: ErrorType, ty: ErrorType) -> bool {
        self.distance(ancestor, ty).is_some()
    }

    /// Returns `ty` and all of its ancestors in breadth-first order,
    /// paired with their distance from `ty`.
    #[must_use]
    pub fn ancestors(&self, ty: ErrorType) -> Vec<(ErrorType, usize)> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(ty, 0)]);
        let mut ordered = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            ordered.push((current, depth));
            for parent in self.parents(current) {
                queue.push_back((*parent, depth + 1));
            }
        }

        ordered
    }

    /// Returns `true` if `ty` was explicitly declared.
    #[must_use]
    pub fn is_declared(&self, ty: ErrorType) -> bool {
        self.parents.contains_key(&ty)
    }

    /// Returns the number of declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns `true` if no types were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Builder for a [`TypeHierarchy`].
#[derive(Debug, Default)]
pub struct TypeHierarchyBuilder {
    parents: HashMap<ErrorType, Vec<ErrorType>>,
}

impl TypeHierarchyBuilder {
    /// Creates an empty builder with the built-in types declared.
    #[must_use]
    pub fn new() -> Self {
        let mut parents = HashMap::new();
        for builtin in [ErrorType::PANIC, ErrorType::STATUS, ErrorType::ILLEGAL_STATE] {
            parents.insert(builtin, Vec::new());
        }
        Self { parents }
    }

    /// Declares `ty` with the given parents, superclass first.
    ///
    /// Declaring the same type twice replaces the earlier declaration.
    #[must_use]
    pub fn declare(
        mut self,
        ty: ErrorType,
        parents: impl IntoIterator<Item = ErrorType>,
    ) -> Self {
        let mut ordered = Vec::new();
        for parent in parents {
            if !ordered.contains(&parent) {
                ordered.push(parent);
            }
        }
        self.parents.insert(ty, ordered);
        self
    }

    /// Validates and freezes the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::RootRedeclared`] if [`ErrorType::ANY`]
    /// was given parents, or [`ConfigurationError::CyclicHierarchy`] if a
    /// type is its own ancestor.
    pub fn build(self) -> Result<TypeHierarchy, ConfigurationError> {
        if self
            .parents
            .get(&ErrorType::ANY)
            .is_some_and(|parents| !parents.is_empty())
        {
            return Err(ConfigurationError::RootRedeclared);
        }

        let hierarchy = TypeHierarchy {
            parents: self.parents,
        };

        for (ty, parents) in &hierarchy.parents {
            let reaches_itself = parents.iter().any(|parent| {
                hierarchy
                    .ancestors(*parent)
                    .iter()
                    .any(|(ancestor, _)| ancestor == ty)
            });
            if reaches_itself {
                return Err(ConfigurationError::CyclicHierarchy { error_type: *ty });
            }
        }

        Ok(hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RUNTIME: ErrorType = ErrorType::new("RuntimeError");
    const ILLEGAL_ARGUMENT: ErrorType = ErrorType::new("IllegalArgument");
    const NUMBER_FORMAT: ErrorType = ErrorType::new("NumberFormat");
    const RETRYABLE: ErrorType = ErrorType::new("Retryable");
    const TIMEOUT: ErrorType = ErrorType::new("Timeout");

    fn hierarchy() -> TypeHierarchy {
        TypeHierarchy::builder()
            .declare(RUNTIME, [])
            .declare(ILLEGAL_ARGUMENT, [RUNTIME])
            .declare(NUMBER_FORMAT, [ILLEGAL_ARGUMENT])
            .declare(TIMEOUT, [RUNTIME, RETRYABLE])
            .build()
            .unwrap()
    }

    #[test]
    fn test_identity_distance_is_zero() {
        let hierarchy = hierarchy();
        assert_eq!(hierarchy.distance(RUNTIME, RUNTIME), Some(0));
    }

    #[test]
    fn test_distance_walks_superclass_chain() {
        let hierarchy = hierarchy();
        assert_eq!(hierarchy.distance(ILLEGAL_ARGUMENT, NUMBER_FORMAT), Some(1));
        assert_eq!(hierarchy.distance(RUNTIME, NUMBER_FORMAT), Some(2));
        assert_eq!(hierarchy.distance(ErrorType::ANY, NUMBER_FORMAT), Some(3));
    }

    #[test]
    fn test_distance_covers_interfaces() {
        let hierarchy = hierarchy();
        assert_eq!(hierarchy.distance(RETRYABLE, TIMEOUT), Some(1));
        assert!(hierarchy.is_assignable(RETRYABLE, TIMEOUT));
        assert!(!hierarchy.is_assignable(RETRYABLE, NUMBER_FORMAT));
    }

    #[test]
    fn test_descendant_is_not_ancestor() {
        let hierarchy = hierarchy();
        assert_eq!(hierarchy.distance(NUMBER_FORMAT, RUNTIME), None);
    }

    #[test]
    fn test_undeclared_type_descends_from_root() {
        let hierarchy = hierarchy();
        let unknown = ErrorType::new("Unknown");
        assert_eq!(hierarchy.parents(unknown), &[ErrorType::ANY]);
        assert_eq!(hierarchy.distance(ErrorType::ANY, unknown), Some(1));
        assert!(!hierarchy.is_declared(unknown));
    }

    #[test]
    fn test_builtins_are_declared() {
        let hierarchy = TypeHierarchy::builder().build().unwrap();
        assert!(hierarchy.is_declared(ErrorType::PANIC));
        assert!(hierarchy.is_declared(ErrorType::STATUS));
        assert_eq!(hierarchy.distance(ErrorType::ANY, ErrorType::PANIC), Some(1));
    }

    #[test]
    fn test_ancestors_are_breadth_first() {
        let hierarchy = hierarchy();
        let ancestors = hierarchy.ancestors(TIMEOUT);
        assert_eq!(
            ancestors,
            vec![
                (TIMEOUT, 0),
                (RUNTIME, 1),
                (RETRYABLE, 1),
                (ErrorType::ANY, 2),
            ]
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let a = ErrorType::new("A");
        let b = ErrorType::new("B");
        let result = TypeHierarchy::builder()
            .declare(a, [b])
            .declare(b, [a])
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::CyclicHierarchy { .. })
        ));
    }

    #[test]
    fn test_root_with_parents_is_rejected() {
        let result = TypeHierarchy::builder()
            .declare(ErrorType::ANY, [RUNTIME])
            .build();
        assert!(matches!(result, Err(ConfigurationError::RootRedeclared)));
    }

    #[test]
    fn test_duplicate_parents_are_collapsed() {
        let hierarchy = TypeHierarchy::builder()
            .declare(ILLEGAL_ARGUMENT, [RUNTIME, RUNTIME])
            .build()
            .unwrap();
        assert_eq!(hierarchy.parents(ILLEGAL_ARGUMENT), &[RUNTIME]);
    }

    const CHAIN: [ErrorType; 6] = [
        ErrorType::new("L0"),
        ErrorType::new("L1"),
        ErrorType::new("L2"),
        ErrorType::new("L3"),
        ErrorType::new("L4"),
        ErrorType::new("L5"),
    ];

    fn chain_hierarchy() -> TypeHierarchy {
        let mut builder = TypeHierarchy::builder().declare(CHAIN[0], []);
        for pair in CHAIN.windows(2) {
            builder = builder.declare(pair[1], [pair[0]]);
        }
        builder.build().unwrap()
    }

    proptest! {
        #[test]
        fn prop_chain_distance_is_index_difference(upper in 0usize..6, lower in 0usize..6) {
            let hierarchy = chain_hierarchy();
            let distance = hierarchy.distance(CHAIN[upper], CHAIN[lower]);
            if upper <= lower {
                prop_assert_eq!(distance, Some(lower - upper));
            } else {
                prop_assert_eq!(distance, None);
            }
        }

        #[test]
        fn prop_root_is_ancestor_of_everything(index in 0usize..6) {
            let hierarchy = chain_hierarchy();
            prop_assert_eq!(hierarchy.distance(ErrorType::ANY, CHAIN[index]), Some(index + 1));
        }
    }
}
