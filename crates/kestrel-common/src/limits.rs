//! Centralized limits and thresholds for the Kestrel type checker.
//!
//! Every recursive algorithm in the solver and checker is bounded by one of
//! these constants. Exceeding a limit never panics: the offending operation
//! yields the error type and, where a user-visible cause exists, a diagnostic.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum depth for expression type checking.
///
/// Each nested expression adds a frame to the call stack; at this depth the
/// checker stops descending and types the remaining subtree as the error type.
///
/// ```text
/// f(f(f(f(f(f(f(f(/* ... 500 levels ... */))))))))
/// ```
pub const MAX_EXPR_CHECK_DEPTH: u32 = 500;

/// Maximum depth for generic type instantiation.
///
/// Substituting into a type whose arguments mention further generic
/// applications recurses once per level. When exceeded the checker reports
/// "Type instantiation is excessively deep and possibly infinite." and
/// substitutes the error type.
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Maximum depth for a single relation query (identity, subtype,
/// assignability, cast).
///
/// Deeply nested generic arguments and function shapes recurse per level.
/// A query that exceeds this depth answers `false`.
pub const MAX_RELATION_DEPTH: u32 = 100;

/// Maximum depth for structural unification during generic call inference.
pub const MAX_INFERENCE_DEPTH: u32 = 32;

/// Maximum number of super-class/interface hops when walking a class
/// hierarchy. Guards against cyclic `extends` chains introduced by
/// malformed declarations.
pub const MAX_HIERARCHY_DEPTH: u32 = 64;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Inline capacity for short type lists (type arguments, union members).
pub const TYPE_LIST_INLINE: usize = 4;

/// Maximum number of candidate signatures rendered in a resolution
/// diagnostic before eliding the rest.
pub const CANDIDATE_DIAGNOSTIC_LIMIT: usize = 8;
