//! Type solver for the Kestrel checker.
//!
//! This crate holds everything about types that does not need the syntax
//! tree:
//!
//! - **Type model**: interned `TypeData` behind copyable `TypeId` handles
//! - **Relations**: identity, subtyping, assignability and casts with
//!   boxing, unboxing, widening and constant narrowing
//! - **Instantiation**: substitution, generic instantiation with a per
//!   declaration cache, deferred constraint verification
//! - **Call resolution**: overloads, generic inference, extension functions
//!   and lambda arguments
//!
//! Key properties:
//! - O(1) type equality via interning (`TypeId` comparison)
//! - Recursive queries are cut by `RecursionGuard`, never by stack overflow
//! - Diagnostics are produced lazily as `PendingDiagnostic`
mod call_inference;
pub mod call_resolution;
pub mod call_specificity;
mod class_hierarchy;
pub mod constraints;
pub mod def;
pub mod diagnostics;
mod env;
pub mod format;
pub mod instantiate;
mod intern;
mod narrowing;
pub mod numeric;
pub mod recursion;
pub mod relation;
pub mod relation_queries;
mod relation_rules;
pub mod signature;
pub mod types;

pub use call_inference::{Inference, complete_substitution};
pub use call_resolution::{
    ArityRange, CallArgument, CallResolutionError, CallSite, Candidate, ResolvedCall,
    SignatureResolver,
};
pub use class_hierarchy::ClassBuilder;
pub use constraints::{ConstraintObligations, PendingConstraint};
pub use def::{DefFlags, DefId, DefKind, DefinitionInfo, DefinitionStore, PropertyInfo, Visibility};
pub use diagnostics::{DiagnosticArg, DiagnosticSeverity, PendingDiagnostic};
pub use env::{Builtins, TypeEnvironment};
pub use format::TypeFormatter;
pub use instantiate::{
    InstantiationError, TypeSubstitution, instantiate_generic, instantiate_type,
    substitute_function, substitute_signature,
};
pub use intern::TypeInterner;
pub use numeric::Conversion;
pub use relation::{FailureKind, RelationFlags, TypeRelation};
pub use relation_queries::{RelationKind, RelationPolicy, RelationResult, query_relation};
pub use signature::{Signature, SignatureFlags, SignatureId};
pub use types::{
    FunctionShape, LiteralValue, ObjectRef, ParamInfo, PrimitiveKind, TypeData, TypeId, TypeList,
    TypeParamId,
};
