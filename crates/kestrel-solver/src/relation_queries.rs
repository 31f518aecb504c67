//! Unified relation query entrypoint.
//!
//! Callers that only need a yes/no answer (plus the conversions a
//! successful assignability or cast check recorded) go through
//! `query_relation` instead of configuring a `TypeRelation` by hand.

use smallvec::SmallVec;

use crate::env::TypeEnvironment;
use crate::numeric::Conversion;
use crate::relation::{FailureKind, RelationFlags, TypeRelation};
use crate::types::TypeId;

/// Relation categories, read as "source R target".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Identical,
    /// Source is a supertype of target.
    Supertype,
    /// Source is a subtype of target.
    Subtype,
    Assignable,
    Castable,
}

/// Policy knobs for relation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationPolicy {
    pub flags: RelationFlags,
    pub failure_kind: FailureKind,
}

impl Default for RelationPolicy {
    fn default() -> Self {
        Self {
            flags: RelationFlags::NO_THROW,
            failure_kind: FailureKind::Assignment,
        }
    }
}

impl RelationPolicy {
    pub fn with_boxing(mut self, allowed: bool) -> Self {
        self.flags.set(RelationFlags::NO_BOXING | RelationFlags::NO_UNBOXING, !allowed);
        self
    }

    pub fn with_widening(mut self, allowed: bool) -> Self {
        self.flags.set(RelationFlags::NO_WIDENING, !allowed);
        self
    }
}

/// Result of a relation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationResult {
    pub kind: RelationKind,
    pub related: bool,
    pub conversions: SmallVec<[Conversion; 2]>,
    pub depth_exceeded: bool,
}

impl RelationResult {
    #[inline]
    pub fn is_related(&self) -> bool {
        self.related
    }
}

pub fn query_relation(
    env: &TypeEnvironment,
    source: TypeId,
    target: TypeId,
    kind: RelationKind,
    policy: RelationPolicy,
) -> RelationResult {
    let mut relation = TypeRelation::new(env)
        .with_flags(policy.flags)
        .with_failure_kind(policy.failure_kind);
    let related = match kind {
        RelationKind::Identical => relation.is_identical(source, target),
        RelationKind::Supertype => relation.is_supertype_of(source, target),
        RelationKind::Subtype => relation.is_subtype_of(source, target),
        RelationKind::Assignable => relation.is_assignable(source, target),
        RelationKind::Castable => relation.is_castable(source, target),
    };
    RelationResult {
        kind,
        related,
        conversions: relation.take_conversions(),
        depth_exceeded: relation.depth_exceeded(),
    }
}

pub fn is_assignable(env: &TypeEnvironment, source: TypeId, target: TypeId) -> bool {
    query_relation(env, source, target, RelationKind::Assignable, RelationPolicy::default())
        .is_related()
}

pub fn is_subtype_of(env: &TypeEnvironment, source: TypeId, target: TypeId) -> bool {
    query_relation(env, source, target, RelationKind::Subtype, RelationPolicy::default())
        .is_related()
}
