//! The type relation engine.
//!
//! A `TypeRelation` answers identity, subtype, assignability and cast
//! queries between two types under a set of [`RelationFlags`]. Successful
//! assignability and cast queries record the primitive conversions the
//! backend has to emit; failed ones queue a [`PendingDiagnostic`] unless
//! `NO_THROW` is set.
//!
//! The rules themselves live in `relation_rules/`:
//! - `identity.rs`: structural identity
//! - `subtype.rs`: the supertype relation (nominal classes, arrays, functions, wrappers)
//! - `assign.rs`: assignability (widening, constant narrowing, boxing, unboxing)
//! - `cast.rs`: explicit casts
//!
//! Internal rule functions never report. Only the public entry points turn a
//! `false` into a diagnostic, so speculative sub-queries stay silent.

use bitflags::bitflags;
use smallvec::SmallVec;
use tracing::trace;

use crate::diagnostics::{PendingDiagnostic, codes};
use crate::env::TypeEnvironment;
use crate::numeric::Conversion;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::TypeId;

bitflags! {
    /// Policy knobs for a relation query.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RelationFlags: u16 {
        /// No primitive -> boxed conversion.
        const NO_BOXING = 1 << 0;
        /// No boxed -> primitive conversion.
        const NO_UNBOXING = 1 << 1;
        /// No numeric widening and no constant narrowing.
        const NO_WIDENING = 1 << 2;
        /// Fail silently.
        const NO_THROW = 1 << 3;
        /// Checking a `return` expression: generic arguments are covariant.
        const DIRECT_RETURN = 1 << 4;
    }
}

/// What a failed relation is reported as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailureKind {
    #[default]
    Assignment,
    Return,
    Argument,
    Cast,
    Constraint,
}

impl FailureKind {
    pub fn code(self) -> u32 {
        match self {
            FailureKind::Assignment => codes::TYPE_NOT_ASSIGNABLE,
            FailureKind::Return => codes::RETURN_TYPE_MISMATCH,
            FailureKind::Argument => codes::ARG_NOT_ASSIGNABLE,
            FailureKind::Cast => codes::CAST_UNREACHABLE,
            FailureKind::Constraint => codes::CONSTRAINT_NOT_SATISFIED,
        }
    }
}

/// Which rule set a guard entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum RuleKind {
    Identity,
    Supertype,
    Assign,
    Cast,
}

pub struct TypeRelation<'a> {
    pub(crate) env: &'a TypeEnvironment,
    pub(crate) flags: RelationFlags,
    failure_kind: FailureKind,
    conversions: SmallVec<[Conversion; 2]>,
    diagnostics: Vec<PendingDiagnostic>,
    guard: RecursionGuard<(TypeId, TypeId, RuleKind)>,
}

impl<'a> TypeRelation<'a> {
    pub fn new(env: &'a TypeEnvironment) -> Self {
        TypeRelation {
            env,
            flags: RelationFlags::empty(),
            failure_kind: FailureKind::default(),
            conversions: SmallVec::new(),
            diagnostics: Vec::new(),
            guard: RecursionGuard::with_profile(RecursionProfile::Relation),
        }
    }

    pub fn with_flags(mut self, flags: RelationFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_failure_kind(mut self, kind: FailureKind) -> Self {
        self.failure_kind = kind;
        self
    }

    pub fn flags(&self) -> RelationFlags {
        self.flags
    }

    /// Conversions recorded by successful queries so far.
    pub fn conversions(&self) -> &[Conversion] {
        &self.conversions
    }

    pub fn take_conversions(&mut self) -> SmallVec<[Conversion; 2]> {
        std::mem::take(&mut self.conversions)
    }

    pub fn take_diagnostics(&mut self) -> Vec<PendingDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Whether some query gave up on the recursion limit.
    pub fn depth_exceeded(&self) -> bool {
        self.guard.is_exceeded()
    }

    // =========================================================================
    // Public queries
    // =========================================================================

    pub fn is_identical(&mut self, a: TypeId, b: TypeId) -> bool {
        self.identical(a, b)
    }

    /// `sup ⊇ sub`.
    pub fn is_supertype_of(&mut self, sup: TypeId, sub: TypeId) -> bool {
        self.supertype(sup, sub)
    }

    pub fn is_subtype_of(&mut self, sub: TypeId, sup: TypeId) -> bool {
        self.supertype(sup, sub)
    }

    pub fn is_assignable(&mut self, source: TypeId, target: TypeId) -> bool {
        let mark = self.conversions.len();
        let related = self.assign(source, target);
        trace!(source = source.0, target = target.0, related, "assignability");
        if !related {
            self.conversions.truncate(mark);
            self.report(source, target);
        }
        related
    }

    pub fn is_castable(&mut self, source: TypeId, target: TypeId) -> bool {
        let mark = self.conversions.len();
        let related = self.cast(source, target);
        trace!(source = source.0, target = target.0, related, "castability");
        if !related {
            self.conversions.truncate(mark);
            self.report(source, target);
        }
        related
    }

    fn report(&mut self, source: TypeId, target: TypeId) {
        if self.flags.contains(RelationFlags::NO_THROW) {
            return;
        }
        self.diagnostics.push(PendingDiagnostic::error(
            self.failure_kind.code(),
            vec![source.into(), target.into()],
        ));
    }

    // =========================================================================
    // Shared helpers for the rule modules
    // =========================================================================

    /// Run `rule` under the recursion guard. A revisited pair is assumed to
    /// hold; a pair past the depth limit does not.
    pub(crate) fn guarded(
        &mut self,
        key: (TypeId, TypeId, RuleKind),
        rule: impl FnOnce(&mut Self) -> bool,
    ) -> bool {
        match self.guard.enter(key) {
            RecursionResult::Entered => {
                let result = rule(self);
                self.guard.leave(key);
                result
            }
            RecursionResult::Cycle => true,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => false,
        }
    }

    pub(crate) fn record(&mut self, conversion: Conversion) {
        self.conversions.push(conversion);
    }

    /// Run `attempt`; on failure drop whatever it recorded.
    pub(crate) fn attempt(&mut self, attempt: impl FnOnce(&mut Self) -> bool) -> bool {
        let mark = self.conversions.len();
        let ok = attempt(self);
        if !ok {
            self.conversions.truncate(mark);
        }
        ok
    }

    /// Run `attempt` with `extra` flags added.
    pub(crate) fn with_extra_flags(
        &mut self,
        extra: RelationFlags,
        attempt: impl FnOnce(&mut Self) -> bool,
    ) -> bool {
        let saved = self.flags;
        self.flags |= extra;
        let ok = self.attempt(attempt);
        self.flags = saved;
        ok
    }
}

#[cfg(test)]
#[path = "../tests/relation_tests.rs"]
mod tests;
