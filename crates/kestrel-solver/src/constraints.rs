//! Deferred type-parameter constraint checks.
//!
//! Instantiating `C<A>` while `C`'s own declaration (or `A`'s) is still being
//! resolved must not check `A` against the constraint yet: the constraint may
//! mention types that are not complete. Instantiation therefore pushes a
//! [`PendingConstraint`] and checks happen when the outermost
//! [`ConstraintObligations`] scope exits.

use kestrel_common::Span;
use tracing::debug;

use crate::diagnostics::{PendingDiagnostic, codes};
use crate::env::TypeEnvironment;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::relation::{RelationFlags, TypeRelation};
use crate::types::TypeParamId;

/// One instantiation whose arguments still need checking.
#[derive(Clone, Debug)]
pub struct PendingConstraint {
    pub params: Vec<TypeParamId>,
    pub substitution: TypeSubstitution,
    pub span: Span,
}

/// Queue of constraint checks with a reentrant scope counter.
#[derive(Debug, Default)]
pub struct ConstraintObligations {
    pending: Vec<PendingConstraint>,
    depth: u32,
}

impl ConstraintObligations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave a scope. Only the outermost exit drains the queue; inner exits
    /// return nothing.
    pub fn exit_scope(&mut self, env: &TypeEnvironment) -> Vec<PendingDiagnostic> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return Vec::new();
        }
        self.drain(env)
    }

    pub fn push(&mut self, constraint: PendingConstraint) {
        self.pending.push(constraint);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_deferring(&self) -> bool {
        self.depth > 0
    }

    fn drain(&mut self, env: &TypeEnvironment) -> Vec<PendingDiagnostic> {
        let mut diagnostics = Vec::new();
        for record in std::mem::take(&mut self.pending) {
            verify(env, &record, &mut diagnostics);
        }
        debug!(errors = diagnostics.len(), "verified deferred constraints");
        diagnostics
    }
}

fn verify(env: &TypeEnvironment, record: &PendingConstraint, out: &mut Vec<PendingDiagnostic>) {
    for &param in &record.params {
        let Some(arg) = record.substitution.get(param) else {
            continue;
        };
        let Some(constraint) = env.defs.type_param(param).constraint else {
            continue;
        };
        // Constraints may refer to sibling parameters (`T extends Comparable<T>`).
        let bound = instantiate_type(env, constraint, &record.substitution);
        let mut relation = TypeRelation::new(env).with_flags(RelationFlags::NO_THROW);
        if !relation.is_assignable(arg, bound) {
            out.push(
                PendingDiagnostic::error(
                    codes::CONSTRAINT_NOT_SATISFIED,
                    vec![arg.into(), bound.into(), env.type_param_name(param).into()],
                )
                .with_span(record.span),
            );
        }
    }
}

#[cfg(test)]
#[path = "../tests/constraint_tests.rs"]
mod tests;
