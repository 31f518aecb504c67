//! Explicit casts (`expr as T`).
//!
//! A cast succeeds when the source is assignable, when it is a downcast,
//! between any two numeric primitives (through boxing where needed), for
//! union sources with a castable member, and between a non-final class and
//! an interface. Type parameters are cast through their constraint.

use crate::def::{DefFlags, DefId};
use crate::env::TypeEnvironment;
use crate::numeric::{Conversion, numeric_cast};
use crate::relation::{RuleKind, TypeRelation};
use crate::types::{PrimitiveKind, TypeData, TypeId};

impl<'a> TypeRelation<'a> {
    pub(crate) fn cast(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target || source.is_error() || target.is_error() {
            return true;
        }
        self.guarded((source, target, RuleKind::Cast), |rel| {
            rel.cast_data(source, target)
        })
    }

    fn cast_data(&mut self, source: TypeId, target: TypeId) -> bool {
        if self.attempt(|rel| rel.assign(source, target)) {
            return true;
        }
        // Downcast.
        if self.supertype(source, target) {
            return true;
        }

        let env = self.env;
        let (source_data, target_data) = (env.interner.get(source), env.interner.get(target));
        match (&*source_data, &*target_data) {
            (TypeData::Union(members), _) => members
                .iter()
                .any(|&m| self.attempt(|rel| rel.cast(m, target))),
            (_, TypeData::Union(members)) => members
                .iter()
                .any(|&m| self.attempt(|rel| rel.cast(source, m))),
            (TypeData::TypeParameter(param), _) => {
                let constraint = env.type_param_constraint(*param);
                self.cast(constraint, target)
            }
            (_, TypeData::TypeParameter(param)) => {
                let constraint = env.type_param_constraint(*param);
                self.cast(source, constraint)
            }
            (TypeData::Object(from), TypeData::Object(to)) => {
                self.interface_cast(from.def, to.def) || self.boxed_numeric_cast(source, target)
            }
            _ => self.numeric_value_cast(source, target),
        }
    }

    /// Casts between a class and an interface are allowed unless the class
    /// is final and does not implement it.
    fn interface_cast(&self, from: DefId, to: DefId) -> bool {
        let defs = &self.env.defs;
        let from_interface = defs.get(from).is_some_and(|d| d.is_interface());
        let to_interface = defs.get(to).is_some_and(|d| d.is_interface());
        match (from_interface, to_interface) {
            (true, true) => true,
            (false, true) => !defs.get_flags(from).contains(DefFlags::FINAL),
            (true, false) => !defs.get_flags(to).contains(DefFlags::FINAL),
            (false, false) => false,
        }
    }

    /// `Double as Int`: unbox, convert, box.
    fn boxed_numeric_cast(&mut self, source: TypeId, target: TypeId) -> bool {
        let (Some(from), Some(to)) = (self.env.unboxed_kind(source), self.env.unboxed_kind(target))
        else {
            return false;
        };
        let Some(conversion) = numeric_cast(from, to) else {
            return false;
        };
        self.record(Conversion::Unbox(from));
        self.record(conversion);
        self.record(Conversion::Box(to));
        true
    }

    /// Numeric primitive (or boxed numeric) to numeric primitive (or boxed
    /// numeric).
    fn numeric_value_cast(&mut self, source: TypeId, target: TypeId) -> bool {
        let env = self.env;
        let source_kind = value_kind(env, source);
        let target_kind = value_kind(env, target);
        let (Some((from, from_boxed)), Some((to, to_boxed))) = (source_kind, target_kind) else {
            return false;
        };
        let Some(conversion) = numeric_cast(from, to) else {
            return false;
        };
        if from_boxed {
            self.record(Conversion::Unbox(from));
        }
        self.record(conversion);
        if to_boxed {
            self.record(Conversion::Box(to));
        }
        true
    }
}

/// Primitive kind of a numeric value type, and whether it is boxed.
fn value_kind(env: &TypeEnvironment, ty: TypeId) -> Option<(PrimitiveKind, bool)> {
    let widened = env.interner.widen_literal(ty);
    if let Some(kind) = env.interner.primitive_kind(widened) {
        return Some((kind, false));
    }
    env.unboxed_kind(ty).map(|kind| (kind, true))
}
