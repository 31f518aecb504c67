//! Assignability.
//!
//! On top of the supertype relation:
//! - `Error` on either side and an `Any` source are accepted silently
//! - Union targets prefer an identical member, then a supertype member, then
//!   a member reachable by widening only, then one needing boxing or unboxing
//! - Numeric widening, and range-checked constant narrowing of literals
//! - Boxing a primitive into its builtin class, unboxing a builtin class into
//!   its primitive followed by an optional widening
//! - A mutable value may be stored into `Readonly` of an assignable type

use crate::numeric::{Conversion, constant_conversion, legal_unboxing, widens_to};
use crate::relation::{RelationFlags, RuleKind, TypeRelation};
use crate::types::{LiteralValue, PrimitiveKind, TypeData, TypeId};

impl<'a> TypeRelation<'a> {
    pub(crate) fn assign(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target || source.is_error() || target.is_error() || source == TypeId::ANY {
            return true;
        }
        self.guarded((source, target, RuleKind::Assign), |rel| {
            rel.assign_data(source, target)
        })
    }

    fn assign_data(&mut self, source: TypeId, target: TypeId) -> bool {
        let env = self.env;
        let (source_data, target_data) = (env.interner.get(source), env.interner.get(target));

        if let TypeData::Union(members) = &*source_data {
            return members.iter().all(|&m| self.assign(m, target));
        }
        if self.supertype(target, source) {
            return true;
        }
        if let TypeData::Union(members) = &*target_data {
            return self.assign_to_union(source, members);
        }

        match (&*source_data, &*target_data) {
            (_, TypeData::Readonly(inner)) if !matches!(&*source_data, TypeData::Readonly(_)) => {
                self.assign(source, *inner)
            }
            (TypeData::Literal(value), TypeData::Primitive(kind)) => {
                self.assign_constant(value, *kind)
            }
            (TypeData::Primitive(from), TypeData::Primitive(to)) => self.widen(*from, *to),
            (TypeData::Literal(value), TypeData::Object(_)) => self.box_constant(value, target),
            (TypeData::Primitive(kind), _) if target_data.is_reference() => {
                self.box_into(*kind, target)
            }
            (TypeData::Object(_), TypeData::Primitive(to)) => self.unbox_into(source, *to),
            (TypeData::TypeParameter(param), _) => {
                let constraint = env.type_param_constraint(*param);
                self.assign(constraint, target)
            }
            _ => false,
        }
    }

    /// Tie-break: identity > supertype > widening only > any conversion.
    fn assign_to_union(&mut self, source: TypeId, members: &[TypeId]) -> bool {
        if members.iter().any(|&m| self.identical(m, source)) {
            return true;
        }
        if members.iter().any(|&m| self.supertype(m, source)) {
            return true;
        }
        let no_box = RelationFlags::NO_BOXING | RelationFlags::NO_UNBOXING;
        for &member in members {
            if self.with_extra_flags(no_box, |rel| rel.assign(source, member)) {
                return true;
            }
        }
        members
            .iter()
            .any(|&member| self.attempt(|rel| rel.assign(source, member)))
    }

    fn widen(&mut self, from: PrimitiveKind, to: PrimitiveKind) -> bool {
        if self.flags.contains(RelationFlags::NO_WIDENING) || !widens_to(from, to) {
            return false;
        }
        self.record(Conversion::Widen { from, to });
        true
    }

    /// Literal to primitive: same kind, widening, or range-checked narrowing.
    fn assign_constant(&mut self, value: &LiteralValue, target: PrimitiveKind) -> bool {
        match constant_conversion(value, target) {
            Some(None) => true,
            Some(Some(conversion)) => {
                if self.flags.contains(RelationFlags::NO_WIDENING) {
                    return false;
                }
                self.record(conversion);
                true
            }
            None => false,
        }
    }

    /// Literal to a boxed class: convert the constant to the class's
    /// primitive, then box. Other object targets box the literal's own kind.
    fn box_constant(&mut self, value: &LiteralValue, target: TypeId) -> bool {
        if self.flags.contains(RelationFlags::NO_BOXING) {
            return false;
        }
        let Some(base_kind) = self.env.interner.primitive_kind(value.base_type()) else {
            return false;
        };
        if let Some(kind) = self.env.unboxed_kind(target) {
            return self.attempt(|rel| {
                rel.assign_constant(value, kind) && {
                    rel.record(Conversion::Box(kind));
                    true
                }
            });
        }
        self.box_into(base_kind, target)
    }

    fn box_into(&mut self, kind: PrimitiveKind, target: TypeId) -> bool {
        if self.flags.contains(RelationFlags::NO_BOXING) {
            return false;
        }
        let boxed = self.env.boxed_type(kind);
        if !self.supertype(target, boxed) {
            return false;
        }
        self.record(Conversion::Box(kind));
        true
    }

    /// Legal boxed-primitive conversions: unbox to the class's own primitive,
    /// then widen.
    fn unbox_into(&mut self, source: TypeId, to: PrimitiveKind) -> bool {
        if self.flags.contains(RelationFlags::NO_UNBOXING) {
            return false;
        }
        let Some(from) = self.env.unboxed_kind(source) else {
            return false;
        };
        if !legal_unboxing(from, to) {
            return false;
        }
        if from != to && self.flags.contains(RelationFlags::NO_WIDENING) {
            return false;
        }
        self.record(Conversion::Unbox(from));
        if from != to {
            self.record(Conversion::Widen { from, to });
        }
        true
    }
}
