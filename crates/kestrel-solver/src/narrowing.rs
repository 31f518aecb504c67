//! Type narrowing primitives used by smart casts.
//!
//! These are pure type operations. Which variable they apply to, and when a
//! narrowing stops being valid, is the checker's business.

use tracing::trace;

use crate::env::TypeEnvironment;
use crate::types::{LiteralValue, TypeData, TypeId, TypeList};

impl TypeEnvironment {
    /// The non-nullish part of `declared` (`x != null`).
    pub fn exclude_nullish(&self, declared: TypeId) -> TypeId {
        self.non_nullish(declared)
    }

    /// Only the nullish part of `declared` (`x == null`). A loose test keeps
    /// both `null` and `undefined`; a strict test keeps only `tested`.
    pub fn nullish_part(&self, declared: TypeId, tested: TypeId, strict: bool) -> TypeId {
        let members = self.interner.union_members(declared);
        let kept = members.iter().copied().filter(|&m| {
            if strict {
                m == tested
            } else {
                m == TypeId::NULL || m == TypeId::UNDEFINED
            }
        });
        self.interner.union(kept)
    }

    /// `x instanceof T` true branch: `T`, or the members of a union
    /// `declared` that are subtypes of `T` when there are any.
    pub fn narrow_to(&self, declared: TypeId, tested: TypeId) -> TypeId {
        let members = self.interner.union_members(declared);
        let mut relation = self.relation();
        let matching: TypeList = members
            .iter()
            .copied()
            .filter(|&m| relation.is_subtype_of(m, tested))
            .collect();
        if matching.is_empty() {
            return tested;
        }
        self.interner.union(matching)
    }

    /// `x instanceof T` false branch: union members of `declared` that are
    /// not subtypes of `tested`. A non-union declared type is not narrowed
    /// (returns `None`).
    pub fn complement(&self, declared: TypeId, tested: TypeId) -> Option<TypeId> {
        let data = self.interner.get(declared);
        let TypeData::Union(members) = &*data else {
            return None;
        };
        let mut relation = self.relation();
        let remaining: TypeList = members
            .iter()
            .copied()
            .filter(|&m| !relation.is_subtype_of(m, tested))
            .collect();
        trace!(
            declared = declared.0,
            tested = tested.0,
            remaining = remaining.len(),
            "instanceof complement"
        );
        Some(self.interner.union(remaining))
    }

    /// `x == literal` with a non-nullish literal: the union member of
    /// `declared` the literal belongs to (its base type or boxed class).
    pub fn narrow_to_literal_base(&self, declared: TypeId, literal: TypeId) -> Option<TypeId> {
        let value: LiteralValue = self.interner.literal_value(literal)?;
        let base = value.base_type();
        let boxed = self.box_if_primitive(base);
        let members = self.interner.union_members(declared);
        if members.len() < 2 {
            return None;
        }
        let mut relation = self.relation();
        members
            .iter()
            .copied()
            .find(|&m| m == base || m == boxed || relation.is_identical(m, base))
    }

    /// The narrower of two candidate narrowings of the same variable (`&&`).
    /// For unrelated candidates the later test wins.
    pub fn narrow_intersection(&self, a: TypeId, b: TypeId) -> TypeId {
        if self.relation().is_subtype_of(a, b) { a } else { b }
    }

    /// Merge two branch states of the same variable.
    pub fn merge_union(&self, a: TypeId, b: TypeId) -> TypeId {
        self.union2(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClassBuilder;

    #[test]
    fn test_narrow_and_complement_on_union() {
        let env = TypeEnvironment::new();
        let declared = env.interner.union([TypeId::DOUBLE, TypeId::STRING]);
        assert_eq!(env.narrow_to(declared, TypeId::STRING), TypeId::STRING);
        assert_eq!(env.complement(declared, TypeId::STRING), Some(TypeId::DOUBLE));
    }

    #[test]
    fn test_complement_of_non_union_is_none() {
        let env = TypeEnvironment::new();
        let animal = ClassBuilder::class(&env, "Animal").build();
        let animal_ty = env.declared_type(animal);
        assert_eq!(env.complement(animal_ty, animal_ty), None);
    }

    #[test]
    fn test_nullish_parts() {
        let env = TypeEnvironment::new();
        let declared = env.interner.union([TypeId::STRING, TypeId::NULL, TypeId::UNDEFINED]);
        assert_eq!(env.exclude_nullish(declared), TypeId::STRING);
        assert_eq!(
            env.nullish_part(declared, TypeId::NULL, false),
            env.interner.union([TypeId::NULL, TypeId::UNDEFINED])
        );
        assert_eq!(env.nullish_part(declared, TypeId::NULL, true), TypeId::NULL);
    }

    #[test]
    fn test_narrow_intersection_prefers_subtype() {
        let env = TypeEnvironment::new();
        let animal = ClassBuilder::class(&env, "Animal").build();
        let animal_ty = env.declared_type(animal);
        let dog = ClassBuilder::class(&env, "Dog").extends(animal_ty).build();
        let dog_ty = env.declared_type(dog);
        assert_eq!(env.narrow_intersection(animal_ty, dog_ty), dog_ty);
        assert_eq!(env.narrow_intersection(dog_ty, animal_ty), dog_ty);
    }
}
