//! The type environment: interner, declaration table and builtins.
//!
//! Every solver operation takes a `&TypeEnvironment`. Builtin classes
//! (`Object`, `Numeric` and the boxed primitives) are registered once in
//! `TypeEnvironment::new` and reused for the lifetime of the run.

use kestrel_common::Atom;
use tracing::trace;

use crate::def::{DefFlags, DefId, DefinitionInfo, DefinitionStore};
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::intern::TypeInterner;
use crate::relation::TypeRelation;
use crate::types::{PrimitiveKind, TypeData, TypeId, TypeList, TypeParamId};

/// Handles of the builtin declarations.
#[derive(Clone, Debug)]
pub struct Builtins {
    pub object: DefId,
    pub numeric: DefId,
    boxed: [DefId; 8],
    /// `Object`
    pub object_type: TypeId,
    /// `Object | null | undefined`, the implicit constraint of an
    /// unconstrained type parameter.
    pub nullable_object: TypeId,
}

impl Builtins {
    pub fn boxed_def(&self, kind: PrimitiveKind) -> DefId {
        self.boxed[kind as usize]
    }
}

pub struct TypeEnvironment {
    pub interner: TypeInterner,
    pub defs: DefinitionStore,
    pub builtins: Builtins,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        let interner = TypeInterner::new();
        let defs = DefinitionStore::new();

        let object = defs.register(
            DefinitionInfo::class(interner.intern_string("Object")).with_flags(DefFlags::BUILTIN),
        );
        let object_type = interner.object(object, []);

        let numeric = defs.register(
            DefinitionInfo::class(interner.intern_string("Numeric"))
                .with_flags(DefFlags::BUILTIN | DefFlags::ABSTRACT),
        );
        defs.set_super_class(numeric, object_type);
        let numeric_type = interner.object(numeric, []);

        let boxed = PrimitiveKind::ALL.map(|kind| {
            let def = defs.register(
                DefinitionInfo::class(interner.intern_string(kind.boxed_name()))
                    .with_flags(DefFlags::BUILTIN | DefFlags::FINAL)
                    .with_boxed(kind),
            );
            let parent = if kind.is_numeric() && kind != PrimitiveKind::Char {
                numeric_type
            } else {
                object_type
            };
            defs.set_super_class(def, parent);
            def
        });

        let nullable_object = interner.union([object_type, TypeId::NULL, TypeId::UNDEFINED]);
        trace!(object = object.0, numeric = numeric.0, "registered builtins");

        TypeEnvironment {
            interner,
            defs,
            builtins: Builtins {
                object,
                numeric,
                boxed,
                object_type,
                nullable_object,
            },
        }
    }

    pub fn intern_string(&self, s: &str) -> Atom {
        self.interner.intern_string(s)
    }

    pub fn relation(&self) -> TypeRelation<'_> {
        TypeRelation::new(self)
    }

    // -------------------------------------------------------------------------
    // Boxing
    // -------------------------------------------------------------------------

    pub fn boxed_type(&self, kind: PrimitiveKind) -> TypeId {
        self.interner.object(self.builtins.boxed_def(kind), [])
    }

    /// Primitive kind a boxed builtin instance unboxes to.
    pub fn unboxed_kind(&self, ty: TypeId) -> Option<PrimitiveKind> {
        let obj = self.interner.object_ref(ty)?;
        self.defs.boxed_kind(obj.def)
    }

    /// Box primitives and value literals; reference types pass through.
    pub fn box_if_primitive(&self, ty: TypeId) -> TypeId {
        let widened = match *self.interner.get(ty) {
            TypeData::Literal(value) if !matches!(value, crate::types::LiteralValue::String(_)) => {
                value.base_type()
            }
            _ => ty,
        };
        match self.interner.primitive_kind(widened) {
            Some(kind) => self.boxed_type(kind),
            None => widened,
        }
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    /// The generic declared type `C<T1, .., Tn>` of a class or interface.
    pub fn declared_type(&self, def: DefId) -> TypeId {
        let params = self.defs.get_type_params(def);
        let args: TypeList = params.iter().map(|&p| self.interner.type_param(p)).collect();
        self.interner.object(def, args)
    }

    /// Upper bound of a type parameter.
    pub fn type_param_constraint(&self, param: TypeParamId) -> TypeId {
        self.defs
            .type_param(param)
            .constraint
            .unwrap_or(self.builtins.nullable_object)
    }

    pub fn type_param_name(&self, param: TypeParamId) -> Atom {
        self.defs.type_param(param).name
    }

    /// Substitution mapping a definition's type parameters to `args`.
    pub fn substitution_for(&self, def: DefId, args: &[TypeId]) -> TypeSubstitution {
        let params = self.defs.get_type_params(def);
        let mut subst = TypeSubstitution::new();
        for (param, &arg) in params.iter().zip(args) {
            subst.insert(self, *param, arg);
        }
        subst
    }

    // -------------------------------------------------------------------------
    // Nullish handling
    // -------------------------------------------------------------------------

    /// Remove `null` and/or `undefined` from `ty`.
    pub fn remove_nullish(&self, ty: TypeId, null: bool, undefined: bool) -> TypeId {
        let members = self.interner.union_members(ty);
        let kept = members
            .iter()
            .copied()
            .filter(|&m| !(null && m == TypeId::NULL) && !(undefined && m == TypeId::UNDEFINED));
        self.interner.union(kept)
    }

    /// `T!`: the non-nullish part of `ty`. Type parameters stay wrapped since
    /// their argument is not known yet.
    pub fn non_nullish(&self, ty: TypeId) -> TypeId {
        let members = self.interner.union_members(ty);
        let mapped: TypeList = members
            .iter()
            .filter(|&&m| m != TypeId::NULL && m != TypeId::UNDEFINED)
            .map(|&m| match *self.interner.get(m) {
                TypeData::TypeParameter(_) => self.interner.intern(TypeData::NonNullish(m)),
                _ => m,
            })
            .collect();
        self.interner.union(mapped)
    }

    // -------------------------------------------------------------------------
    // Unions
    // -------------------------------------------------------------------------

    /// Union with subtype reduction: members that are subtypes of another
    /// member are dropped, so `Object | String` is `Object` and `1 | int` is
    /// `int`.
    pub fn union(&self, members: impl IntoIterator<Item = TypeId>) -> TypeId {
        let raw = self.interner.union(members);
        let list = match &*self.interner.get(raw) {
            TypeData::Union(list) => list.clone(),
            _ => return raw,
        };
        let mut relation = self.relation();
        let kept: TypeList = list
            .iter()
            .enumerate()
            .filter(|&(i, &m)| {
                !list.iter().enumerate().any(|(j, &other)| {
                    if i == j || !relation.is_supertype_of(other, m) {
                        return false;
                    }
                    // Mutual supertypes are the same type; keep the first.
                    !relation.is_supertype_of(m, other) || j < i
                })
            })
            .map(|(_, &m)| m)
            .collect();
        self.interner.union(kept)
    }

    pub fn union2(&self, a: TypeId, b: TypeId) -> TypeId {
        self.union([a, b])
    }

    /// Apply `subst` to `ty`.
    pub fn substitute(&self, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
        instantiate_type(self, ty, subst)
    }
}

impl Default for TypeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
