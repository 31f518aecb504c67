//! Type interning.
//!
//! `TypeInterner` hands out a stable `TypeId` per distinct `TypeData`.
//! Interning takes `&self`: the dedup table is a `DashMap` and the
//! `TypeId -> TypeData` table sits behind an `RwLock`, so the interner can be
//! shared by reference between the relation engine, the instantiation code
//! and the checker without threading `&mut` everywhere.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use kestrel_common::{Atom, Interner, internal_error};
use smallvec::SmallVec;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

use crate::def::DefId;
use crate::types::{
    FunctionShape, LiteralValue, ObjectRef, OrderedFloat, PrimitiveKind, TypeData, TypeId,
    TypeList, TypeParamId,
};

pub struct TypeInterner {
    map: DashMap<TypeData, TypeId>,
    types: RwLock<Vec<Arc<TypeData>>>,
    strings: Interner,
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = TypeInterner {
            map: DashMap::new(),
            types: RwLock::new(Vec::with_capacity(256)),
            strings: Interner::new(),
        };
        // Order must match the reserved constants on `TypeId`.
        let reserved = [
            (TypeData::Error, TypeId::ERROR),
            (TypeData::Any, TypeId::ANY),
            (TypeData::Null, TypeId::NULL),
            (TypeData::Undefined, TypeId::UNDEFINED),
            (TypeData::Void, TypeId::VOID),
            (TypeData::Never, TypeId::NEVER),
            (TypeData::Primitive(PrimitiveKind::Boolean), TypeId::BOOLEAN),
            (TypeData::Primitive(PrimitiveKind::Byte), TypeId::BYTE),
            (TypeData::Primitive(PrimitiveKind::Char), TypeId::CHAR),
            (TypeData::Primitive(PrimitiveKind::Short), TypeId::SHORT),
            (TypeData::Primitive(PrimitiveKind::Int), TypeId::INT),
            (TypeData::Primitive(PrimitiveKind::Long), TypeId::LONG),
            (TypeData::Primitive(PrimitiveKind::Float), TypeId::FLOAT),
            (TypeData::Primitive(PrimitiveKind::Double), TypeId::DOUBLE),
            (TypeData::String, TypeId::STRING),
        ];
        for (data, expected) in reserved {
            let id = interner.intern(data);
            if id != expected {
                internal_error!("reserved type interned out of order: {id:?} != {expected:?}");
            }
        }
        interner
    }

    /// Intern a type, returning the existing handle for equal data.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.map.get(&data) {
            return *id;
        }
        match self.map.entry(data) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
                let id = TypeId(types.len() as u32);
                types.push(Arc::new(entry.key().clone()));
                trace!(type_id = id.0, data = ?entry.key(), "interned type");
                entry.insert(id);
                id
            }
        }
    }

    pub fn lookup(&self, id: TypeId) -> Option<Arc<TypeData>> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(id.0 as usize).cloned()
    }

    /// Like `lookup`, for handles that must exist.
    pub fn get(&self, id: TypeId) -> Arc<TypeData> {
        match self.lookup(id) {
            Some(data) => data,
            None => internal_error!("dangling type handle {id:?}"),
        }
    }

    pub fn len(&self) -> usize {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // -------------------------------------------------------------------------
    // Strings
    // -------------------------------------------------------------------------

    pub fn intern_string(&self, s: &str) -> Atom {
        self.strings.intern(s)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.strings.resolve(atom)
    }

    // -------------------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------------------

    /// Integer literal; `long` when the value does not fit `int`.
    pub fn literal_int(&self, value: i64) -> TypeId {
        let kind = if i32::try_from(value).is_ok() {
            PrimitiveKind::Int
        } else {
            PrimitiveKind::Long
        };
        self.intern(TypeData::Literal(LiteralValue::Integer { kind, value }))
    }

    pub fn literal_float(&self, value: f64) -> TypeId {
        self.intern(TypeData::Literal(LiteralValue::Float {
            kind: PrimitiveKind::Double,
            value: OrderedFloat(value),
        }))
    }

    pub fn literal_bool(&self, value: bool) -> TypeId {
        self.intern(TypeData::Literal(LiteralValue::Boolean(value)))
    }

    pub fn literal_char(&self, value: u16) -> TypeId {
        self.intern(TypeData::Literal(LiteralValue::Char(value)))
    }

    pub fn literal_string(&self, value: &str) -> TypeId {
        let atom = self.intern_string(value);
        self.intern(TypeData::Literal(LiteralValue::String(atom)))
    }

    pub fn object(&self, def: DefId, args: impl IntoIterator<Item = TypeId>) -> TypeId {
        self.intern(TypeData::Object(ObjectRef {
            def,
            args: args.into_iter().collect(),
        }))
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Array(element))
    }

    pub fn resizable_array(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::ResizableArray(element))
    }

    pub fn tuple(&self, elements: impl IntoIterator<Item = TypeId>) -> TypeId {
        self.intern(TypeData::Tuple(elements.into_iter().collect()))
    }

    pub fn function(&self, shape: FunctionShape) -> TypeId {
        self.intern(TypeData::Function(shape))
    }

    pub fn type_param(&self, param: TypeParamId) -> TypeId {
        self.intern(TypeData::TypeParameter(param))
    }

    pub fn readonly(&self, inner: TypeId) -> TypeId {
        if matches!(*self.get(inner), TypeData::Readonly(_)) {
            return inner;
        }
        self.intern(TypeData::Readonly(inner))
    }

    pub fn partial(&self, inner: TypeId) -> TypeId {
        self.intern(TypeData::Partial(inner))
    }

    /// Union of `members`.
    ///
    /// Nested unions are flattened, duplicates and `never` dropped. `any` and
    /// the error type absorb everything. Zero members give `never`, one member
    /// gives that member. Subtype reduction is done by
    /// [`TypeEnvironment::union`](crate::TypeEnvironment::union).
    pub fn union(&self, members: impl IntoIterator<Item = TypeId>) -> TypeId {
        let mut flat: TypeList = SmallVec::new();
        for member in members {
            if member == TypeId::ERROR {
                return TypeId::ERROR;
            }
            if member == TypeId::ANY {
                return TypeId::ANY;
            }
            if member == TypeId::NEVER {
                continue;
            }
            match &*self.get(member) {
                TypeData::Union(inner) => {
                    for &m in inner {
                        if !flat.contains(&m) {
                            flat.push(m);
                        }
                    }
                }
                _ => {
                    if !flat.contains(&member) {
                        flat.push(member);
                    }
                }
            }
        }
        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => self.intern(TypeData::Union(flat)),
        }
    }

    pub fn union2(&self, a: TypeId, b: TypeId) -> TypeId {
        self.union([a, b])
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Union members, or the type itself.
    pub fn union_members(&self, id: TypeId) -> TypeList {
        match &*self.get(id) {
            TypeData::Union(members) => members.clone(),
            _ => smallvec::smallvec![id],
        }
    }

    pub fn is_union(&self, id: TypeId) -> bool {
        matches!(*self.get(id), TypeData::Union(_))
    }

    pub fn literal_value(&self, id: TypeId) -> Option<LiteralValue> {
        match *self.get(id) {
            TypeData::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Strip the constant marker.
    pub fn widen_literal(&self, id: TypeId) -> TypeId {
        match *self.get(id) {
            TypeData::Literal(value) => value.base_type(),
            _ => id,
        }
    }

    pub fn primitive_kind(&self, id: TypeId) -> Option<PrimitiveKind> {
        match *self.get(id) {
            TypeData::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn function_shape(&self, id: TypeId) -> Option<FunctionShape> {
        match &*self.get(id) {
            TypeData::Function(shape) => Some(shape.clone()),
            _ => None,
        }
    }

    pub fn object_ref(&self, id: TypeId) -> Option<ObjectRef> {
        match &*self.get(id) {
            TypeData::Object(obj) => Some(obj.clone()),
            _ => None,
        }
    }

    pub fn type_param_id(&self, id: TypeId) -> Option<TypeParamId> {
        match *self.get(id) {
            TypeData::TypeParameter(param) => Some(param),
            _ => None,
        }
    }

    /// Whether `null` or `undefined` is the type or one of its members.
    pub fn contains_nullish(&self, id: TypeId) -> bool {
        self.union_members(id)
            .iter()
            .any(|&m| m == TypeId::NULL || m == TypeId::UNDEFINED)
    }

    /// Whether any type parameter occurs inside `id`.
    pub fn contains_type_parameters(&self, id: TypeId) -> bool {
        match &*self.get(id) {
            TypeData::TypeParameter(_) => true,
            TypeData::Object(obj) => obj.args.iter().any(|&a| self.contains_type_parameters(a)),
            TypeData::Array(e)
            | TypeData::ResizableArray(e)
            | TypeData::Readonly(e)
            | TypeData::Partial(e)
            | TypeData::NonNullish(e) => self.contains_type_parameters(*e),
            TypeData::Tuple(list) | TypeData::Union(list) => {
                list.iter().any(|&m| self.contains_type_parameters(m))
            }
            TypeData::Function(shape) => {
                shape
                    .params
                    .iter()
                    .any(|p| self.contains_type_parameters(p.type_id))
                    || shape.rest.is_some_and(|r| self.contains_type_parameters(r))
                    || self.contains_type_parameters(shape.return_type)
            }
            _ => false,
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInterner")
            .field("types", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
