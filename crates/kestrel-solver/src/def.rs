//! Definition identifiers and storage for the solver.
//!
//! The declaration table the binder populates: classes and interfaces with
//! their members and supertypes, type-parameter declarations, signatures and
//! overload sets for free and extension functions.
//!
//! ## Mutability
//!
//! Definition payloads are immutable once registered, with two late-bound
//! exceptions that may each be written once:
//!
//! | Setter | Why late |
//! |--------|----------|
//! | `set_super_class` / `set_interfaces` | supertypes can refer to classes registered later |
//! | `set_type_param_constraint` | `T extends Comparable<T>` needs `T` to exist first |

use bitflags::bitflags;
use dashmap::DashMap;
use kestrel_common::{Atom, internal_error};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

use crate::signature::{Signature, SignatureId};
use crate::types::{PrimitiveKind, TypeId, TypeList, TypeParamId};

// =============================================================================
// DefId
// =============================================================================

/// Identifier of a class or interface declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    Class,
    Interface,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DefFlags: u8 {
        const ABSTRACT = 1 << 0;
        const FINAL    = 1 << 1;
        /// Registered by the environment at start-up.
        const BUILTIN  = 1 << 2;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: Atom,
    pub type_id: TypeId,
    pub visibility: Visibility,
}

impl PropertyInfo {
    pub fn new(name: Atom, type_id: TypeId) -> Self {
        PropertyInfo {
            name,
            type_id,
            visibility: Visibility::Public,
        }
    }
}

// =============================================================================
// Definition Info
// =============================================================================

#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    pub name: Atom,
    pub type_params: Vec<TypeParamId>,
    /// Direct super class, written once by `set_super_class`.
    pub super_class: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub properties: Vec<PropertyInfo>,
    /// Overloads appear as repeated names.
    pub methods: Vec<(Atom, SignatureId)>,
    pub flags: DefFlags,
    /// For boxed builtins: the primitive this class boxes.
    pub boxed: Option<PrimitiveKind>,
}

impl DefinitionInfo {
    pub fn class(name: Atom) -> Self {
        DefinitionInfo {
            kind: DefKind::Class,
            name,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            flags: DefFlags::empty(),
            boxed: None,
        }
    }

    pub fn interface(name: Atom) -> Self {
        DefinitionInfo {
            kind: DefKind::Interface,
            ..DefinitionInfo::class(name)
        }
    }

    pub fn with_type_params(mut self, params: Vec<TypeParamId>) -> Self {
        self.type_params = params;
        self
    }

    pub fn with_flags(mut self, flags: DefFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_boxed(mut self, kind: PrimitiveKind) -> Self {
        self.boxed = Some(kind);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind == DefKind::Interface
    }

    pub fn property(&self, name: Atom) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn methods_named(&self, name: Atom) -> impl Iterator<Item = SignatureId> + '_ {
        self.methods
            .iter()
            .filter(move |(n, _)| *n == name)
            .map(|(_, sig)| *sig)
    }
}

/// Declaration of one type parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub name: Atom,
    pub constraint: Option<TypeId>,
    pub default: Option<TypeId>,
    pub owner: Option<DefId>,
}

// =============================================================================
// DefinitionStore
// =============================================================================

/// Storage for declarations, signatures and the instantiation cache.
///
/// Uses `DashMap` so the store can be shared by reference; all writes after
/// construction are append-only or one-shot late-bound setters.
pub struct DefinitionStore {
    definitions: DashMap<DefId, DefinitionInfo>,
    next_def: AtomicU32,
    type_params: DashMap<TypeParamId, TypeParamDecl>,
    next_type_param: AtomicU32,
    signatures: DashMap<SignatureId, Arc<Signature>>,
    next_signature: AtomicU32,
    functions: DashMap<Atom, Vec<SignatureId>>,
    extensions: DashMap<Atom, Vec<SignatureId>>,
    instantiations: DashMap<(DefId, TypeList), TypeId>,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            next_def: AtomicU32::new(DefId::FIRST_VALID),
            type_params: DashMap::new(),
            next_type_param: AtomicU32::new(0),
            signatures: DashMap::new(),
            next_signature: AtomicU32::new(0),
            functions: DashMap::new(),
            extensions: DashMap::new(),
            instantiations: DashMap::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Classes and interfaces
    // -------------------------------------------------------------------------

    /// Register a new definition and return its `DefId`.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = DefId(self.next_def.fetch_add(1, Ordering::SeqCst));
        trace!(def_id = id.0, kind = ?info.kind, "DefinitionStore::register");
        for &param in &info.type_params {
            if let Some(mut decl) = self.type_params.get_mut(&param) {
                decl.owner = Some(id);
            }
        }
        self.definitions.insert(id, info);
        id
    }

    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|r| r.clone())
    }

    /// Like `get`, for handles that must exist.
    pub fn definition(&self, id: DefId) -> DefinitionInfo {
        match self.get(id) {
            Some(info) => info,
            None => internal_error!("unknown definition {id:?}"),
        }
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn get_kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|r| r.kind)
    }

    pub fn get_name(&self, id: DefId) -> Option<Atom> {
        self.definitions.get(&id).map(|r| r.name)
    }

    pub fn get_type_params(&self, id: DefId) -> Vec<TypeParamId> {
        self.definitions
            .get(&id)
            .map(|r| r.type_params.clone())
            .unwrap_or_default()
    }

    pub fn get_flags(&self, id: DefId) -> DefFlags {
        self.definitions
            .get(&id)
            .map(|r| r.flags)
            .unwrap_or_default()
    }

    pub fn boxed_kind(&self, id: DefId) -> Option<PrimitiveKind> {
        self.definitions.get(&id).and_then(|r| r.boxed)
    }

    /// Late-bound super class. Writing it twice is a checker bug.
    pub fn set_super_class(&self, id: DefId, super_class: TypeId) {
        let Some(mut entry) = self.definitions.get_mut(&id) else {
            internal_error!("set_super_class on unknown definition {id:?}");
        };
        if entry.super_class.is_some() {
            internal_error!("super class of {id:?} bound twice");
        }
        trace!(def_id = id.0, super_class = super_class.0, "bound super class");
        entry.super_class = Some(super_class);
    }

    /// Late-bound implemented/extended interfaces.
    pub fn set_interfaces(&self, id: DefId, interfaces: Vec<TypeId>) {
        let Some(mut entry) = self.definitions.get_mut(&id) else {
            internal_error!("set_interfaces on unknown definition {id:?}");
        };
        if !entry.interfaces.is_empty() {
            internal_error!("interfaces of {id:?} bound twice");
        }
        entry.interfaces = interfaces;
    }

    /// Add a method overload while the declaration is being populated.
    pub fn add_method(&self, id: DefId, signature: Signature) -> SignatureId {
        let name = signature.name;
        let sig_id = self.register_signature(signature.with_owner(id));
        match self.definitions.get_mut(&id) {
            Some(mut entry) => entry.methods.push((name, sig_id)),
            None => internal_error!("add_method on unknown definition {id:?}"),
        }
        sig_id
    }

    // -------------------------------------------------------------------------
    // Type parameters
    // -------------------------------------------------------------------------

    pub fn register_type_param(&self, name: Atom) -> TypeParamId {
        let id = TypeParamId(self.next_type_param.fetch_add(1, Ordering::SeqCst));
        self.type_params.insert(
            id,
            TypeParamDecl {
                name,
                constraint: None,
                default: None,
                owner: None,
            },
        );
        id
    }

    pub fn type_param(&self, id: TypeParamId) -> TypeParamDecl {
        match self.type_params.get(&id) {
            Some(decl) => decl.clone(),
            None => internal_error!("unknown type parameter {id:?}"),
        }
    }

    /// Late-bound constraint; may refer to the parameter itself.
    pub fn set_type_param_constraint(&self, id: TypeParamId, constraint: TypeId) {
        match self.type_params.get_mut(&id) {
            Some(mut decl) => {
                if decl.constraint.is_some() {
                    internal_error!("constraint of {id:?} bound twice");
                }
                decl.constraint = Some(constraint);
            }
            None => internal_error!("unknown type parameter {id:?}"),
        }
    }

    pub fn set_type_param_default(&self, id: TypeParamId, default: TypeId) {
        match self.type_params.get_mut(&id) {
            Some(mut decl) => decl.default = Some(default),
            None => internal_error!("unknown type parameter {id:?}"),
        }
    }

    // -------------------------------------------------------------------------
    // Signatures and overload sets
    // -------------------------------------------------------------------------

    pub fn register_signature(&self, signature: Signature) -> SignatureId {
        let id = SignatureId(self.next_signature.fetch_add(1, Ordering::SeqCst));
        self.signatures.insert(id, Arc::new(signature));
        id
    }

    pub fn signature(&self, id: SignatureId) -> Arc<Signature> {
        match self.signatures.get(&id) {
            Some(sig) => Arc::clone(&sig),
            None => internal_error!("unknown signature {id:?}"),
        }
    }

    /// Add an overload of a free function.
    pub fn add_function(&self, signature: Signature) -> SignatureId {
        let name = signature.name;
        let id = self.register_signature(signature);
        self.functions.entry(name).or_default().push(id);
        id
    }

    pub fn functions_named(&self, name: Atom) -> Vec<SignatureId> {
        self.functions
            .get(&name)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Add an extension function. Parameter zero is the receiver.
    pub fn add_extension(&self, signature: Signature) -> SignatureId {
        let name = signature.name;
        let flags = signature.flags | crate::signature::SignatureFlags::EXTENSION;
        let id = self.register_signature(signature.with_flags(flags));
        self.extensions.entry(name).or_default().push(id);
        id
    }

    pub fn extensions_named(&self, name: Atom) -> Vec<SignatureId> {
        self.extensions
            .get(&name)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Instantiation cache
    // -------------------------------------------------------------------------

    pub fn cached_instantiation(&self, def: DefId, args: &TypeList) -> Option<TypeId> {
        self.instantiations
            .get(&(def, args.clone()))
            .map(|r| *r)
    }

    pub fn cache_instantiation(&self, def: DefId, args: TypeList, result: TypeId) {
        self.instantiations.insert((def, args), result);
    }

    pub fn instantiation_count(&self) -> usize {
        self.instantiations.len()
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
