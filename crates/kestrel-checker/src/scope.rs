//! Name-resolution service.
//!
//! The binder fills a `ScopeTable` with one entry per block-like construct
//! and one per declared name. The checker only queries it.

use kestrel_common::{Atom, internal_error};
use kestrel_solver::DefId;
use rustc_hash::FxHashMap;

use crate::ast::{ScopeId, VarId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Block,
    Lambda,
    /// Holds the fields of a class; methods nest inside it.
    Class(DefId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Local,
    Param,
    Field(DefId),
}

#[derive(Clone, Debug)]
pub struct ScopeInfo {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    vars: FxHashMap<Atom, VarId>,
}

#[derive(Clone, Debug)]
pub struct VarInfo {
    pub name: Atom,
    pub scope: ScopeId,
    pub kind: VarKind,
}

impl VarInfo {
    /// Locals and parameters can carry smart casts; fields cannot.
    pub fn is_local(&self) -> bool {
        !matches!(self.kind, VarKind::Field(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScopeTable {
    scopes: Vec<ScopeInfo>,
    vars: Vec<VarInfo>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeInfo {
            parent,
            kind,
            vars: FxHashMap::default(),
        });
        id
    }

    /// Declare `name` in `scope`. A redeclaration shadows the earlier entry.
    pub fn declare(&mut self, scope: ScopeId, name: Atom, kind: VarKind) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VarInfo { name, scope, kind });
        self.scope_mut(scope).vars.insert(name, id);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeInfo {
        match self.scopes.get(id.0 as usize) {
            Some(info) => info,
            None => internal_error!("unknown scope {}", id.0),
        }
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut ScopeInfo {
        match self.scopes.get_mut(id.0 as usize) {
            Some(info) => info,
            None => internal_error!("unknown scope {}", id.0),
        }
    }

    pub fn var(&self, id: VarId) -> &VarInfo {
        match self.vars.get(id.0 as usize) {
            Some(info) => info,
            None => internal_error!("unknown variable {}", id.0),
        }
    }

    /// `name` declared directly in `scope`.
    pub fn find_variable_in_scope(&self, scope: ScopeId, name: Atom) -> Option<VarId> {
        self.scope(scope).vars.get(&name).copied()
    }

    /// `name` as seen from `scope`: the innermost declaration along the
    /// parent chain, class scopes included.
    pub fn find_variable_in_class_or_enclosing(
        &self,
        scope: ScopeId,
        name: Atom,
    ) -> Option<VarId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(var) = self.find_variable_in_scope(id, name) {
                return Some(var);
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// The nearest enclosing class of `scope`.
    pub fn enclosing_class(&self, scope: ScopeId) -> Option<DefId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let info = self.scope(id);
            if let ScopeKind::Class(def) = info.kind {
                return Some(def);
            }
            current = info.parent;
        }
        None
    }
}
