//! Class hierarchy construction and traversal.
//!
//! Responsibilities:
//! - Build class and interface declarations (`ClassBuilder`)
//! - Walk super classes and interfaces with type arguments substituted
//! - Look up properties and method overloads on instantiated object types
//!
//! Cycles in `extends` chains are cut by the hierarchy recursion profile; a
//! cyclic walk simply stops finding ancestors.

use kestrel_common::Atom;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::TypeEnvironment;
use crate::def::{DefFlags, DefId, DefinitionInfo, PropertyInfo};
use crate::instantiate::substitute_signature;
use crate::recursion::RecursionProfile;
use crate::signature::{Signature, SignatureId};
use crate::types::{TypeId, TypeParamId};

/// Builder for class and interface declarations.
///
/// ```ignore
/// let t = env.defs.register_type_param(env.intern_string("T"));
/// let boxed = ClassBuilder::class(&env, "Box")
///     .type_params(vec![t])
///     .property("value", env.interner.type_param(t))
///     .build();
/// ```
pub struct ClassBuilder<'a> {
    env: &'a TypeEnvironment,
    info: DefinitionInfo,
    super_class: Option<TypeId>,
    interfaces: Vec<TypeId>,
    methods: Vec<Signature>,
}

impl<'a> ClassBuilder<'a> {
    pub fn class(env: &'a TypeEnvironment, name: &str) -> Self {
        Self::with_info(env, DefinitionInfo::class(env.intern_string(name)))
    }

    pub fn interface(env: &'a TypeEnvironment, name: &str) -> Self {
        Self::with_info(env, DefinitionInfo::interface(env.intern_string(name)))
    }

    fn with_info(env: &'a TypeEnvironment, info: DefinitionInfo) -> Self {
        ClassBuilder {
            env,
            info,
            super_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn type_params(mut self, params: Vec<TypeParamId>) -> Self {
        self.info.type_params = params;
        self
    }

    pub fn extends(mut self, super_class: TypeId) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn implements(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn flags(mut self, flags: DefFlags) -> Self {
        self.info.flags |= flags;
        self
    }

    pub fn property(mut self, name: &str, type_id: TypeId) -> Self {
        self.info
            .properties
            .push(PropertyInfo::new(self.env.intern_string(name), type_id));
        self
    }

    pub fn method(mut self, signature: Signature) -> Self {
        self.methods.push(signature);
        self
    }

    /// Register the declaration. Classes without an explicit super class
    /// extend `Object`; interfaces have no super class.
    pub fn build(self) -> DefId {
        let is_class = !self.info.is_interface();
        let def = self.env.defs.register(self.info);
        match self.super_class {
            Some(super_class) => self.env.defs.set_super_class(def, super_class),
            None if is_class => self
                .env
                .defs
                .set_super_class(def, self.env.builtins.object_type),
            None => {}
        }
        if !self.interfaces.is_empty() {
            self.env.defs.set_interfaces(def, self.interfaces);
        }
        for method in self.methods {
            self.env.defs.add_method(def, method);
        }
        def
    }
}

impl TypeEnvironment {
    /// Direct super class and interfaces of an object type, with the type's
    /// arguments substituted in.
    pub fn direct_supertypes(&self, ty: TypeId) -> Vec<TypeId> {
        let Some(obj) = self.interner.object_ref(ty) else {
            return Vec::new();
        };
        let Some(info) = self.defs.get(obj.def) else {
            return Vec::new();
        };
        let subst = self.substitution_for(obj.def, &obj.args);
        info.super_class
            .into_iter()
            .chain(info.interfaces.iter().copied())
            .map(|t| self.substitute(t, &subst))
            .collect()
    }

    /// `ty` itself or the nearest ancestor instance of `def`, breadth first.
    pub fn find_ancestor(&self, ty: TypeId, def: DefId) -> Option<TypeId> {
        let max = RecursionProfile::Hierarchy.max_depth() as usize;
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([ty]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) || seen.len() > max {
                continue;
            }
            if let Some(obj) = self.interner.object_ref(current)
                && obj.def == def
            {
                return Some(current);
            }
            queue.extend(self.direct_supertypes(current));
        }
        None
    }

    /// Whether `sub` is `sup` or inherits from it.
    pub fn is_derived_def(&self, sub: DefId, sup: DefId) -> bool {
        let declared = self.declared_type(sub);
        self.find_ancestor(declared, sup).is_some()
    }

    /// Declared type of property `name` on `ty` (own first, then ancestors).
    pub fn property_type(&self, ty: TypeId, name: Atom) -> Option<TypeId> {
        self.walk_hierarchy(ty, |env, current, info| {
            let prop = info.property(name)?;
            let obj = env.interner.object_ref(current)?;
            let subst = env.substitution_for(obj.def, &obj.args);
            Some(env.substitute(prop.type_id, &subst))
        })
    }

    /// Overloads of method `name` visible on `ty`, as copies with the
    /// receiver's type arguments substituted. The nearest declaring class
    /// shadows its ancestors.
    pub fn methods_of(&self, ty: TypeId, name: Atom) -> Vec<(SignatureId, Signature)> {
        self.walk_hierarchy(ty, |env, current, info| {
            let ids: Vec<SignatureId> = info.methods_named(name).collect();
            if ids.is_empty() {
                return None;
            }
            let obj = env.interner.object_ref(current)?;
            let subst = env.substitution_for(obj.def, &obj.args);
            Some(
                ids.into_iter()
                    .map(|id| {
                        let declared = env.defs.signature(id);
                        (id, substitute_signature(env, &declared, &subst))
                    })
                    .collect(),
            )
        })
        .unwrap_or_default()
    }

    fn walk_hierarchy<T>(
        &self,
        ty: TypeId,
        mut visit: impl FnMut(&TypeEnvironment, TypeId, &DefinitionInfo) -> Option<T>,
    ) -> Option<T> {
        let max = RecursionProfile::Hierarchy.max_depth() as usize;
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([ty]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) || seen.len() > max {
                continue;
            }
            let Some(obj) = self.interner.object_ref(current) else {
                continue;
            };
            if let Some(info) = self.defs.get(obj.def)
                && let Some(found) = visit(self, current, &info)
            {
                return Some(found);
            }
            queue.extend(self.direct_supertypes(current));
        }
        None
    }
}

#[cfg(test)]
#[path = "../tests/class_hierarchy_tests.rs"]
mod tests;
