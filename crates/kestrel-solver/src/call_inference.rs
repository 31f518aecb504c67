//! Type-argument inference for generic calls.
//!
//! `enhance_substitution` unifies one declared parameter type against one
//! argument type and adds what it learns to a substitution. It walks object,
//! function, union, array and resizable-array shapes structurally. Parameters
//! nothing was learned for are filled by `complete_substitution` from their
//! default, then their constraint, then `Object | null | undefined`.

use tracing::trace;

use crate::env::TypeEnvironment;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{TypeData, TypeId, TypeList, TypeParamId};

pub struct Inference<'a> {
    env: &'a TypeEnvironment,
    params: &'a [TypeParamId],
    depth: DepthCounter,
}

impl<'a> Inference<'a> {
    pub fn new(env: &'a TypeEnvironment, params: &'a [TypeParamId]) -> Self {
        Inference {
            env,
            params,
            depth: DepthCounter::with_profile(RecursionProfile::Inference),
        }
    }

    /// Learn bindings for the inferred parameters from `param_ty` receiving
    /// `arg_ty`.
    pub fn enhance_substitution(
        &mut self,
        param_ty: TypeId,
        arg_ty: TypeId,
        subst: &mut TypeSubstitution,
    ) {
        if arg_ty.is_error() || !self.env.interner.contains_type_parameters(param_ty) {
            return;
        }
        if !self.depth.enter() {
            return;
        }
        self.enhance_data(param_ty, arg_ty, subst);
        self.depth.leave();
    }

    fn enhance_data(&mut self, param_ty: TypeId, arg_ty: TypeId, subst: &mut TypeSubstitution) {
        let env = self.env;
        let (param_data, arg_data) = (env.interner.get(param_ty), env.interner.get(arg_ty));
        match (&*param_data, &*arg_data) {
            (TypeData::TypeParameter(p), _) if self.params.contains(p) => {
                self.bind(*p, arg_ty, subst);
            }
            (TypeData::NonNullish(inner), _) => {
                let stripped = env.remove_nullish(arg_ty, true, true);
                self.enhance_substitution(*inner, stripped, subst);
            }
            (TypeData::Object(param_obj), TypeData::Object(_)) => {
                let Some(ancestor) = env.find_ancestor(arg_ty, param_obj.def) else {
                    return;
                };
                let Some(found) = env.interner.object_ref(ancestor) else {
                    return;
                };
                for (&p, &a) in param_obj.args.iter().zip(&found.args) {
                    self.enhance_substitution(p, a, subst);
                }
            }
            (TypeData::Object(_), TypeData::Primitive(kind)) => {
                let boxed = env.boxed_type(*kind);
                self.enhance_substitution(param_ty, boxed, subst);
            }
            (TypeData::Array(p), TypeData::Array(a))
            | (TypeData::ResizableArray(p), TypeData::ResizableArray(a))
            | (TypeData::Readonly(p), TypeData::Readonly(a))
            | (TypeData::Partial(p), TypeData::Partial(a)) => {
                self.enhance_substitution(*p, *a, subst);
            }
            (TypeData::Readonly(p), _) | (TypeData::Partial(p), _) => {
                self.enhance_substitution(*p, arg_ty, subst);
            }
            (TypeData::Array(p), TypeData::Tuple(elems)) => {
                let joined = env.union(elems.iter().copied());
                self.enhance_substitution(*p, joined, subst);
            }
            (TypeData::Function(p), TypeData::Function(a)) => {
                for (pp, ap) in p.params.iter().zip(&a.params) {
                    self.enhance_substitution(pp.type_id, ap.type_id, subst);
                }
                if let (Some(pr), Some(ar)) = (p.rest, a.rest) {
                    self.enhance_substitution(pr, ar, subst);
                }
                self.enhance_substitution(p.return_type, a.return_type, subst);
            }
            (TypeData::Union(members), _) => self.enhance_union(members, arg_ty, subst),
            _ => {}
        }
    }

    /// `T | null` receiving `string | null` binds `T = string`: argument
    /// members matched by a concrete parameter member are removed, the rest
    /// goes to the generic members.
    fn enhance_union(&mut self, members: &TypeList, arg_ty: TypeId, subst: &mut TypeSubstitution) {
        let env = self.env;
        let (generic, concrete): (TypeList, TypeList) = members
            .iter()
            .copied()
            .partition(|&m| env.interner.contains_type_parameters(m));
        if generic.is_empty() {
            return;
        }
        let mut relation = env.relation();
        let remaining: TypeList = env
            .interner
            .union_members(arg_ty)
            .iter()
            .copied()
            .filter(|&a| !concrete.iter().any(|&c| relation.is_subtype_of(a, c)))
            .collect();
        if remaining.is_empty() {
            return;
        }
        let rest = env.interner.union(remaining);
        for member in generic {
            self.enhance_substitution(member, rest, subst);
        }
    }

    /// Record `param := arg`, widening an existing binding to the union of
    /// both when they are unrelated.
    fn bind(&mut self, param: TypeParamId, arg: TypeId, subst: &mut TypeSubstitution) {
        let env = self.env;
        let arg = env.box_if_primitive(arg);
        let merged = match subst.get(param) {
            None => arg,
            Some(existing) => {
                let mut relation = env.relation();
                if relation.is_supertype_of(existing, arg) {
                    existing
                } else if relation.is_supertype_of(arg, existing) {
                    arg
                } else {
                    env.union2(existing, arg)
                }
            }
        };
        trace!(param = param.0, bound = merged.0, "inferred type argument");
        subst.insert(env, param, merged);
    }
}

/// Fill every parameter of `params` missing from `subst`: default, then
/// constraint, then `Object | null | undefined`. Defaults and constraints
/// may refer to parameters resolved earlier.
pub fn complete_substitution(
    env: &TypeEnvironment,
    params: &[TypeParamId],
    subst: &mut TypeSubstitution,
) {
    for &param in params {
        if subst.contains(param) {
            continue;
        }
        let decl = env.defs.type_param(param);
        let fallback = match (decl.default, decl.constraint) {
            (Some(default), _) => instantiate_type(env, default, subst),
            (None, Some(constraint)) => instantiate_type(env, constraint, subst),
            (None, None) => env.builtins.nullable_object,
        };
        subst.insert(env, param, fallback);
    }
}
