//! Generic type instantiation and substitution.
//!
//! - `TypeSubstitution`: type parameter -> type argument. The only insertion
//!   point boxes primitive arguments, so a substitution never holds a value
//!   type.
//! - `instantiate_type`: rewrite every type-parameter occurrence in a type.
//!   An empty substitution returns the input handle untouched.
//! - `instantiate_generic`: apply type arguments to a class or interface,
//!   with arity checking, defaults, caching and deferred constraint checks.

use kestrel_common::Span;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::constraints::{ConstraintObligations, PendingConstraint};
use crate::def::DefId;
use crate::diagnostics::{PendingDiagnostic, codes};
use crate::env::TypeEnvironment;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::signature::Signature;
use crate::types::{FunctionShape, ObjectRef, ParamInfo, TypeData, TypeId, TypeList, TypeParamId};

// =============================================================================
// TypeSubstitution
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeParamId, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parallel parameter and argument lists. Extra entries on
    /// either side are ignored.
    pub fn from_args(env: &TypeEnvironment, params: &[TypeParamId], args: &[TypeId]) -> Self {
        let mut subst = Self::new();
        for (&param, &arg) in params.iter().zip(args) {
            subst.insert(env, param, arg);
        }
        subst
    }

    /// Map `param` to `arg`, boxing primitive and value-literal arguments.
    pub fn insert(&mut self, env: &TypeEnvironment, param: TypeParamId, arg: TypeId) {
        let boxed = env.box_if_primitive(arg);
        self.map.insert(param, boxed);
    }

    pub fn get(&self, param: TypeParamId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn contains(&self, param: TypeParamId) -> bool {
        self.map.contains_key(&param)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeParamId, TypeId)> + '_ {
        self.map.iter().map(|(&p, &t)| (p, t))
    }
}

// =============================================================================
// Substitution
// =============================================================================

/// Rewrites type-parameter occurrences, bounded by the instantiation depth.
pub struct TypeInstantiator<'a> {
    env: &'a TypeEnvironment,
    subst: &'a TypeSubstitution,
    depth: DepthCounter,
}

impl<'a> TypeInstantiator<'a> {
    pub fn new(env: &'a TypeEnvironment, subst: &'a TypeSubstitution) -> Self {
        TypeInstantiator {
            env,
            subst,
            depth: DepthCounter::with_profile(RecursionProfile::Instantiation),
        }
    }

    /// Whether some branch hit the depth limit and produced the error type.
    pub fn depth_exceeded(&self) -> bool {
        self.depth.is_exceeded()
    }

    pub fn instantiate(&mut self, ty: TypeId) -> TypeId {
        if self.subst.is_empty() || ty.is_reserved() {
            return ty;
        }
        if !self.depth.enter() {
            return TypeId::ERROR;
        }
        let result = self.instantiate_data(ty);
        self.depth.leave();
        result
    }

    fn instantiate_data(&mut self, ty: TypeId) -> TypeId {
        let interner = &self.env.interner;
        let data = interner.get(ty);
        match &*data {
            TypeData::TypeParameter(param) => self.subst.get(*param).unwrap_or(ty),
            TypeData::Object(obj) => {
                let args: TypeList = obj.args.iter().map(|&a| self.instantiate(a)).collect();
                if args == obj.args {
                    return ty;
                }
                interner.intern(TypeData::Object(ObjectRef { def: obj.def, args }))
            }
            TypeData::Array(elem) => {
                let elem = self.instantiate(*elem);
                interner.array(elem)
            }
            TypeData::ResizableArray(elem) => {
                let elem = self.instantiate(*elem);
                interner.resizable_array(elem)
            }
            TypeData::Tuple(elems) => {
                let elems: TypeList = elems.iter().map(|&e| self.instantiate(e)).collect();
                interner.tuple(elems)
            }
            TypeData::Union(members) => {
                let members: TypeList = members.iter().map(|&m| self.instantiate(m)).collect();
                interner.union(members)
            }
            TypeData::Function(shape) => {
                let shape = self.instantiate_function(shape);
                interner.function(shape)
            }
            TypeData::Readonly(inner) => {
                let inner = self.instantiate(*inner);
                interner.readonly(inner)
            }
            TypeData::Partial(inner) => {
                let inner = self.instantiate(*inner);
                interner.partial(inner)
            }
            TypeData::NonNullish(inner) => {
                let inner = self.instantiate(*inner);
                self.env.non_nullish(inner)
            }
            TypeData::Literal(_) => ty,
            TypeData::Error
            | TypeData::Any
            | TypeData::Null
            | TypeData::Undefined
            | TypeData::Void
            | TypeData::Never
            | TypeData::Primitive(_)
            | TypeData::String => ty,
        }
    }

    pub fn instantiate_function(&mut self, shape: &FunctionShape) -> FunctionShape {
        FunctionShape {
            params: shape
                .params
                .iter()
                .map(|p| ParamInfo {
                    type_id: self.instantiate(p.type_id),
                    ..*p
                })
                .collect(),
            rest: shape.rest.map(|r| self.instantiate(r)),
            return_type: self.instantiate(shape.return_type),
        }
    }
}

/// Apply `subst` to `ty`.
pub fn instantiate_type(env: &TypeEnvironment, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
    if subst.is_empty() {
        return ty;
    }
    TypeInstantiator::new(env, subst).instantiate(ty)
}

/// Copy of `shape` with `subst` applied.
pub fn substitute_function(
    env: &TypeEnvironment,
    shape: &FunctionShape,
    subst: &TypeSubstitution,
) -> FunctionShape {
    TypeInstantiator::new(env, subst).instantiate_function(shape)
}

/// Copy of `sig` with `subst` applied. Type parameters bound by `subst`
/// are removed from the copy's parameter list.
pub fn substitute_signature(
    env: &TypeEnvironment,
    sig: &Signature,
    subst: &TypeSubstitution,
) -> Signature {
    if subst.is_empty() {
        return sig.clone();
    }
    let mut inst = TypeInstantiator::new(env, subst);
    let mut copy = sig.clone();
    copy.type_params.retain(|p| !subst.contains(*p));
    for param in &mut copy.params {
        param.type_id = inst.instantiate(param.type_id);
    }
    if let Some(rest) = &mut copy.rest {
        rest.type_id = inst.instantiate(rest.type_id);
    }
    copy.return_type = inst.instantiate(copy.return_type);
    copy
}

// =============================================================================
// Generic instantiation
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstantiationError {
    /// Type arguments given to a non-generic declaration.
    NotGeneric { def: DefId },
    /// Too many arguments, or too few with no defaults to fill the gap.
    WrongArity {
        def: DefId,
        expected: usize,
        got: usize,
    },
    TooDeep,
}

impl InstantiationError {
    pub fn to_diagnostic(&self, env: &TypeEnvironment) -> PendingDiagnostic {
        match *self {
            InstantiationError::NotGeneric { def } => PendingDiagnostic::error(
                codes::NOT_GENERIC,
                vec![env.declared_type(def).into()],
            ),
            InstantiationError::WrongArity { def, expected, got } => PendingDiagnostic::error(
                codes::TYPE_ARG_COUNT_MISMATCH,
                vec![
                    env.defs.get_name(def).unwrap_or(kestrel_common::Atom::NONE).into(),
                    expected.into(),
                    got.into(),
                ],
            ),
            InstantiationError::TooDeep => {
                PendingDiagnostic::error(codes::INSTANTIATION_TOO_DEEP, vec![])
            }
        }
    }
}

/// Instantiate class or interface `def` with `args`.
///
/// Constraint checks are not performed here: a `PendingConstraint` is pushed
/// on `obligations` and verified when the outermost constraint scope exits.
pub fn instantiate_generic(
    env: &TypeEnvironment,
    def: DefId,
    args: &[TypeId],
    span: Span,
    obligations: &mut ConstraintObligations,
) -> Result<TypeId, InstantiationError> {
    let params = env.defs.get_type_params(def);
    if params.is_empty() {
        if args.is_empty() {
            return Ok(env.declared_type(def));
        }
        return Err(InstantiationError::NotGeneric { def });
    }
    if args.len() > params.len() {
        return Err(InstantiationError::WrongArity {
            def,
            expected: params.len(),
            got: args.len(),
        });
    }

    let mut subst = TypeSubstitution::new();
    let mut final_args = TypeList::new();
    for (i, &param) in params.iter().enumerate() {
        let arg = match args.get(i) {
            Some(&arg) => arg,
            None => match env.defs.type_param(param).default {
                // Defaults may mention earlier parameters.
                Some(default) => instantiate_type(env, default, &subst),
                None => {
                    return Err(InstantiationError::WrongArity {
                        def,
                        expected: params.len(),
                        got: args.len(),
                    });
                }
            },
        };
        subst.insert(env, param, arg);
        final_args.push(subst.get(param).unwrap_or(arg));
    }

    if let Some(cached) = env.defs.cached_instantiation(def, &final_args) {
        trace!(def = def.0, type_id = cached.0, "instantiation cache hit");
        return Ok(cached);
    }

    let mut inst = TypeInstantiator::new(env, &subst);
    let result = inst.instantiate(env.declared_type(def));
    if inst.depth_exceeded() || result == TypeId::ERROR {
        return Err(InstantiationError::TooDeep);
    }
    env.defs.cache_instantiation(def, final_args, result);
    debug!(def = def.0, type_id = result.0, "instantiated generic declaration");

    obligations.push(PendingConstraint {
        params,
        substitution: subst,
        span,
    });
    Ok(result)
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
