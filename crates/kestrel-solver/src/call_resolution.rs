//! Overload and generic call resolution.
//!
//! `SignatureResolver::resolve_call` runs the pipeline:
//! 1. Arity filter
//! 2. Mark untyped lambda arguments as needing inference
//! 3. Per-position suitability: position -> candidates that accept the argument there
//! 4. Instantiate generic candidates (explicit type arguments or unification)
//!    and validate required and rest parameters against the arguments
//! 5. Most-specific selection
//! 6. Back-fill the parameter types of lambda arguments from the winner
//!
//! `resolve_method_call` adds receiver rewriting on top: extension functions
//! are tried with the receiver as argument zero, then member methods.
//! Candidate signatures are always copies; declarations are never mutated.

use indexmap::IndexMap;
use kestrel_common::{Atom, Span};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::call_inference::{Inference, complete_substitution};
use crate::call_specificity::select_most_specific;
use crate::constraints::{ConstraintObligations, PendingConstraint};
use crate::def::{DefId, Visibility};
use crate::diagnostics::{DiagnosticArg, PendingDiagnostic, codes};
use crate::env::TypeEnvironment;
use crate::instantiate::{TypeSubstitution, substitute_signature};
use crate::numeric::Conversion;
use crate::relation::{RelationFlags, TypeRelation};
use crate::signature::{Signature, SignatureId};
use crate::types::{FunctionShape, ParamInfo, TypeData, TypeId};

// =============================================================================
// Inputs
// =============================================================================

/// One argument of a call as seen by the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallArgument {
    /// An already-checked expression.
    Typed(TypeId),
    /// An arrow function whose parameter types come from the chosen
    /// signature. `declared` holds the explicitly annotated parameter types.
    UntypedLambda {
        param_count: usize,
        declared: Vec<Option<TypeId>>,
    },
}

impl CallArgument {
    pub fn needs_inference(&self) -> bool {
        matches!(self, CallArgument::UntypedLambda { .. })
    }

    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            CallArgument::Typed(ty) => Some(*ty),
            CallArgument::UntypedLambda { .. } => None,
        }
    }
}

/// The call being resolved.
#[derive(Clone, Copy, Debug)]
pub struct CallSite<'a> {
    pub args: &'a [CallArgument],
    pub type_args: Option<&'a [TypeId]>,
    pub span: Span,
    /// Class whose body contains the call, for private/protected access.
    pub caller_class: Option<DefId>,
}

impl<'a> CallSite<'a> {
    pub fn new(args: &'a [CallArgument], span: Span) -> Self {
        CallSite {
            args,
            type_args: None,
            span,
            caller_class: None,
        }
    }

    pub fn with_type_args(mut self, type_args: &'a [TypeId]) -> Self {
        self.type_args = Some(type_args);
        self
    }

    pub fn with_caller_class(mut self, class: Option<DefId>) -> Self {
        self.caller_class = class;
        self
    }
}

/// A candidate signature: a copy, plus the declaration it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub id: Option<SignatureId>,
    pub signature: Signature,
}

impl Candidate {
    pub fn new(id: Option<SignatureId>, signature: Signature) -> Self {
        Candidate { id, signature }
    }

    pub fn from_ids(env: &TypeEnvironment, ids: &[SignatureId]) -> Vec<Candidate> {
        ids.iter()
            .map(|&id| Candidate::new(Some(id), (*env.defs.signature(id)).clone()))
            .collect()
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// The chosen signature and everything the backend needs at the call site.
#[derive(Clone, Debug)]
pub struct ResolvedCall {
    /// Instantiated copy of the winning signature.
    pub signature: Signature,
    pub declared: Option<SignatureId>,
    pub substitution: TypeSubstitution,
    /// Conversions per argument, aligned with the call's arguments.
    pub arg_conversions: Vec<SmallVec<[Conversion; 2]>>,
    /// For each untyped lambda argument: its index and the function shape
    /// its parameters and return type take.
    pub lambda_shapes: Vec<(usize, FunctionShape)>,
    /// Resolved to an extension function; the receiver went in as argument
    /// zero and its conversions are in `receiver_conversions`.
    pub via_extension: bool,
    pub receiver_conversions: SmallVec<[Conversion; 2]>,
}

impl ResolvedCall {
    pub fn return_type(&self) -> TypeId {
        self.signature.return_type
    }
}

/// Accepted argument counts over a candidate set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArityRange {
    pub min: usize,
    /// `None` when some candidate has a rest parameter.
    pub max: Option<usize>,
}

impl ArityRange {
    fn of(candidates: &[Candidate]) -> Self {
        let min = candidates
            .iter()
            .map(|c| c.signature.min_arg_count)
            .min()
            .unwrap_or(0);
        let max = candidates.iter().try_fold(0usize, |acc, c| {
            if c.signature.rest.is_some() {
                None
            } else {
                Some(acc.max(c.signature.params.len()))
            }
        });
        ArityRange { min, max }
    }

    fn describe(self) -> String {
        match self.max {
            Some(max) if max == self.min => max.to_string(),
            Some(max) => format!("{}-{}", self.min, max),
            None => format!("at least {}", self.min),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CallResolutionError {
    /// No candidate accepts this many arguments.
    WrongArgumentCount {
        expected: ArityRange,
        got: usize,
    },
    NoMatchingSignature {
        name: Atom,
        args: Vec<Option<TypeId>>,
        candidates: Vec<Signature>,
    },
    Ambiguous {
        name: Atom,
        candidates: Vec<Signature>,
    },
    /// Explicit type arguments do not fit any generic candidate.
    TypeArgumentCount {
        name: Atom,
        expected: usize,
        got: usize,
    },
    /// The receiver has no member or extension with this name.
    UnknownMember { receiver: TypeId, name: Atom },
    /// Only private or protected members match and the caller cannot see
    /// them.
    Inaccessible {
        receiver: TypeId,
        name: Atom,
        visibility: Visibility,
    },
    NotCallable { callee: TypeId },
}

impl CallResolutionError {
    pub fn to_diagnostic(&self) -> PendingDiagnostic {
        match self {
            CallResolutionError::WrongArgumentCount { expected, got } => PendingDiagnostic::error(
                codes::ARG_COUNT_MISMATCH,
                vec![expected.describe().into(), (*got).into()],
            ),
            CallResolutionError::NoMatchingSignature {
                name,
                args,
                candidates,
            } => PendingDiagnostic::error(
                codes::NO_MATCHING_SIGNATURE,
                vec![
                    (*name).into(),
                    DiagnosticArg::Arguments(args.clone()),
                    DiagnosticArg::Signatures(candidates.clone()),
                ],
            ),
            CallResolutionError::Ambiguous { name, candidates } => PendingDiagnostic::error(
                codes::AMBIGUOUS_CALL,
                vec![(*name).into(), DiagnosticArg::Signatures(candidates.clone())],
            ),
            CallResolutionError::TypeArgumentCount {
                name,
                expected,
                got,
            } => PendingDiagnostic::error(
                codes::TYPE_ARG_COUNT_MISMATCH,
                vec![(*name).into(), (*expected).into(), (*got).into()],
            ),
            CallResolutionError::UnknownMember { receiver, name } => PendingDiagnostic::error(
                codes::PROPERTY_NOT_FOUND,
                vec![(*name).into(), (*receiver).into()],
            ),
            CallResolutionError::Inaccessible {
                receiver,
                name,
                visibility,
            } => {
                let visibility = match visibility {
                    Visibility::Private => "private",
                    Visibility::Protected => "protected",
                    Visibility::Public => "public",
                };
                PendingDiagnostic::error(
                    codes::MEMBER_NOT_ACCESSIBLE,
                    vec![(*name).into(), visibility.into(), (*receiver).into()],
                )
            }
            CallResolutionError::NotCallable { callee } => {
                PendingDiagnostic::error(codes::NOT_CALLABLE, vec![(*callee).into()])
            }
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// A candidate that survived validation.
struct Applicable {
    index: usize,
    signature: Signature,
    substitution: TypeSubstitution,
    arg_conversions: Vec<SmallVec<[Conversion; 2]>>,
    lambda_shapes: Vec<(usize, FunctionShape)>,
}

enum Rejection {
    TypeArgumentCount { expected: usize },
    Mismatch,
}

pub struct SignatureResolver<'e, 'o> {
    env: &'e TypeEnvironment,
    obligations: &'o mut ConstraintObligations,
}

impl<'e, 'o> SignatureResolver<'e, 'o> {
    pub fn new(env: &'e TypeEnvironment, obligations: &'o mut ConstraintObligations) -> Self {
        SignatureResolver { env, obligations }
    }

    /// Resolve a call to a free function by name.
    pub fn resolve_function_call(
        &mut self,
        name: Atom,
        site: &CallSite<'_>,
    ) -> Result<ResolvedCall, CallResolutionError> {
        let candidates = Candidate::from_ids(self.env, &self.env.defs.functions_named(name));
        self.resolve_call(name, &candidates, site)
    }

    /// Resolve a call through a value of function type.
    pub fn resolve_function_value_call(
        &mut self,
        callee: TypeId,
        site: &CallSite<'_>,
    ) -> Result<ResolvedCall, CallResolutionError> {
        let Some(shape) = self.env.interner.function_shape(callee) else {
            return Err(CallResolutionError::NotCallable { callee });
        };
        let candidate = Candidate::new(None, Signature::from_function_shape(Atom::NONE, &shape));
        self.resolve_call(Atom::NONE, &[candidate], site)
    }

    /// `receiver.name(args)`.
    ///
    /// Inside the declaring class a private member, and inside a subclass a
    /// protected member, wins over any extension. Otherwise extensions are
    /// tried first with the receiver as argument zero, then the members the
    /// caller may access.
    pub fn resolve_method_call(
        &mut self,
        receiver: TypeId,
        name: Atom,
        site: &CallSite<'_>,
    ) -> Result<ResolvedCall, CallResolutionError> {
        let all_members: Vec<Candidate> = self
            .env
            .methods_of(receiver, name)
            .into_iter()
            .map(|(id, sig)| Candidate::new(Some(id), sig))
            .collect();
        let extensions = Candidate::from_ids(self.env, &self.env.defs.extensions_named(name));

        if all_members.is_empty() && extensions.is_empty() {
            return Err(CallResolutionError::UnknownMember { receiver, name });
        }

        let (members, hidden): (Vec<Candidate>, Vec<Candidate>) = all_members
            .into_iter()
            .partition(|c| self.is_accessible(&c.signature, site.caller_class));

        let restricted: Vec<Candidate> = members
            .iter()
            .filter(|c| c.signature.visibility() != Visibility::Public)
            .cloned()
            .collect();
        if !restricted.is_empty()
            && let Ok(resolved) = self.resolve_call(name, &restricted, site)
        {
            trace!(name = name.0, "restricted member preferred over extensions");
            return Ok(resolved);
        }

        let mut extension_error = None;
        if !extensions.is_empty() {
            let mut args = Vec::with_capacity(site.args.len() + 1);
            args.push(CallArgument::Typed(receiver));
            args.extend(site.args.iter().cloned());
            let extended_site = CallSite { args: &args, ..*site };
            match self.resolve_call(name, &extensions, &extended_site) {
                Ok(mut resolved) => {
                    resolved.via_extension = true;
                    if !resolved.arg_conversions.is_empty() {
                        resolved.receiver_conversions = resolved.arg_conversions.remove(0);
                    }
                    for (index, _) in &mut resolved.lambda_shapes {
                        *index -= 1;
                    }
                    debug!(name = name.0, "resolved as extension call");
                    return Ok(resolved);
                }
                Err(err) => extension_error = Some(err),
            }
        }

        if members.is_empty() {
            if let Some(err) = extension_error {
                return Err(err);
            }
            let visibility = hidden
                .first()
                .map_or(Visibility::Public, |c| c.signature.visibility());
            return Err(CallResolutionError::Inaccessible {
                receiver,
                name,
                visibility,
            });
        }
        self.resolve_call(name, &members, site)
    }

    /// Private members are visible only inside their owner, protected ones
    /// inside the owner and its subclasses.
    fn is_accessible(&self, signature: &Signature, caller: Option<DefId>) -> bool {
        let Some(owner) = signature.owner else {
            return true;
        };
        match signature.visibility() {
            Visibility::Public => true,
            Visibility::Private => caller == Some(owner),
            Visibility::Protected => {
                caller.is_some_and(|class| self.env.is_derived_def(class, owner))
            }
        }
    }

    /// Pick one of `candidates` for the call at `site`.
    pub fn resolve_call(
        &mut self,
        name: Atom,
        candidates: &[Candidate],
        site: &CallSite<'_>,
    ) -> Result<ResolvedCall, CallResolutionError> {
        let arg_count = site.args.len();

        // 1. Arity.
        let by_arity: Vec<usize> = (0..candidates.len())
            .filter(|&i| candidates[i].signature.accepts_arg_count(arg_count))
            .collect();
        if by_arity.is_empty() {
            return Err(CallResolutionError::WrongArgumentCount {
                expected: ArityRange::of(candidates),
                got: arg_count,
            });
        }

        // 2-3. Per-position suitability.
        let positions = self.suitability_by_position(candidates, &by_arity, site.args);
        let suitable: Vec<usize> = by_arity
            .iter()
            .copied()
            .filter(|i| positions.values().all(|set| set.contains(i)))
            .collect();
        trace!(
            name = name.0,
            arity = by_arity.len(),
            suitable = suitable.len(),
            "candidate filtering"
        );

        // 4. Instantiate and validate.
        let mut applicable = Vec::new();
        let mut type_arg_mismatch = None;
        for &index in &suitable {
            match self.instantiate_and_validate(index, &candidates[index].signature, site) {
                Ok(candidate) => applicable.push(candidate),
                Err(Rejection::TypeArgumentCount { expected }) => {
                    type_arg_mismatch.get_or_insert(expected);
                }
                Err(Rejection::Mismatch) => {}
            }
        }

        if applicable.is_empty() {
            if let (Some(expected), Some(type_args)) = (type_arg_mismatch, site.type_args) {
                return Err(CallResolutionError::TypeArgumentCount {
                    name,
                    expected,
                    got: type_args.len(),
                });
            }
            return Err(CallResolutionError::NoMatchingSignature {
                name,
                args: site.args.iter().map(CallArgument::type_id).collect(),
                candidates: candidates.iter().map(|c| c.signature.clone()).collect(),
            });
        }

        // 5. Most specific.
        let winner = {
            let sigs: Vec<&Signature> = applicable.iter().map(|a| &a.signature).collect();
            match select_most_specific(self.env, &sigs, arg_count) {
                Ok(i) => i,
                Err(tied) => {
                    return Err(CallResolutionError::Ambiguous {
                        name,
                        candidates: tied
                            .into_iter()
                            .map(|i| candidates[applicable[i].index].signature.clone())
                            .collect(),
                    });
                }
            }
        };
        let chosen = applicable.swap_remove(winner);
        let declared = &candidates[chosen.index];

        if declared.signature.is_generic() {
            self.obligations.push(PendingConstraint {
                params: declared.signature.type_params.clone(),
                substitution: chosen.substitution.clone(),
                span: site.span,
            });
        }
        debug!(
            name = name.0,
            params = chosen.signature.params.len(),
            "resolved call"
        );

        // 6. Lambda shapes were computed against the winner during validation.
        Ok(ResolvedCall {
            signature: chosen.signature,
            declared: declared.id,
            substitution: chosen.substitution,
            arg_conversions: chosen.arg_conversions,
            lambda_shapes: chosen.lambda_shapes,
            via_extension: false,
            receiver_conversions: SmallVec::new(),
        })
    }

    /// Position -> candidates whose declared parameter there accepts the
    /// argument. Lambda arguments and parameters still mentioning type
    /// parameters are deferred (every candidate is suitable).
    fn suitability_by_position(
        &self,
        candidates: &[Candidate],
        by_arity: &[usize],
        args: &[CallArgument],
    ) -> IndexMap<usize, Vec<usize>> {
        let mut positions: IndexMap<usize, Vec<usize>> = IndexMap::new();
        let mut relation = TypeRelation::new(self.env).with_flags(RelationFlags::NO_THROW);
        for (pos, arg) in args.iter().enumerate() {
            let entry = positions.entry(pos).or_default();
            for &i in by_arity {
                let sig = &candidates[i].signature;
                let Some(param_ty) = sig.param_type_at(pos) else {
                    continue;
                };
                let deferred = match arg {
                    CallArgument::UntypedLambda { .. } => true,
                    CallArgument::Typed(_) => {
                        self.env.interner.contains_type_parameters(param_ty)
                    }
                };
                let fits = deferred
                    || arg
                        .type_id()
                        .is_some_and(|ty| relation.is_assignable(ty, param_ty));
                if fits {
                    entry.push(i);
                }
            }
        }
        positions
    }

    fn instantiate_and_validate(
        &self,
        index: usize,
        declared: &Signature,
        site: &CallSite<'_>,
    ) -> Result<Applicable, Rejection> {
        let substitution = self.substitution_for(declared, site)?;
        let signature = substitute_signature(self.env, declared, &substitution);

        let mut conversions = Vec::with_capacity(site.args.len());
        let mut lambda_shapes = Vec::new();
        let mut relation = TypeRelation::new(self.env).with_flags(RelationFlags::NO_THROW);
        for (pos, arg) in site.args.iter().enumerate() {
            // Required and optional parameters first, then the rest element.
            let Some(param_ty) = signature.param_type_at(pos) else {
                return Err(Rejection::Mismatch);
            };
            match arg {
                CallArgument::Typed(ty) => {
                    if !relation.is_assignable(*ty, param_ty) {
                        return Err(Rejection::Mismatch);
                    }
                    conversions.push(relation.take_conversions());
                }
                CallArgument::UntypedLambda {
                    param_count,
                    declared,
                } => {
                    let shape = self.lambda_shape(param_ty, *param_count, declared)?;
                    lambda_shapes.push((pos, shape));
                    conversions.push(SmallVec::new());
                }
            }
        }
        Ok(Applicable {
            index,
            signature,
            substitution,
            arg_conversions: conversions,
            lambda_shapes,
        })
    }

    /// Explicit type arguments, or inference from the typed arguments with
    /// fallbacks for parameters nothing was learned about.
    fn substitution_for(
        &self,
        declared: &Signature,
        site: &CallSite<'_>,
    ) -> Result<TypeSubstitution, Rejection> {
        let params = &declared.type_params;
        if params.is_empty() {
            return Ok(TypeSubstitution::new());
        }
        if let Some(type_args) = site.type_args {
            let required = params
                .iter()
                .take_while(|&&p| self.env.defs.type_param(p).default.is_none())
                .count();
            if type_args.len() < required || type_args.len() > params.len() {
                return Err(Rejection::TypeArgumentCount {
                    expected: params.len(),
                });
            }
            let mut subst = TypeSubstitution::from_args(self.env, params, type_args);
            complete_substitution(self.env, params, &mut subst);
            return Ok(subst);
        }

        let mut subst = TypeSubstitution::new();
        let mut inference = Inference::new(self.env, params);
        for (pos, arg) in site.args.iter().enumerate() {
            if let (Some(arg_ty), Some(param_ty)) = (arg.type_id(), declared.param_type_at(pos)) {
                inference.enhance_substitution(param_ty, arg_ty, &mut subst);
            }
        }
        complete_substitution(self.env, params, &mut subst);
        Ok(subst)
    }

    /// The function shape an untyped lambda takes when passed to a parameter
    /// of type `param_ty`.
    fn lambda_shape(
        &self,
        param_ty: TypeId,
        param_count: usize,
        declared: &[Option<TypeId>],
    ) -> Result<FunctionShape, Rejection> {
        let expected = match &*self.env.interner.get(param_ty) {
            TypeData::Function(shape) => shape.clone(),
            _ => return Err(Rejection::Mismatch),
        };
        if param_count > expected.params.len() && expected.rest.is_none() {
            return Err(Rejection::Mismatch);
        }
        let mut relation = TypeRelation::new(self.env).with_flags(RelationFlags::NO_THROW);
        let mut params = Vec::with_capacity(param_count);
        for i in 0..param_count {
            let slot = match expected.params.get(i) {
                Some(p) => *p,
                None => match expected.rest {
                    Some(rest) => ParamInfo::required(Atom::NONE, rest),
                    None => return Err(Rejection::Mismatch),
                },
            };
            let ty = match declared.get(i).copied().flatten() {
                // An annotated parameter must accept what the caller passes.
                Some(annotated) => {
                    if !relation.is_assignable(slot.type_id, annotated) {
                        return Err(Rejection::Mismatch);
                    }
                    annotated
                }
                None => slot.type_id,
            };
            params.push(ParamInfo { type_id: ty, ..slot });
        }
        Ok(FunctionShape {
            params,
            rest: None,
            return_type: expected.return_type,
        })
    }
}

#[cfg(test)]
#[path = "../tests/call_resolution_tests.rs"]
mod tests;
