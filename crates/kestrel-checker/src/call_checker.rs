//! Call Checker
//!
//! Calls, `new` expressions and lambdas. Arguments are checked first, except
//! lambdas with unannotated parameters: those go to the resolver as
//! `UntypedLambda` and their bodies are checked once a signature has been
//! chosen and the parameter types are known.

use kestrel_common::Atom;
use kestrel_common::diagnostics::diagnostic_codes;
use kestrel_solver::{
    ArityRange, CallArgument, CallResolutionError, CallSite, Candidate, FunctionShape, ParamInfo,
    ResolvedCall, SignatureResolver, TypeId,
};
use tracing::{debug, trace};

use crate::ast::{CallExpr, Callee, Expr, ExprKind, Lambda, TypeNode};
use crate::context::{CheckerStatus, FunctionContext};
use crate::reassignment::AssignmentScan;
use crate::state::CheckerState;

/// What a call expression calls.
#[derive(Clone, Copy, Debug)]
enum CallTarget {
    /// Free function overloads by name.
    Function(Atom),
    /// A value of function type.
    Value(TypeId),
    /// Member methods and extension functions of `receiver`.
    Method { receiver: TypeId, name: Atom },
}

impl CheckerState<'_> {
    pub fn check_call(&mut self, expr: &Expr, call: &CallExpr) -> TypeId {
        let mut receiver_expr = None;
        let target = match &call.callee {
            Callee::Function(name) => self.function_target(*name, expr),
            Callee::Method { receiver, name } => {
                receiver_expr = Some(&**receiver);
                let receiver_ty = self.check_expr(receiver);
                if receiver_ty.is_error() {
                    None
                } else {
                    let receiver_ty = self.require_non_nullish(receiver_ty, receiver.span);
                    Some(CallTarget::Method {
                        receiver: self.ctx.env.box_if_primitive(receiver_ty),
                        name: *name,
                    })
                }
            }
            Callee::Value(callee) => {
                let callee_ty = self.check_expr(callee);
                (!callee_ty.is_error()).then_some(CallTarget::Value(callee_ty))
            }
        };

        let type_args: Vec<TypeId> = call
            .type_args
            .iter()
            .map(|node| self.resolve_type_node(node))
            .collect();
        let arg_exprs: Vec<&Expr> = call
            .args
            .iter()
            .chain(call.trailing_lambda.as_deref())
            .collect();
        let args: Vec<CallArgument> = arg_exprs
            .iter()
            .map(|arg| self.call_argument(arg))
            .collect();

        let Some(target) = target else {
            self.check_unresolved_lambdas(&arg_exprs);
            return TypeId::ERROR;
        };
        if type_args.iter().any(|ty| ty.is_error())
            || args.iter().any(|a| a.type_id().is_some_and(TypeId::is_error))
        {
            self.check_unresolved_lambdas(&arg_exprs);
            return TypeId::ERROR;
        }

        let mut site = CallSite::new(&args, expr.span).with_caller_class(self.ctx.fn_ctx.owner);
        if !type_args.is_empty() {
            site = site.with_type_args(&type_args);
        }
        match self.resolve_target(target, &site) {
            Ok(resolved) => {
                trace!(
                    node = expr.id.0,
                    extension = resolved.via_extension,
                    "call resolved"
                );
                self.apply_resolution(expr, &arg_exprs, receiver_expr, &resolved);
                resolved.return_type()
            }
            Err(err) => {
                if let Some(ty) = self.try_union_split(expr, target, &site, &err) {
                    return ty;
                }
                self.report(err.to_diagnostic(), expr.span);
                self.check_unresolved_lambdas(&arg_exprs);
                TypeId::ERROR
            }
        }
    }

    /// `name(args)`: a visible variable of that name shadows free functions.
    fn function_target(&mut self, name: Atom, expr: &Expr) -> Option<CallTarget> {
        if let Some(var) = self.lookup_var(name) {
            let ty = if self.ctx.scopes.var(var).is_local() {
                self.ctx.smart_type(var)
            } else {
                self.declared_var_type(var)
            };
            return (!ty.is_error()).then_some(CallTarget::Value(ty));
        }
        if self.ctx.env.defs.functions_named(name).is_empty() {
            self.report_error(diagnostic_codes::CANNOT_FIND_NAME, vec![name.into()], expr.span);
            return None;
        }
        Some(CallTarget::Function(name))
    }

    fn call_argument(&mut self, arg: &Expr) -> CallArgument {
        match &arg.kind {
            ExprKind::Lambda(lambda) if lambda.needs_inference() => CallArgument::UntypedLambda {
                param_count: lambda.params.len(),
                declared: lambda
                    .params
                    .iter()
                    .map(|p| p.ty.as_ref().map(|node| self.resolve_type_node(node)))
                    .collect(),
            },
            _ => CallArgument::Typed(self.check_expr(arg)),
        }
    }

    fn resolve_target(
        &mut self,
        target: CallTarget,
        site: &CallSite<'_>,
    ) -> Result<ResolvedCall, CallResolutionError> {
        let mut resolver = SignatureResolver::new(self.ctx.env, &mut self.ctx.obligations);
        match target {
            CallTarget::Function(name) => resolver.resolve_function_call(name, site),
            CallTarget::Value(callee) => resolver.resolve_function_value_call(callee, site),
            CallTarget::Method { receiver, name } => {
                resolver.resolve_method_call(receiver, name, site)
            }
        }
    }

    /// Record the chosen signature and conversions, then check the bodies of
    /// untyped lambdas against the parameter types the signature gave them.
    fn apply_resolution(
        &mut self,
        expr: &Expr,
        arg_exprs: &[&Expr],
        receiver: Option<&Expr>,
        resolved: &ResolvedCall,
    ) {
        self.ctx
            .call_signatures
            .insert(expr.id, resolved.signature.clone());
        for (arg, conversions) in arg_exprs.iter().zip(&resolved.arg_conversions) {
            if !conversions.is_empty() {
                self.ctx.node_conversions.insert(arg.id, conversions.clone());
            }
        }
        if let Some(receiver) = receiver
            && !resolved.receiver_conversions.is_empty()
        {
            self.ctx
                .node_conversions
                .insert(receiver.id, resolved.receiver_conversions.clone());
        }
        for (index, shape) in &resolved.lambda_shapes {
            let Some(arg) = arg_exprs.get(*index) else {
                continue;
            };
            if let ExprKind::Lambda(lambda) = &arg.kind {
                let ty = self.check_lambda_argument(arg, lambda, shape);
                self.record_type(arg, ty);
            }
        }
    }

    /// With splitting enabled, a call that fails for a union argument is
    /// retried once per union member. It succeeds if every member resolves.
    fn try_union_split(
        &mut self,
        expr: &Expr,
        target: CallTarget,
        site: &CallSite<'_>,
        err: &CallResolutionError,
    ) -> Option<TypeId> {
        if !self.ctx.options.allow_union_splitting
            || !matches!(err, CallResolutionError::NoMatchingSignature { .. })
            || site.args.iter().any(CallArgument::needs_inference)
        {
            return None;
        }
        let env = self.ctx.env;
        let (index, members) = site.args.iter().enumerate().find_map(|(i, arg)| {
            let members = env.interner.union_members(arg.type_id()?);
            (members.len() > 1).then_some((i, members))
        })?;

        let mut signatures = Vec::with_capacity(members.len());
        let mut returns = Vec::with_capacity(members.len());
        for &member in members.iter() {
            let mut args = site.args.to_vec();
            args[index] = CallArgument::Typed(member);
            let split_site = CallSite { args: &args, ..*site };
            let resolved = self.resolve_target(target, &split_site).ok()?;
            returns.push(resolved.return_type());
            signatures.push(resolved.signature);
        }
        debug!(
            node = expr.id.0,
            members = signatures.len(),
            "call resolved by union splitting"
        );
        self.ctx.split_calls.insert(expr.id, signatures);
        Some(env.union(returns))
    }

    /// Untyped lambdas of a call that did not resolve: their bodies are
    /// still checked, with error-typed parameters.
    fn check_unresolved_lambdas(&mut self, arg_exprs: &[&Expr]) {
        for arg in arg_exprs {
            if let ExprKind::Lambda(lambda) = &arg.kind
                && lambda.needs_inference()
            {
                let params = lambda
                    .params
                    .iter()
                    .map(|p| ParamInfo::required(self.ctx.scopes.var(p.var).name, TypeId::ERROR))
                    .collect();
                let shape = FunctionShape::new(params, TypeId::ERROR);
                let ty = self.check_lambda_argument(arg, lambda, &shape);
                self.record_type(arg, ty);
            }
        }
    }

    // =========================================================================
    // new
    // =========================================================================

    pub fn check_new(&mut self, expr: &Expr, ty: &TypeNode, args: &[Expr]) -> TypeId {
        let class_ty = self.resolve_type_node(ty);
        let arg_exprs: Vec<&Expr> = args.iter().collect();
        let call_args: Vec<CallArgument> = arg_exprs
            .iter()
            .map(|arg| self.call_argument(arg))
            .collect();
        if class_ty.is_error() {
            self.check_unresolved_lambdas(&arg_exprs);
            return TypeId::ERROR;
        }

        let env = self.ctx.env;
        let name = env.intern_string("constructor");
        let candidates: Vec<Candidate> = env
            .methods_of(class_ty, name)
            .into_iter()
            .map(|(id, signature)| Candidate::new(Some(id), signature))
            .collect();
        if candidates.is_empty() {
            // Implicit no-argument constructor.
            if !call_args.is_empty() {
                let err = CallResolutionError::WrongArgumentCount {
                    expected: ArityRange {
                        min: 0,
                        max: Some(0),
                    },
                    got: call_args.len(),
                };
                self.report(err.to_diagnostic(), expr.span);
                self.check_unresolved_lambdas(&arg_exprs);
            }
            return class_ty;
        }

        let site = CallSite::new(&call_args, expr.span).with_caller_class(self.ctx.fn_ctx.owner);
        let result = SignatureResolver::new(env, &mut self.ctx.obligations)
            .resolve_call(name, &candidates, &site);
        match result {
            Ok(resolved) => self.apply_resolution(expr, &arg_exprs, None, &resolved),
            Err(err) => {
                self.report(err.to_diagnostic(), expr.span);
                self.check_unresolved_lambdas(&arg_exprs);
            }
        }
        class_ty
    }

    // =========================================================================
    // Lambdas
    // =========================================================================

    /// A lambda outside a call argument position. Unannotated parameters
    /// take their types from `expected`, the function type the context
    /// wants.
    pub fn check_lambda(
        &mut self,
        expr: &Expr,
        lambda: &Lambda,
        expected: Option<&FunctionShape>,
    ) -> TypeId {
        if let Some(shape) = expected
            && lambda.params.len() > shape.params.len()
            && shape.rest.is_none()
        {
            let expected_ty = self.ctx.env.interner.function(shape.clone());
            self.report_error(
                diagnostic_codes::LAMBDA_PARAMETER_COUNT_MISMATCH,
                vec![lambda.params.len().into(), expected_ty.into()],
                expr.span,
            );
        }
        let mut params = Vec::with_capacity(lambda.params.len());
        for (index, param) in lambda.params.iter().enumerate() {
            let name = self.ctx.scopes.var(param.var).name;
            let slot = expected.and_then(|shape| {
                shape
                    .params
                    .get(index)
                    .map(|p| p.type_id)
                    .or(shape.rest)
            });
            let ty = match (&param.ty, slot) {
                (Some(node), _) => self.resolve_type_node(node),
                (None, Some(ty)) => ty,
                (None, None) => {
                    self.report_error(
                        diagnostic_codes::LAMBDA_PARAMETER_NEEDS_TYPE,
                        vec![name.into()],
                        expr.span,
                    );
                    TypeId::ERROR
                }
            };
            params.push(ParamInfo::required(name, ty));
        }
        let declared_return = match &lambda.return_type {
            Some(node) => Some(self.resolve_type_node(node)),
            None => expected.and_then(|shape| usable_return(shape.return_type)),
        };
        self.check_lambda_body(expr, lambda, params, declared_return)
    }

    /// A lambda argument whose parameter types the chosen signature fixed.
    fn check_lambda_argument(
        &mut self,
        expr: &Expr,
        lambda: &Lambda,
        shape: &FunctionShape,
    ) -> TypeId {
        let declared_return = match &lambda.return_type {
            Some(node) => Some(self.resolve_type_node(node)),
            None => usable_return(shape.return_type),
        };
        self.check_lambda_body(expr, lambda, shape.params.clone(), declared_return)
    }

    /// Check the body in a fresh function context. Narrowings of captured
    /// variables carry over unless the enclosing function assigns them; after
    /// the lambda, whatever it assigns is no longer narrowed outside.
    fn check_lambda_body(
        &mut self,
        expr: &Expr,
        lambda: &Lambda,
        params: Vec<ParamInfo>,
        declared_return: Option<TypeId>,
    ) -> TypeId {
        for (param, info) in lambda.params.iter().zip(&params) {
            self.ctx.var_types.insert(param.var, info.type_id);
        }

        let scan = AssignmentScan::of_stmts(self.ctx.scopes, Some(lambda.scope), &lambda.body);
        let outer = &self.ctx.fn_ctx;
        let mut scope_stack = outer.scope_stack.clone();
        scope_stack.push(lambda.scope);
        let mut assigned_in_function = outer.assigned_in_function.clone();
        assigned_in_function.extend(scan.assigned.iter().copied());
        let fn_ctx = FunctionContext {
            status: CheckerStatus::IN_LAMBDA,
            smart_casts: self.ctx.captured_smart_casts(),
            scope_stack,
            declared_return,
            assigned_in_function,
            mutated_by_lambdas: outer.mutated_by_lambdas.clone(),
            owner: outer.owner,
            ..FunctionContext::default()
        };
        let saved = std::mem::replace(&mut self.ctx.fn_ctx, fn_ctx);

        self.check_stmts(&lambda.body);
        let return_type = declared_return.unwrap_or_else(|| self.inferred_return_type());

        self.ctx.fn_ctx = saved;
        self.ctx.invalidate_smart_casts(&scan.assigned);
        self.ctx
            .fn_ctx
            .mutated_by_lambdas
            .extend(scan.assigned.iter().copied());

        let shape = FunctionShape::new(params, return_type);
        self.ctx.lambda_signatures.insert(expr.id, shape.clone());
        self.ctx.env.interner.function(shape)
    }
}

/// An expected return type the lambda body is checked against. A `void`
/// slot accepts any expression body, and an error slot says nothing.
fn usable_return(ty: TypeId) -> Option<TypeId> {
    (!ty.is_error() && ty != TypeId::VOID).then_some(ty)
}
