//! # CheckerState
//!
//! Entry points of the checker. `CheckerState` owns a `CheckerContext`; the
//! actual checking is spread over `impl CheckerState` blocks in:
//!
//! - `expr` - expression types, operators, member access, casts
//! - `condition` - test expressions and the smart casts they establish
//! - `statements` - statements, branch merges, loops, `break`, `try`
//! - `call_checker` - calls, `new`, lambda arguments
//! - `type_resolution` - type annotations and generic instantiation
//! - `error_reporter` - diagnostic emission
//!
//! ## Usage
//!
//! ```ignore
//! let mut checker = CheckerState::new(&env, &scopes, CheckerOptions::default());
//! checker.check_program(&program);
//! let result = checker.finish();
//! ```

use kestrel_common::diagnostics::Diagnostic;
use kestrel_solver::{Conversion, FunctionShape, Signature, TypeEnvironment, TypeId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, instrument};

use crate::ast::{FunctionDecl, NodeId, Program};
use crate::context::{CheckerContext, CheckerStatus, FunctionContext};
use crate::error_reporter::render_diagnostics;
use crate::options::CheckerOptions;
use crate::reassignment::AssignmentScan;
use crate::scope::ScopeTable;

// =============================================================================
// CheckResult
// =============================================================================

/// Everything a checking run produces for the lowering layer.
#[derive(Debug, Default)]
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    pub node_types: FxHashMap<NodeId, TypeId>,
    pub node_conversions: FxHashMap<NodeId, SmallVec<[Conversion; 2]>>,
    pub call_signatures: FxHashMap<NodeId, Signature>,
    pub split_calls: FxHashMap<NodeId, Vec<Signature>>,
    pub lambda_signatures: FxHashMap<NodeId, FunctionShape>,
    pub return_types: FxHashMap<NodeId, TypeId>,
}

impl CheckResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.node_types.get(&node).copied()
    }
}

// =============================================================================
// CheckerState
// =============================================================================

pub struct CheckerState<'a> {
    pub ctx: CheckerContext<'a>,
}

impl<'a> CheckerState<'a> {
    pub fn new(env: &'a TypeEnvironment, scopes: &'a ScopeTable, options: CheckerOptions) -> Self {
        CheckerState {
            ctx: CheckerContext::new(env, scopes, options),
        }
    }

    #[instrument(level = "debug", skip_all, fields(functions = program.functions.len()))]
    pub fn check_program(&mut self, program: &Program) {
        for func in &program.functions {
            self.check_function(func);
        }
    }

    /// Check one top-level function. Generic constraints collected while
    /// checking it are verified when it finishes.
    #[instrument(level = "trace", skip_all, fields(function = func.name.0))]
    pub fn check_function(&mut self, func: &FunctionDecl) {
        self.ctx.obligations.enter_scope();

        let scopes = self.ctx.scopes;
        let mut fn_ctx = FunctionContext {
            scope_stack: vec![func.scope],
            owner: func.owner.or_else(|| scopes.enclosing_class(func.scope)),
            assigned_in_function: AssignmentScan::of_stmts(scopes, Some(func.scope), &func.body)
                .assigned,
            ..FunctionContext::default()
        };
        if func.is_constructor {
            fn_ctx.status |= CheckerStatus::IN_CONSTRUCTOR;
        }
        let saved = std::mem::replace(&mut self.ctx.fn_ctx, fn_ctx);

        for param in &func.params {
            let ty = self.resolve_type_node(&param.ty);
            self.ctx.var_types.insert(param.var, ty);
        }
        let declared_return = if func.is_constructor {
            Some(TypeId::VOID)
        } else {
            func.return_type
                .as_ref()
                .map(|node| self.resolve_type_node(node))
        };
        self.ctx.fn_ctx.declared_return = declared_return;

        self.check_stmts(&func.body);

        let return_type = declared_return.unwrap_or_else(|| self.inferred_return_type());
        self.ctx.return_types.insert(func.id, return_type);
        self.ctx.fn_ctx = saved;

        let deferred = self.ctx.obligations.exit_scope(self.ctx.env);
        debug!(
            function = func.name.0,
            deferred = deferred.len(),
            "function checked"
        );
        self.report_all(deferred, func.span);
    }

    /// Union of the observed `return` types, `void` when there were none.
    pub(crate) fn inferred_return_type(&self) -> TypeId {
        let observed = &self.ctx.fn_ctx.return_types;
        if observed.is_empty() {
            return TypeId::VOID;
        }
        self.ctx.env.union(observed.iter().copied())
    }

    /// Render diagnostics and hand over the per-node results.
    pub fn finish(self) -> CheckResult {
        let ctx = self.ctx;
        CheckResult {
            diagnostics: render_diagnostics(ctx.env, &ctx.diagnostics),
            node_types: ctx.node_types,
            node_conversions: ctx.node_conversions,
            call_signatures: ctx.call_signatures,
            split_calls: ctx.split_calls,
            lambda_signatures: ctx.lambda_signatures,
            return_types: ctx.return_types,
        }
    }
}

/// Check `program` in one go.
pub fn check_program(
    env: &TypeEnvironment,
    scopes: &ScopeTable,
    options: CheckerOptions,
    program: &Program,
) -> CheckResult {
    let mut checker = CheckerState::new(env, scopes, options);
    checker.check_program(program);
    checker.finish()
}
