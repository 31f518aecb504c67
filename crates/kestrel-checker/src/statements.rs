//! Statement checking and the control-flow side of smart casts.

use kestrel_common::diagnostics::diagnostic_codes;
use kestrel_solver::{FailureKind, RelationFlags, TypeId};
use tracing::debug;

use crate::ast::{Expr, NodeId, ScopeId, Stmt, StmtKind, TypeNode, VarId};
use crate::context::{Branch, CheckerStatus, SmartCastMap};
use crate::reassignment::AssignmentScan;
use crate::state::CheckerState;

impl CheckerState<'_> {
    /// Check a statement list. Code after a statement that always leaves
    /// the list gets one warning and is still checked.
    pub fn check_stmts(&mut self, stmts: &[Stmt]) {
        let mut warned = false;
        for stmt in stmts {
            if !warned && self.ctx.fn_ctx.is_terminated() {
                self.report_warning(diagnostic_codes::UNREACHABLE_CODE, Vec::new(), stmt.span);
                warned = true;
            }
            self.check_stmt(stmt);
        }
    }

    pub fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl { var, ty, init } => {
                self.check_var_decl(stmt, *var, ty.as_ref(), init.as_ref());
            }
            StmtKind::Expr(expr) => {
                self.check_expr(expr);
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => self.check_if(test, consequent, alternate.as_deref()),
            StmtKind::While { test, body } => {
                self.check_loop(stmt.id, None, None, Some(test), None, body);
            }
            StmtKind::For {
                scope,
                init,
                test,
                update,
                body,
            } => self.check_loop(
                stmt.id,
                Some(*scope),
                init.as_deref(),
                test.as_ref(),
                update.as_ref(),
                body,
            ),
            StmtKind::Block { scope, stmts } => self.check_block(*scope, stmts),
            StmtKind::Break { target } => self.ctx.record_break(*target),
            StmtKind::Continue { .. } => {
                // The next iteration starts from the loop entry state.
                self.ctx.fn_ctx.smart_casts.clear();
                self.ctx.fn_ctx.status |= CheckerStatus::MET_BREAK;
            }
            StmtKind::Return(value) => self.check_return(stmt, value.as_ref()),
            StmtKind::Throw(value) => {
                self.check_expr(value);
                self.ctx.fn_ctx.status |= CheckerStatus::MET_RETURN;
            }
            StmtKind::Try {
                block,
                catch,
                finally,
            } => self.check_try(block, catch.as_deref(), finally.as_deref()),
        }
    }

    fn check_var_decl(
        &mut self,
        stmt: &Stmt,
        var: VarId,
        annotation: Option<&TypeNode>,
        init: Option<&Expr>,
    ) {
        let declared = match (annotation, init) {
            (Some(annotation), init) => {
                let declared = self.resolve_type_node(annotation);
                if let Some(init) = init {
                    let init_ty = self.check_expr_with_expected(init, Some(declared));
                    self.check_assignable(
                        init_ty,
                        declared,
                        init.id,
                        init.span,
                        FailureKind::Assignment,
                        RelationFlags::empty(),
                    );
                }
                declared
            }
            (None, Some(init)) => {
                let init_ty = self.check_expr(init);
                self.ctx.env.interner.widen_literal(init_ty)
            }
            (None, None) => {
                let name = self.ctx.scopes.var(var).name;
                self.report_error(
                    diagnostic_codes::VARIABLE_NEEDS_TYPE,
                    vec![name.into()],
                    stmt.span,
                );
                TypeId::ERROR
            }
        };
        self.ctx.var_types.insert(var, declared);
        self.ctx.reset_smart_cast(var);
    }

    // =========================================================================
    // Branches
    // =========================================================================

    fn check_if(&mut self, test: &Expr, consequent: &Stmt, alternate: Option<&Stmt>) {
        let tests = self.check_test(test);
        let before = self.ctx.fn_ctx.smart_casts.clone();
        let status = self.ctx.fn_ctx.status - CheckerStatus::TERMINATED;

        self.ctx.apply_test(&tests, Branch::Consequent);
        self.ctx.fn_ctx.status = status;
        self.check_stmt(consequent);
        let then_status = self.ctx.fn_ctx.status;
        let then_state = std::mem::replace(&mut self.ctx.fn_ctx.smart_casts, before);

        self.ctx.apply_test(&tests, Branch::Alternate);
        self.ctx.fn_ctx.status = status;
        if let Some(alternate) = alternate {
            self.check_stmt(alternate);
        }
        let else_status = self.ctx.fn_ctx.status;
        let else_state = std::mem::take(&mut self.ctx.fn_ctx.smart_casts);

        let then_done = then_status.intersects(CheckerStatus::TERMINATED);
        let else_done = else_status.intersects(CheckerStatus::TERMINATED);
        self.ctx.fn_ctx.smart_casts = self
            .ctx
            .join_branches((then_state, then_done), (else_state, else_done));
        self.ctx.fn_ctx.status = if then_done && else_done {
            status | ((then_status | else_status) & CheckerStatus::TERMINATED)
        } else {
            status
        };
    }

    // =========================================================================
    // Loops
    // =========================================================================

    /// `while` and `for`. The body may run any number of times, so
    /// variables it assigns start the body at their declared type, unless
    /// the test narrows them again.
    fn check_loop(
        &mut self,
        id: NodeId,
        scope: Option<ScopeId>,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) {
        let saved_status = self.ctx.fn_ctx.status;
        // Variables of the loop scope are gone once the loop exits.
        self.ctx.register_break_target(id);
        if let Some(scope) = scope {
            self.ctx.fn_ctx.scope_stack.push(scope);
        }
        if let Some(init) = init {
            self.check_stmt(init);
        }

        let before = self.ctx.fn_ctx.smart_casts.clone();
        let scan = AssignmentScan::of_loop(
            self.ctx.scopes,
            self.ctx.current_scope(),
            test,
            body,
            update,
        );
        debug!(
            loop_node = id.0,
            assigned = scan.assigned.len(),
            "loop pre-scan"
        );
        self.ctx.invalidate_smart_casts(&scan.assigned);

        let tests = match test {
            Some(test) => self.check_test(test),
            None => Default::default(),
        };
        let entry = self.ctx.fn_ctx.smart_casts.clone();

        self.ctx.apply_test(&tests, Branch::Consequent);
        self.ctx.fn_ctx.status =
            (saved_status - CheckerStatus::TERMINATED) | CheckerStatus::IN_LOOP;
        self.check_stmt(body);
        if let Some(update) = update {
            self.ctx.fn_ctx.status.remove(CheckerStatus::TERMINATED);
            self.check_expr(update);
        }

        // The loop exits through a false test or a break.
        self.ctx.fn_ctx.smart_casts = entry;
        if test.is_some() {
            self.ctx.apply_test(&tests, Branch::Alternate);
            if let Some(breaks) = self.ctx.take_break_snapshots(id) {
                let normal = std::mem::take(&mut self.ctx.fn_ctx.smart_casts);
                self.ctx.fn_ctx.smart_casts = self.ctx.combine_smart_casts(&normal, &breaks);
            }
        } else {
            // Without a test only a break leaves the loop.
            self.ctx.fn_ctx.smart_casts = self.ctx.take_break_snapshots(id).unwrap_or_default();
        }
        let after = std::mem::take(&mut self.ctx.fn_ctx.smart_casts);
        self.ctx.fn_ctx.smart_casts = self.ctx.combine_smart_casts(&before, &after);

        if let Some(scope) = scope {
            self.ctx.exit_scope_smart_casts(scope);
            self.ctx.fn_ctx.scope_stack.pop();
        }
        self.ctx.fn_ctx.status = saved_status;
    }

    fn check_block(&mut self, scope: ScopeId, stmts: &[Stmt]) {
        self.ctx.fn_ctx.scope_stack.push(scope);
        self.check_stmts(stmts);
        self.ctx.exit_scope_smart_casts(scope);
        self.ctx.fn_ctx.scope_stack.pop();
    }

    // =========================================================================
    // return / try
    // =========================================================================

    fn check_return(&mut self, stmt: &Stmt, value: Option<&Expr>) {
        let declared = self.ctx.fn_ctx.declared_return;
        match (value, declared) {
            (Some(value), Some(declared)) => {
                let ty = self.check_expr_with_expected(value, Some(declared));
                self.check_assignable(
                    ty,
                    declared,
                    value.id,
                    value.span,
                    FailureKind::Return,
                    RelationFlags::DIRECT_RETURN,
                );
            }
            (Some(value), None) => {
                let ty = self.check_expr(value);
                let ty = self.ctx.env.interner.widen_literal(ty);
                self.ctx.fn_ctx.return_types.push(ty);
            }
            (None, Some(declared)) => {
                self.check_assignable(
                    TypeId::VOID,
                    declared,
                    stmt.id,
                    stmt.span,
                    FailureKind::Return,
                    RelationFlags::DIRECT_RETURN,
                );
            }
            (None, None) => self.ctx.fn_ctx.return_types.push(TypeId::VOID),
        }
        self.ctx.fn_ctx.status |= CheckerStatus::MET_RETURN;
    }

    /// Any statement of the block may throw, so the catch clause only knows
    /// what held before the block minus what the block assigns.
    fn check_try(&mut self, block: &Stmt, catch: Option<&Stmt>, finally: Option<&Stmt>) {
        let scan = AssignmentScan::of_stmt(self.ctx.scopes, self.ctx.current_scope(), block);
        let mut handler_entry: SmartCastMap = self.ctx.fn_ctx.smart_casts.clone();
        handler_entry.retain(|var, _| !scan.assigned.contains(var));

        let saved_status = self.ctx.fn_ctx.status;
        let status = saved_status - CheckerStatus::TERMINATED;
        self.ctx.fn_ctx.status = status | CheckerStatus::IN_TRY;
        self.check_stmt(block);
        let block_done = self.ctx.fn_ctx.status.intersects(CheckerStatus::TERMINATED);
        let block_status = self.ctx.fn_ctx.status & CheckerStatus::TERMINATED;
        self.ctx.fn_ctx.status = status;

        let mut done = block_done;
        if let Some(catch) = catch {
            let block_state =
                std::mem::replace(&mut self.ctx.fn_ctx.smart_casts, handler_entry.clone());
            self.check_stmt(catch);
            let catch_done = self.ctx.fn_ctx.status.intersects(CheckerStatus::TERMINATED);
            let catch_state = std::mem::take(&mut self.ctx.fn_ctx.smart_casts);
            self.ctx.fn_ctx.smart_casts = self
                .ctx
                .join_branches((block_state, block_done), (catch_state, catch_done));
            done = block_done && catch_done;
            self.ctx.fn_ctx.status = status;
        }

        if let Some(finally) = finally {
            let normal = std::mem::take(&mut self.ctx.fn_ctx.smart_casts);
            // Also reached with an exception in flight.
            self.ctx.fn_ctx.smart_casts = self.ctx.combine_smart_casts(&normal, &handler_entry);
            self.check_stmt(finally);
            let finally_done = self.ctx.fn_ctx.status.intersects(CheckerStatus::TERMINATED);
            let finally_scan =
                AssignmentScan::of_stmt(self.ctx.scopes, self.ctx.current_scope(), finally);
            self.ctx.fn_ctx.smart_casts = normal;
            self.ctx.invalidate_smart_casts(&finally_scan.assigned);
            done = done || finally_done;
        }

        self.ctx.fn_ctx.status = if done {
            status | block_status | CheckerStatus::MET_RETURN
        } else {
            status
        };
    }
}
