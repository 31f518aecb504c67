//! Pre-scan for assignments.
//!
//! Loops, `try` blocks and lambdas need to know which variables a region
//! may assign before the region is checked. The scan resolves assignment
//! targets the same way the checker does, following the scopes the region
//! opens.

use kestrel_common::Atom;
use rustc_hash::FxHashSet;

use crate::ast::{Callee, Expr, ExprKind, ScopeId, Stmt, StmtKind, VarId};
use crate::scope::ScopeTable;

/// What a region does to the variables visible in it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentScan {
    /// Variables assigned somewhere in the region.
    pub assigned: FxHashSet<VarId>,
}

impl AssignmentScan {
    pub fn of_stmts(scopes: &ScopeTable, scope: Option<ScopeId>, stmts: &[Stmt]) -> Self {
        let mut scanner = Scanner::new(scopes, scope);
        for stmt in stmts {
            scanner.stmt(stmt);
        }
        scanner.scan
    }

    pub fn of_stmt(scopes: &ScopeTable, scope: Option<ScopeId>, stmt: &Stmt) -> Self {
        Self::of_stmts(scopes, scope, std::slice::from_ref(stmt))
    }

    /// A loop: the test, the update and the body run once per iteration.
    pub fn of_loop(
        scopes: &ScopeTable,
        scope: Option<ScopeId>,
        test: Option<&Expr>,
        body: &Stmt,
        update: Option<&Expr>,
    ) -> Self {
        let mut scanner = Scanner::new(scopes, scope);
        if let Some(test) = test {
            scanner.expr(test);
        }
        scanner.stmt(body);
        if let Some(update) = update {
            scanner.expr(update);
        }
        scanner.scan
    }
}

struct Scanner<'s> {
    scopes: &'s ScopeTable,
    scope_stack: Vec<ScopeId>,
    scan: AssignmentScan,
}

impl<'s> Scanner<'s> {
    fn new(scopes: &'s ScopeTable, scope: Option<ScopeId>) -> Self {
        Scanner {
            scopes,
            scope_stack: scope.into_iter().collect(),
            scan: AssignmentScan::default(),
        }
    }

    fn resolve(&self, name: Atom) -> Option<VarId> {
        let scope = *self.scope_stack.last()?;
        self.scopes.find_variable_in_class_or_enclosing(scope, name)
    }

    fn with_scope(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self)) {
        self.scope_stack.push(scope);
        f(self);
        self.scope_stack.pop();
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl { init, .. } => {
                if let Some(init) = init {
                    self.expr(init);
                }
            }
            StmtKind::Expr(expr) | StmtKind::Throw(expr) => self.expr(expr),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test);
                self.stmt(consequent);
                if let Some(alternate) = alternate {
                    self.stmt(alternate);
                }
            }
            StmtKind::While { test, body } => {
                self.expr(test);
                self.stmt(body);
            }
            StmtKind::For {
                scope,
                init,
                test,
                update,
                body,
            } => self.with_scope(*scope, |s| {
                if let Some(init) = init {
                    s.stmt(init);
                }
                if let Some(test) = test {
                    s.expr(test);
                }
                s.stmt(body);
                if let Some(update) = update {
                    s.expr(update);
                }
            }),
            StmtKind::Block { scope, stmts } => self.with_scope(*scope, |s| {
                for stmt in stmts {
                    s.stmt(stmt);
                }
            }),
            StmtKind::Try {
                block,
                catch,
                finally,
            } => {
                self.stmt(block);
                if let Some(catch) = catch {
                    self.stmt(catch);
                }
                if let Some(finally) = finally {
                    self.stmt(finally);
                }
            }
            StmtKind::Break { .. } | StmtKind::Continue { .. } => {}
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::Ident(_) => {}
            ExprKind::Assign { target, value } => {
                self.expr(value);
                if let Some(var) = self.resolve(*target) {
                    self.scan.assigned.insert(var);
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::InstanceOf { expr, .. }
            | ExprKind::Cast { expr, .. }
            | ExprKind::NonNull(expr)
            | ExprKind::Member { object: expr, .. } => self.expr(expr),
            ExprKind::Call(call) => {
                match &call.callee {
                    Callee::Function(_) => {}
                    Callee::Method { receiver, .. } => self.expr(receiver),
                    Callee::Value(callee) => self.expr(callee),
                }
                for arg in &call.args {
                    self.expr(arg);
                }
                if let Some(lambda) = &call.trailing_lambda {
                    self.expr(lambda);
                }
            }
            ExprKind::New { args, .. } => {
                for arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::Lambda(lambda) => self.with_scope(lambda.scope, |s| {
                for stmt in &lambda.body {
                    s.stmt(stmt);
                }
            }),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test);
                self.expr(consequent);
                self.expr(alternate);
            }
        }
    }
}
