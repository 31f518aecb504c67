//! Tree-building helpers shared by the checker integration tests.
//!
//! Trees are built by hand the way the binder would hand them over: every
//! node gets a fresh `NodeId`, every block its own scope.

#![allow(dead_code)]

use kestrel_checker::ast::{
    BinaryOp, CallExpr, Callee, Expr, ExprKind, FunctionDecl, Lambda, LambdaParam, Literal,
    NodeId, Param, Program, ScopeId, Stmt, StmtKind, TypeNode, UnaryOp, VarId,
};
use kestrel_checker::{CheckResult, CheckerOptions, ScopeKind, ScopeTable, VarKind, check_program};
use kestrel_common::{Atom, Span};
use kestrel_solver::{ClassBuilder, DefId, TypeEnvironment, TypeId};

pub struct Fixture {
    pub env: TypeEnvironment,
    pub scopes: ScopeTable,
    next_node: u32,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            env: TypeEnvironment::new(),
            scopes: ScopeTable::new(),
            next_node: 0,
        }
    }

    pub fn atom(&self, name: &str) -> Atom {
        self.env.intern_string(name)
    }

    pub fn node(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.next_node)
    }

    fn span(&self) -> Span {
        Span::new(self.next_node, self.next_node + 1)
    }

    /// `class Animal { name: string }`
    pub fn animal(&self) -> TypeId {
        let def = ClassBuilder::class(&self.env, "Animal")
            .property("name", TypeId::STRING)
            .build();
        self.env.declared_type(def)
    }

    pub fn nullable(&self, ty: TypeId) -> TypeId {
        self.env.interner.union([ty, TypeId::NULL])
    }

    // =========================================================================
    // Scopes and variables
    // =========================================================================

    pub fn function_scope(&mut self) -> ScopeId {
        self.scopes.add_scope(None, ScopeKind::Function)
    }

    pub fn block_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.add_scope(Some(parent), ScopeKind::Block)
    }

    pub fn lambda_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.add_scope(Some(parent), ScopeKind::Lambda)
    }

    pub fn local(&mut self, scope: ScopeId, name: &str) -> VarId {
        let name = self.atom(name);
        self.scopes.declare(scope, name, VarKind::Local)
    }

    pub fn param(&mut self, scope: ScopeId, name: &str, ty: TypeId) -> Param {
        let name = self.atom(name);
        let var = self.scopes.declare(scope, name, VarKind::Param);
        Param {
            var,
            ty: TypeNode::Resolved(ty),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.node(),
            span: self.span(),
            kind,
        }
    }

    pub fn ident(&mut self, name: &str) -> Expr {
        let name = self.atom(name);
        self.expr(ExprKind::Ident(name))
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        let atom = self.atom(value);
        self.expr(ExprKind::Literal(Literal::String(atom)))
    }

    pub fn null(&mut self) -> Expr {
        self.expr(ExprKind::Literal(Literal::Null))
    }

    pub fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn not(&mut self, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        })
    }

    /// `name != null`
    pub fn not_null(&mut self, name: &str) -> Expr {
        let var = self.ident(name);
        let null = self.null();
        self.binary(BinaryOp::LooseNe, var, null)
    }

    /// `name == null`
    pub fn is_null(&mut self, name: &str) -> Expr {
        let var = self.ident(name);
        let null = self.null();
        self.binary(BinaryOp::LooseEq, var, null)
    }

    pub fn instance_of(&mut self, name: &str, ty: TypeId) -> Expr {
        let operand = self.ident(name);
        self.expr(ExprKind::InstanceOf {
            expr: Box::new(operand),
            ty: TypeNode::Resolved(ty),
        })
    }

    pub fn assign(&mut self, target: &str, value: Expr) -> Expr {
        let target = self.atom(target);
        self.expr(ExprKind::Assign {
            target,
            value: Box::new(value),
        })
    }

    pub fn member(&mut self, object: Expr, name: &str) -> Expr {
        let name = self.atom(name);
        self.expr(ExprKind::Member {
            object: Box::new(object),
            name,
        })
    }

    pub fn call(&mut self, name: &str, args: Vec<Expr>) -> Expr {
        let name = self.atom(name);
        self.expr(ExprKind::Call(CallExpr {
            callee: Callee::Function(name),
            type_args: Vec::new(),
            args,
            trailing_lambda: None,
        }))
    }

    pub fn method_call(&mut self, receiver: Expr, name: &str, args: Vec<Expr>) -> Expr {
        let name = self.atom(name);
        self.expr(ExprKind::Call(CallExpr {
            callee: Callee::Method {
                receiver: Box::new(receiver),
                name,
            },
            type_args: Vec::new(),
            args,
            trailing_lambda: None,
        }))
    }

    pub fn new_object(&mut self, ty: TypeId, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::New {
            ty: TypeNode::Resolved(ty),
            args,
        })
    }

    /// Lambda with unannotated parameters declared in `scope`.
    pub fn lambda(&mut self, scope: ScopeId, params: &[&str], body: Vec<Stmt>) -> Expr {
        let params = params
            .iter()
            .map(|name| {
                let name = self.atom(name);
                LambdaParam {
                    var: self.scopes.declare(scope, name, VarKind::Param),
                    ty: None,
                }
            })
            .collect();
        self.expr(ExprKind::Lambda(Lambda {
            scope,
            params,
            return_type: None,
            body,
        }))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub fn stmt(&mut self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.node(),
            span: self.span(),
            kind,
        }
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn var_decl(&mut self, var: VarId, ty: Option<TypeId>, init: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::VarDecl {
            var,
            ty: ty.map(TypeNode::Resolved),
            init,
        })
    }

    pub fn block(&mut self, scope: ScopeId, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block { scope, stmts })
    }

    pub fn if_stmt(&mut self, test: Expr, consequent: Stmt, alternate: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::If {
            test,
            consequent: Box::new(consequent),
            alternate: alternate.map(Box::new),
        })
    }

    pub fn while_stmt(&mut self, id: NodeId, test: Expr, body: Stmt) -> Stmt {
        Stmt {
            id,
            span: self.span(),
            kind: StmtKind::While {
                test,
                body: Box::new(body),
            },
        }
    }

    pub fn return_stmt(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn break_stmt(&mut self, target: NodeId) -> Stmt {
        self.stmt(StmtKind::Break { target })
    }

    // =========================================================================
    // Functions
    // =========================================================================

    pub fn function(
        &mut self,
        name: &str,
        scope: ScopeId,
        params: Vec<Param>,
        return_type: Option<TypeId>,
        body: Vec<Stmt>,
    ) -> FunctionDecl {
        FunctionDecl {
            id: self.node(),
            span: self.span(),
            name: self.atom(name),
            scope,
            type_params: Vec::new(),
            params,
            return_type: return_type.map(TypeNode::Resolved),
            body,
            owner: None,
            is_constructor: false,
        }
    }

    pub fn check(&self, functions: Vec<FunctionDecl>) -> CheckResult {
        self.check_with(CheckerOptions::default(), functions)
    }

    pub fn check_with(&self, options: CheckerOptions, functions: Vec<FunctionDecl>) -> CheckResult {
        check_program(&self.env, &self.scopes, options, &Program { functions })
    }

    pub fn class_def(&self, name: &str) -> DefId {
        ClassBuilder::class(&self.env, name).build()
    }
}
