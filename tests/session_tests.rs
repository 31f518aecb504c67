//! `CheckSession` tests: shared environment, options and concurrent drivers.

use std::sync::Arc;
use std::thread;

use kestrel::ast::{
    CallExpr, Callee, Expr, ExprKind, FunctionDecl, Literal, NodeId, Param, Program, ScopeId, Stmt,
    StmtKind, TypeNode,
};
use kestrel::{
    CheckSession, CheckerOptions, ClassBuilder, ParamInfo, ScopeKind, ScopeTable, Signature, Span,
    TypeId, VarKind, diagnostic_codes,
};

fn expr(id: u32, kind: ExprKind) -> Expr {
    Expr {
        id: NodeId(id),
        span: Span::new(id, id + 1),
        kind,
    }
}

fn expr_stmt(id: u32, e: Expr) -> Stmt {
    Stmt {
        id: NodeId(id),
        span: Span::new(id, id + 1),
        kind: StmtKind::Expr(e),
    }
}

/// `fn main(<params>) { <body> }`
fn program(session: &CheckSession, scope: ScopeId, params: Vec<Param>, body: Vec<Stmt>) -> Program {
    let name = session.with_env(|env| env.intern_string("main"));
    Program {
        functions: vec![FunctionDecl {
            id: NodeId(100),
            span: Span::new(0, 100),
            name,
            scope,
            type_params: Vec::new(),
            params,
            return_type: None,
            body,
            owner: None,
            is_constructor: false,
        }],
    }
}

/// `main() { square(3); }` against a session that declares `square(int): int`.
fn square_call(session: &CheckSession) -> (ScopeTable, Program) {
    let mut scopes = ScopeTable::new();
    let scope = scopes.add_scope(None, ScopeKind::Function);
    let callee = session.with_env(|env| env.intern_string("square"));
    let call = expr(
        2,
        ExprKind::Call(CallExpr {
            callee: Callee::Function(callee),
            type_args: Vec::new(),
            args: vec![expr(1, ExprKind::Literal(Literal::Int(3)))],
            trailing_lambda: None,
        }),
    );
    let program = program(session, scope, Vec::new(), vec![expr_stmt(3, call)]);
    (scopes, program)
}

fn declare_square(session: &CheckSession) {
    session.with_env(|env| {
        let param = ParamInfo::required(env.intern_string("n"), TypeId::INT);
        env.defs.add_function(Signature::new(
            env.intern_string("square"),
            vec![param],
            TypeId::INT,
        ));
    });
}

#[test]
fn test_declarations_persist_across_runs() {
    let session = CheckSession::default();
    declare_square(&session);

    for _ in 0..2 {
        let (scopes, program) = square_call(&session);
        let result = session.check(&scopes, &program);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.type_of(NodeId(2)), Some(TypeId::INT));
    }
    assert_eq!(session.runs(), 2);
}

#[test]
fn test_missing_declaration_reported() {
    let session = CheckSession::default();
    let (scopes, program) = square_call(&session);
    let result = session.check(&scopes, &program);
    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_NAME]);
}

#[test]
fn test_concurrent_checks_share_one_environment() {
    let session = Arc::new(CheckSession::default());
    declare_square(&session);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                let (scopes, program) = square_call(&session);
                session.check(&scopes, &program)
            })
        })
        .collect();
    for handle in handles {
        let result = handle.join().expect("checker thread panicked");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }
    assert_eq!(session.runs(), 4);
}

#[test]
fn test_options_apply_to_later_runs() {
    let session = CheckSession::default();
    let animal = session.with_env(|env| {
        let def = ClassBuilder::class(env, "Animal").build();
        env.declared_type(def)
    });

    // main(a: Animal) { a instanceof Animal; }
    let build = |session: &CheckSession| {
        let mut scopes = ScopeTable::new();
        let scope = scopes.add_scope(None, ScopeKind::Function);
        let name = session.with_env(|env| env.intern_string("a"));
        let var = scopes.declare(scope, name, VarKind::Param);
        let test = expr(
            2,
            ExprKind::InstanceOf {
                expr: Box::new(expr(1, ExprKind::Ident(name))),
                ty: TypeNode::Resolved(animal),
            },
        );
        let params = vec![Param {
            var,
            ty: TypeNode::Resolved(animal),
        }];
        let program = program(session, scope, params, vec![expr_stmt(3, test)]);
        (scopes, program)
    };

    let (scopes, prog) = build(&session);
    let result = session.check(&scopes, &prog);
    assert_eq!(result.codes(), vec![diagnostic_codes::INSTANCEOF_ALWAYS_TRUE]);

    session.set_options(CheckerOptions {
        report_warnings: false,
        ..session.options()
    });
    let (scopes, prog) = build(&session);
    assert!(session.check(&scopes, &prog).diagnostics.is_empty());
}
