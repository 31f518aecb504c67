//! Pre-bound tree model consumed by the checker.
//!
//! Parsing and declaration binding happen elsewhere. By the time a tree
//! reaches the checker every declaration has a `VarId`, every block-like
//! construct has a `ScopeId`, and every `break`/`continue` names the
//! `NodeId` of the loop it leaves. Identifier references are still names;
//! they are resolved against the `ScopeTable` while checking.

use kestrel_common::{Atom, Span};
use kestrel_solver::{DefId, TypeId, TypeParamId};

/// Identity of a checked node. Results are keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A declared variable, parameter or field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

// =============================================================================
// Type annotations
// =============================================================================

/// A type as written in source.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeNode {
    /// Already resolved by the binder (primitives, non-generic classes).
    Resolved(TypeId),
    /// `Name<Args>`; instantiated while checking.
    Generic {
        def: DefId,
        args: Vec<TypeNode>,
        span: Span,
    },
    Array(Box<TypeNode>),
    Union(Vec<TypeNode>),
    Function {
        params: Vec<TypeNode>,
        return_type: Box<TypeNode>,
    },
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(u16),
    String(Atom),
    Null,
    Undefined,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNe,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::LooseEq => "==",
            BinaryOp::LooseNe => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(
            self,
            BinaryOp::LooseEq | BinaryOp::LooseNe | BinaryOp::StrictEq | BinaryOp::StrictNe
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Callee {
    /// `name(args)`: a local of function type, else a free function.
    Function(Atom),
    /// `receiver.name(args)`: member method or extension function.
    Method { receiver: Box<Expr>, name: Atom },
    /// `(expr)(args)`
    Value(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    pub callee: Callee,
    pub type_args: Vec<TypeNode>,
    pub args: Vec<Expr>,
    /// `f(a) { x -> ... }`; checked as the last argument.
    pub trailing_lambda: Option<Box<Expr>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LambdaParam {
    pub var: VarId,
    pub ty: Option<TypeNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    pub scope: ScopeId,
    pub params: Vec<LambdaParam>,
    pub return_type: Option<TypeNode>,
    /// Expression bodies arrive as a single `return`.
    pub body: Vec<Stmt>,
}

impl Lambda {
    /// Whether some parameter waits for a type from the call it is passed to.
    pub fn needs_inference(&self) -> bool {
        self.params.iter().any(|p| p.ty.is_none())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(Atom),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: TypeNode,
    },
    Assign {
        target: Atom,
        value: Box<Expr>,
    },
    Call(CallExpr),
    New {
        ty: TypeNode,
        args: Vec<Expr>,
    },
    Lambda(Lambda),
    Member {
        object: Box<Expr>,
        name: Atom,
    },
    Cast {
        expr: Box<Expr>,
        ty: TypeNode,
    },
    /// `expr!`
    NonNull(Box<Expr>),
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    VarDecl {
        var: VarId,
        ty: Option<TypeNode>,
        init: Option<Expr>,
    },
    Expr(Expr),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    For {
        scope: ScopeId,
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Block {
        scope: ScopeId,
        stmts: Vec<Stmt>,
    },
    Break {
        target: NodeId,
    },
    Continue {
        target: NodeId,
    },
    Return(Option<Expr>),
    Try {
        block: Box<Stmt>,
        catch: Option<Box<Stmt>>,
        finally: Option<Box<Stmt>>,
    },
    Throw(Expr),
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub var: VarId,
    pub ty: TypeNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: Atom,
    pub scope: ScopeId,
    pub type_params: Vec<TypeParamId>,
    pub params: Vec<Param>,
    /// `None` means the return type is inferred from the body.
    pub return_type: Option<TypeNode>,
    pub body: Vec<Stmt>,
    /// Declaring class of a method or constructor.
    pub owner: Option<DefId>,
    pub is_constructor: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
}
