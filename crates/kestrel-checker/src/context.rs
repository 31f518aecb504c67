//! Checker Context
//!
//! Holds the state shared by the expression, statement and call checkers,
//! plus the per-function-body state smart casts live in. Logic lives on
//! `CheckerState`; this module only owns data.

use bitflags::bitflags;
use indexmap::IndexMap;
use kestrel_solver::recursion::{DepthCounter, RecursionProfile};
use kestrel_solver::{
    ConstraintObligations, Conversion, DefId, FunctionShape, PendingDiagnostic, Signature,
    TypeEnvironment, TypeId,
};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::ast::{NodeId, ScopeId, VarId};
use crate::options::CheckerOptions;
use crate::scope::ScopeTable;

bitflags! {
    /// Where the checker currently is inside a function body.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CheckerStatus: u16 {
        const IN_LOOP = 1 << 0;
        const IN_LAMBDA = 1 << 1;
        const IN_CONSTRUCTOR = 1 << 2;
        const IN_TRY = 1 << 3;
        /// The current path ended in `break` or `continue`.
        const MET_BREAK = 1 << 4;
        /// The current path ended in `return` or `throw`.
        const MET_RETURN = 1 << 5;
        /// Evaluating the controlling condition of `if`/`while`/`for`/`?:`.
        const IN_TEST = 1 << 6;

        const TERMINATED = Self::MET_BREAK.bits() | Self::MET_RETURN.bits();
    }
}

/// Committed narrowings: variable -> narrowed type. Insertion order is kept
/// so merges and traces are deterministic.
pub type SmartCastMap = IndexMap<VarId, TypeId, FxBuildHasher>;

/// Narrowing a test establishes for each branch. `None` leaves the variable
/// at whatever the committed map says.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestSmartCast {
    pub consequent: Option<TypeId>,
    pub alternate: Option<TypeId>,
}

impl TestSmartCast {
    pub fn swapped(self) -> Self {
        TestSmartCast {
            consequent: self.alternate,
            alternate: self.consequent,
        }
    }
}

pub type TestSmartCasts = IndexMap<VarId, TestSmartCast, FxBuildHasher>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    Consequent,
    Alternate,
}

/// The shape of one narrowing test before it is turned into types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestKind {
    /// `x instanceof T`
    InstanceOf,
    /// `x == null`, `x === undefined`, ...
    Nullish,
    /// `x == literal` with a non-nullish literal
    Literal,
    /// bare `x` used as a condition
    Truthy,
}

/// One recognized test: the variable, the type it is tested against,
/// whether the test is negated, and whether a nullish comparison is strict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestCondition {
    pub var: VarId,
    pub tested: TypeId,
    pub kind: TestKind,
    pub negated: bool,
    pub strict: bool,
}

/// State scoped to one function or lambda body.
#[derive(Clone, Debug, Default)]
pub struct FunctionContext {
    pub status: CheckerStatus,
    pub smart_casts: SmartCastMap,
    /// Left operands of the `&&`/`||` operators currently being evaluated.
    pub test_stack: Vec<(LogicalOp, TestSmartCasts)>,
    /// Snapshots taken at `break`, keyed by the loop they leave.
    pub break_snapshots: FxHashMap<NodeId, Vec<SmartCastMap>>,
    /// Loop -> length of `scope_stack` when the loop was entered.
    pub break_targets: FxHashMap<NodeId, usize>,
    pub scope_stack: Vec<ScopeId>,
    /// Declared return type; `None` when it is inferred.
    pub declared_return: Option<TypeId>,
    /// Types of the `return` statements seen so far.
    pub return_types: Vec<TypeId>,
    /// Variables assigned anywhere in the enclosing function, lambdas
    /// included. Lambdas never see smart casts of these.
    pub assigned_in_function: FxHashSet<VarId>,
    /// Variables some lambda created so far may assign. Calling the lambda
    /// can change them at any point, so they are never narrowed again.
    pub mutated_by_lambdas: FxHashSet<VarId>,
    /// Class the body belongs to, for member visibility.
    pub owner: Option<DefId>,
}

impl FunctionContext {
    pub fn current_scope(&self) -> Option<ScopeId> {
        self.scope_stack.last().copied()
    }

    pub fn is_terminated(&self) -> bool {
        self.status.intersects(CheckerStatus::TERMINATED)
    }
}

/// Shared checker state.
pub struct CheckerContext<'a> {
    pub env: &'a TypeEnvironment,
    pub scopes: &'a ScopeTable,
    pub options: CheckerOptions,

    /// Deferred generic constraint checks.
    pub obligations: ConstraintObligations,

    /// Diagnostics with their span already attached.
    pub diagnostics: Vec<PendingDiagnostic>,

    // --- Results ---
    pub node_types: FxHashMap<NodeId, TypeId>,
    /// Boxing, unboxing, widening and narrowing to materialize per node.
    pub node_conversions: FxHashMap<NodeId, SmallVec<[Conversion; 2]>>,
    /// Chosen (instantiated) signature per call or `new` expression.
    pub call_signatures: FxHashMap<NodeId, Signature>,
    /// Per-member signatures of calls resolved by union splitting.
    pub split_calls: FxHashMap<NodeId, Vec<Signature>>,
    /// Final shape of every lambda.
    pub lambda_signatures: FxHashMap<NodeId, FunctionShape>,
    /// Declared or inferred return type per function.
    pub return_types: FxHashMap<NodeId, TypeId>,

    /// Declared type of every variable seen so far.
    pub var_types: FxHashMap<VarId, TypeId>,

    pub fn_ctx: FunctionContext,

    /// Recursion depth of expression checking.
    pub expr_depth: DepthCounter,
}

impl<'a> CheckerContext<'a> {
    pub fn new(env: &'a TypeEnvironment, scopes: &'a ScopeTable, options: CheckerOptions) -> Self {
        CheckerContext {
            env,
            scopes,
            options,
            obligations: ConstraintObligations::new(),
            diagnostics: Vec::new(),
            node_types: FxHashMap::default(),
            node_conversions: FxHashMap::default(),
            call_signatures: FxHashMap::default(),
            split_calls: FxHashMap::default(),
            lambda_signatures: FxHashMap::default(),
            return_types: FxHashMap::default(),
            var_types: FxHashMap::default(),
            fn_ctx: FunctionContext::default(),
            expr_depth: DepthCounter::with_profile(RecursionProfile::ExpressionCheck),
        }
    }

    pub fn current_scope(&self) -> Option<ScopeId> {
        self.fn_ctx.current_scope()
    }

    /// Declared type of `var`, `ERROR` before its declaration was checked.
    pub fn declared_type_of(&self, var: VarId) -> TypeId {
        self.var_types.get(&var).copied().unwrap_or(TypeId::ERROR)
    }
}
