//! Checker for Kestrel function bodies.
//!
//! This crate is organized into several submodules:
//! - `ast` - the pre-bound tree the checker consumes
//! - `scope` - `ScopeTable` for name resolution
//! - `context` - `CheckerContext` and the per-function smart-cast state
//! - `smart_cast` - smart-cast transitions and merges
//! - `condition` - test expressions and the narrowings they establish
//! - `reassignment` - assignment pre-scan for loops, `try` and lambdas
//! - `expr` - Expression type checking
//! - `statements` - Statement type checking
//! - `call_checker` - calls, `new` and lambda arguments
//! - `type_resolution` - type annotations
//! - `error_reporter` - Error reporting utilities
//! - `options` - `CheckerOptions`

pub mod ast;
pub mod call_checker;
pub mod condition;
pub mod context;
pub mod error_reporter;
pub mod expr;
pub mod options;
pub mod reassignment;
pub mod scope;
mod smart_cast;
pub mod state;
pub mod statements;
pub mod type_resolution;

pub use context::{
    CheckerContext, CheckerStatus, FunctionContext, SmartCastMap, TestCondition, TestKind,
    TestSmartCast, TestSmartCasts,
};
pub use error_reporter::render_diagnostics;
pub use options::CheckerOptions;
pub use reassignment::AssignmentScan;
pub use scope::{ScopeKind, ScopeTable, VarInfo, VarKind};
pub use state::{CheckResult, CheckerState, check_program};
