//! Test expressions.
//!
//! A controlling condition is checked like any expression, and on the way
//! its narrowing triggers are collected into `TestSmartCasts`:
//!
//! - `x instanceof T`: `T` (or the matching union members) when true, the
//!   remaining union members when false
//! - `x == null`, `x !== undefined`, ...: the nullish part or the rest;
//!   a strict comparison only removes the compared value
//! - `x == literal`: the union member of the literal's base type when true
//! - bare `x` of nullable type: non-nullish when true
//!
//! `!` swaps the halves. `&&` and `||` combine their operands below; while
//! the right operand is checked, the left operand's entries are on the test
//! stack so reads of a tested variable see the narrowed type.

use kestrel_solver::TypeId;
use tracing::trace;

use crate::ast::{BinaryOp, Expr, ExprKind, Literal, UnaryOp, VarId};
use crate::context::{
    CheckerStatus, LogicalOp, TestCondition, TestKind, TestSmartCast, TestSmartCasts,
};
use crate::state::CheckerState;

impl CheckerState<'_> {
    /// Check `expr` as a condition and return the narrowings it establishes.
    pub fn check_test(&mut self, expr: &Expr) -> TestSmartCasts {
        let nested = self.ctx.fn_ctx.status.contains(CheckerStatus::IN_TEST);
        self.ctx.fn_ctx.status |= CheckerStatus::IN_TEST;
        let tests = self.check_test_operand(expr);
        if !nested {
            self.ctx.fn_ctx.status.remove(CheckerStatus::IN_TEST);
        }
        tests
    }

    fn check_test_operand(&mut self, expr: &Expr) -> TestSmartCasts {
        match &expr.kind {
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                let inner = self.check_test_operand(operand);
                self.record_type(expr, TypeId::BOOLEAN);
                inner
                    .into_iter()
                    .map(|(var, entry)| (var, entry.swapped()))
                    .collect()
            }
            ExprKind::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                left,
                right,
            } => {
                let logical = if *op == BinaryOp::And {
                    LogicalOp::And
                } else {
                    LogicalOp::Or
                };
                let left_tests = self.check_test_operand(left);
                self.ctx
                    .fn_ctx
                    .test_stack
                    .push((logical, left_tests.clone()));
                let right_tests = self.check_test_operand(right);
                self.ctx.fn_ctx.test_stack.pop();
                self.record_type(expr, TypeId::BOOLEAN);
                match logical {
                    LogicalOp::And => self.combine_and(left_tests, right_tests),
                    LogicalOp::Or => self.combine_or(left_tests, right_tests),
                }
            }
            ExprKind::InstanceOf { expr: operand, ty } => {
                let tested = self.check_instanceof(expr, operand, ty);
                let condition = self.tested_local(operand).map(|var| TestCondition {
                    var,
                    tested,
                    kind: TestKind::InstanceOf,
                    negated: false,
                    strict: false,
                });
                self.test_smart_casts(condition)
            }
            _ => {
                self.check_expr(expr);
                let condition = self.recognize_test(expr);
                self.test_smart_casts(condition)
            }
        }
    }

    /// Equality and truthiness triggers of an already checked leaf.
    fn recognize_test(&self, expr: &Expr) -> Option<TestCondition> {
        if !self.ctx.options.smart_casts {
            return None;
        }
        match &expr.kind {
            ExprKind::Binary { op, left, right } if op.is_equality() => {
                let (var, other) = match (self.tested_local(left), self.tested_local(right)) {
                    (Some(var), _) => (var, right),
                    (None, Some(var)) => (var, left),
                    (None, None) => return None,
                };
                let ExprKind::Literal(literal) = &other.kind else {
                    return None;
                };
                let negated = matches!(op, BinaryOp::LooseNe | BinaryOp::StrictNe);
                let strict = matches!(op, BinaryOp::StrictEq | BinaryOp::StrictNe);
                let (tested, kind) = match literal {
                    Literal::Null => (TypeId::NULL, TestKind::Nullish),
                    Literal::Undefined => (TypeId::UNDEFINED, TestKind::Nullish),
                    // Strict equality with a value literal does not narrow.
                    _ if strict => return None,
                    _ => (self.ctx.node_types.get(&other.id).copied()?, TestKind::Literal),
                };
                Some(TestCondition {
                    var,
                    tested,
                    kind,
                    negated,
                    strict,
                })
            }
            ExprKind::Ident(_) => {
                let var = self.tested_local(expr)?;
                let current = self.ctx.smart_type(var);
                if !self.ctx.env.interner.contains_nullish(current) {
                    return None;
                }
                Some(TestCondition {
                    var,
                    tested: TypeId::NULL,
                    kind: TestKind::Truthy,
                    negated: false,
                    strict: false,
                })
            }
            _ => None,
        }
    }

    /// The local variable `expr` names, if it is a bare identifier.
    fn tested_local(&self, expr: &Expr) -> Option<VarId> {
        let ExprKind::Ident(name) = &expr.kind else {
            return None;
        };
        let var = self.lookup_var(*name)?;
        self.ctx.scopes.var(var).is_local().then_some(var)
    }

    fn test_smart_casts(&self, condition: Option<TestCondition>) -> TestSmartCasts {
        let mut tests = TestSmartCasts::default();
        if !self.ctx.options.smart_casts {
            return tests;
        }
        if let Some(condition) = condition {
            let entry = self.narrowing_for(&condition);
            trace!(
                var = condition.var.0,
                kind = ?condition.kind,
                consequent = ?entry.consequent,
                alternate = ?entry.alternate,
                "test smart cast"
            );
            tests.insert(condition.var, entry);
        }
        tests
    }

    /// Turn a recognized test into the types of both branches, starting
    /// from what the variable is narrowed to right now.
    pub fn narrowing_for(&self, condition: &TestCondition) -> TestSmartCast {
        let env = self.ctx.env;
        let current = self.ctx.smart_type(condition.var);
        let tested = condition.tested;
        let entry = match condition.kind {
            TestKind::InstanceOf => TestSmartCast {
                consequent: Some(env.narrow_to(current, tested)),
                alternate: env.complement(current, tested),
            },
            TestKind::Nullish => {
                let nullish = env.nullish_part(current, tested, condition.strict);
                let rest = if condition.strict {
                    env.remove_nullish(current, tested == TypeId::NULL, tested == TypeId::UNDEFINED)
                } else {
                    env.exclude_nullish(current)
                };
                TestSmartCast {
                    consequent: (nullish != TypeId::NEVER).then_some(nullish),
                    alternate: Some(rest),
                }
            }
            TestKind::Literal => TestSmartCast {
                consequent: env.narrow_to_literal_base(current, tested),
                alternate: None,
            },
            TestKind::Truthy => TestSmartCast {
                consequent: Some(env.exclude_nullish(current)),
                alternate: None,
            },
        };
        if condition.negated {
            entry.swapped()
        } else {
            entry
        }
    }

    // =========================================================================
    // Combination
    // =========================================================================

    /// `a && b`. Consequents accumulate, the narrower one winning for a
    /// variable both sides test. The alternates of `a` survive only when `b`
    /// narrowed nothing in either branch; otherwise every alternate is
    /// dropped.
    fn combine_and(&self, left: TestSmartCasts, right: TestSmartCasts) -> TestSmartCasts {
        let env = self.ctx.env;
        let right_contributed = right
            .values()
            .any(|entry| entry.consequent.is_some() || entry.alternate.is_some());
        let mut combined: TestSmartCasts = left
            .into_iter()
            .map(|(var, entry)| {
                let alternate = if right_contributed {
                    None
                } else {
                    entry.alternate
                };
                (
                    var,
                    TestSmartCast {
                        consequent: entry.consequent,
                        alternate,
                    },
                )
            })
            .collect();
        for (var, entry) in right {
            let slot = combined.entry(var).or_default();
            slot.consequent = match (slot.consequent, entry.consequent) {
                (Some(a), Some(b)) => Some(env.narrow_intersection(a, b)),
                (a, b) => a.or(b),
            };
        }
        combined
    }

    /// `a || b`. A consequent survives only for a variable both sides
    /// narrow, as the union of the two. Alternates accumulate like `&&`
    /// consequents.
    fn combine_or(&self, left: TestSmartCasts, right: TestSmartCasts) -> TestSmartCasts {
        let env = self.ctx.env;
        let mut combined = TestSmartCasts::default();
        for (&var, l) in &left {
            let r = right.get(&var).copied().unwrap_or_default();
            let consequent = match (l.consequent, r.consequent) {
                (Some(a), Some(b)) => Some(env.merge_union(a, b)),
                _ => None,
            };
            let alternate = match (l.alternate, r.alternate) {
                (Some(a), Some(b)) => Some(env.narrow_intersection(a, b)),
                (a, b) => a.or(b),
            };
            combined.insert(
                var,
                TestSmartCast {
                    consequent,
                    alternate,
                },
            );
        }
        for (var, r) in right {
            if left.contains_key(&var) {
                continue;
            }
            combined.insert(
                var,
                TestSmartCast {
                    consequent: None,
                    alternate: r.alternate,
                },
            );
        }
        combined
    }
}
