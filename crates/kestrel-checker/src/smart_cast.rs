//! Smart-cast state transitions.
//!
//! A local starts at its declared type, becomes narrowed after a successful
//! test, and goes back to the declared type on reassignment, scope exit, or
//! whenever a loop, a `try` block or a lambda could have changed it behind
//! the checker's back. Once a lambda that assigns a local exists, that local
//! stays at its declared type for the rest of the function. Branch states are combined by keeping only the
//! variables narrowed on both sides and unioning their types.

use kestrel_common::internal_error;
use kestrel_solver::TypeId;
use tracing::trace;

use crate::ast::{NodeId, ScopeId, VarId};
use crate::context::{
    Branch, CheckerContext, CheckerStatus, LogicalOp, SmartCastMap, TestSmartCasts,
};

impl CheckerContext<'_> {
    // =========================================================================
    // Read path
    // =========================================================================

    /// The narrowed type of `var`, if any.
    ///
    /// While a `&&`/`||` right operand is being evaluated, the left operand's
    /// test entry for `var` wins: its consequent under `&&`, its alternate
    /// under `||`.
    pub fn get_smart_cast(&self, var: VarId) -> Option<TypeId> {
        if !self.options.smart_casts || self.fn_ctx.mutated_by_lambdas.contains(&var) {
            return None;
        }
        for (op, tests) in self.fn_ctx.test_stack.iter().rev() {
            if let Some(entry) = tests.get(&var) {
                let half = match op {
                    LogicalOp::And => entry.consequent,
                    LogicalOp::Or => entry.alternate,
                };
                if half.is_some() {
                    return half;
                }
            }
        }
        self.fn_ctx.smart_casts.get(&var).copied()
    }

    /// The type a read of `var` sees right now.
    pub fn smart_type(&self, var: VarId) -> TypeId {
        self.get_smart_cast(var)
            .unwrap_or_else(|| self.declared_type_of(var))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Record a narrowing. Narrowing back to the declared type erases the
    /// entry instead.
    pub fn set_smart_cast(&mut self, var: VarId, ty: TypeId) {
        if !self.options.smart_casts || !self.scopes.var(var).is_local() {
            return;
        }
        if ty.is_error()
            || self.fn_ctx.mutated_by_lambdas.contains(&var)
            || self.is_declared_type(var, ty)
        {
            self.fn_ctx.smart_casts.shift_remove(&var);
        } else {
            trace!(var = var.0, ty = ty.0, "smart cast");
            self.fn_ctx.smart_casts.insert(var, ty);
        }
    }

    /// Assignment: the variable is back at its declared type.
    pub fn reset_smart_cast(&mut self, var: VarId) {
        if self.fn_ctx.smart_casts.shift_remove(&var).is_some() {
            trace!(var = var.0, "smart cast reset by assignment");
        }
    }

    pub fn invalidate_smart_casts<'v>(&mut self, vars: impl IntoIterator<Item = &'v VarId>) {
        for var in vars {
            if self.fn_ctx.smart_casts.shift_remove(var).is_some() {
                trace!(var = var.0, "smart cast invalidated");
            }
        }
    }

    /// Install one branch of a test into the committed map.
    pub fn apply_test(&mut self, tests: &TestSmartCasts, branch: Branch) {
        for (&var, entry) in tests {
            let half = match branch {
                Branch::Consequent => entry.consequent,
                Branch::Alternate => entry.alternate,
            };
            if let Some(ty) = half {
                self.set_smart_cast(var, ty);
            }
        }
    }

    /// Leaving `scope`: its variables no longer exist.
    pub fn exit_scope_smart_casts(&mut self, scope: ScopeId) {
        let scopes = self.scopes;
        self.fn_ctx
            .smart_casts
            .retain(|&var, _| scopes.var(var).scope != scope);
    }

    // =========================================================================
    // Merges
    // =========================================================================

    /// Join two branch states: variables narrowed on both sides, unioned.
    pub fn combine_smart_casts(&self, a: &SmartCastMap, b: &SmartCastMap) -> SmartCastMap {
        let mut merged = SmartCastMap::default();
        for (&var, &left) in a {
            let Some(&right) = b.get(&var) else {
                continue;
            };
            let ty = self.env.merge_union(left, right);
            if !self.is_declared_type(var, ty) {
                merged.insert(var, ty);
            }
        }
        merged
    }

    /// Whether `ty` is just the declared type of `var` again. Unions compare
    /// as sets, so `string | double` matches a declared `double | string`.
    fn is_declared_type(&self, var: VarId, ty: TypeId) -> bool {
        let declared = self.declared_type_of(var);
        ty == declared || self.env.relation().is_identical(ty, declared)
    }

    /// Join the states at the end of two branches. A branch that ended in
    /// `break`/`return` does not flow into the join.
    pub fn join_branches(
        &self,
        (then_state, then_done): (SmartCastMap, bool),
        (else_state, else_done): (SmartCastMap, bool),
    ) -> SmartCastMap {
        match (then_done, else_done) {
            (true, true) => SmartCastMap::default(),
            (true, false) => else_state,
            (false, true) => then_state,
            (false, false) => self.combine_smart_casts(&then_state, &else_state),
        }
    }

    // =========================================================================
    // break
    // =========================================================================

    /// Enter a loop that `break` statements may target.
    pub fn register_break_target(&mut self, target: NodeId) {
        let depth = self.fn_ctx.scope_stack.len();
        self.fn_ctx.break_targets.insert(target, depth);
    }

    /// `break`: snapshot the narrowings that survive up to the target,
    /// then end the current path.
    pub fn record_break(&mut self, target: NodeId) {
        let Some(&depth) = self.fn_ctx.break_targets.get(&target) else {
            internal_error!("break target {} is not an enclosing loop", target.0);
        };
        let nested = &self.fn_ctx.scope_stack[depth.min(self.fn_ctx.scope_stack.len())..];
        let scopes = self.scopes;
        let snapshot: SmartCastMap = self
            .fn_ctx
            .smart_casts
            .iter()
            .filter(|(var, _)| !nested.contains(&scopes.var(**var).scope))
            .map(|(&var, &ty)| (var, ty))
            .collect();
        trace!(
            target = target.0,
            kept = snapshot.len(),
            "break snapshot"
        );
        self.fn_ctx
            .break_snapshots
            .entry(target)
            .or_default()
            .push(snapshot);
        self.fn_ctx.smart_casts.clear();
        self.fn_ctx.status |= CheckerStatus::MET_BREAK;
    }

    /// Merge the snapshots of every `break` that left `target`. The first is
    /// taken as is, the rest are combined in.
    pub fn take_break_snapshots(&mut self, target: NodeId) -> Option<SmartCastMap> {
        self.fn_ctx.break_targets.remove(&target);
        let snapshots = self.fn_ctx.break_snapshots.remove(&target)?;
        let mut iter = snapshots.into_iter();
        let first = iter.next()?;
        Some(iter.fold(first, |acc, next| self.combine_smart_casts(&acc, &next)))
    }

    // =========================================================================
    // Lambda capture
    // =========================================================================

    /// Narrowings a lambda body may rely on: none for variables the
    /// enclosing function assigns anywhere.
    pub fn captured_smart_casts(&self) -> SmartCastMap {
        self.fn_ctx
            .smart_casts
            .iter()
            .filter(|(var, _)| !self.fn_ctx.assigned_in_function.contains(*var))
            .map(|(&var, &ty)| (var, ty))
            .collect()
    }
}
