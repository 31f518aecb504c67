//! Expression checking.
//!
//! Every checked expression gets its type recorded in `node_types`. A
//! failing subexpression yields `ERROR`, which relates to everything
//! silently, so one mistake is reported once.

use kestrel_common::diagnostics::diagnostic_codes;
use kestrel_common::{Atom, Span};
use kestrel_solver::{
    Conversion, FailureKind, PrimitiveKind, RelationFlags, TypeId, TypeRelation, relation_queries,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::ast::{BinaryOp, Expr, ExprKind, Literal, NodeId, TypeNode, UnaryOp, VarId};
use crate::context::Branch;
use crate::scope::VarKind;
use crate::state::CheckerState;

impl CheckerState<'_> {
    pub fn check_expr(&mut self, expr: &Expr) -> TypeId {
        self.check_expr_with_expected(expr, None)
    }

    /// Check `expr`. `expected` is only used to give untyped lambda
    /// parameters their types.
    pub fn check_expr_with_expected(&mut self, expr: &Expr, expected: Option<TypeId>) -> TypeId {
        if !self.ctx.expr_depth.enter() {
            debug!(node = expr.id.0, "expression nesting limit reached");
            return self.record_type(expr, TypeId::ERROR);
        }
        let ty = self.compute_expr_type(expr, expected);
        self.ctx.expr_depth.leave();
        self.record_type(expr, ty)
    }

    fn compute_expr_type(&mut self, expr: &Expr, expected: Option<TypeId>) -> TypeId {
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal_type(literal),
            ExprKind::Ident(name) => self.check_ident(*name, expr.span),
            ExprKind::Binary {
                op: BinaryOp::And | BinaryOp::Or,
                ..
            }
            | ExprKind::Unary {
                op: UnaryOp::Not, ..
            } => {
                // Narrowing inside `a && a.b` applies outside conditions too.
                self.check_test(expr);
                TypeId::BOOLEAN
            }
            ExprKind::Binary { op, left, right } => self.check_binary(expr, *op, left, right),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => self.check_negation(operand),
            ExprKind::InstanceOf { expr: operand, ty } => {
                self.check_instanceof(expr, operand, ty);
                TypeId::BOOLEAN
            }
            ExprKind::Assign { target, value } => self.check_assign(*target, value, expr.span),
            ExprKind::Call(call) => self.check_call(expr, call),
            ExprKind::New { ty, args } => self.check_new(expr, ty, args),
            ExprKind::Lambda(lambda) => {
                let shape = expected.and_then(|ty| self.ctx.env.interner.function_shape(ty));
                self.check_lambda(expr, lambda, shape.as_ref())
            }
            ExprKind::Member { object, name } => self.check_member(object, *name),
            ExprKind::Cast { expr: inner, ty } => self.check_cast(expr, inner, ty),
            ExprKind::NonNull(inner) => {
                let ty = self.check_expr(inner);
                self.ctx.env.non_nullish(ty)
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => self.check_conditional(test, consequent, alternate, expected),
        }
    }

    pub(crate) fn record_type(&mut self, expr: &Expr, ty: TypeId) -> TypeId {
        self.ctx.node_types.insert(expr.id, ty);
        ty
    }

    fn literal_type(&self, literal: &Literal) -> TypeId {
        let interner = &self.ctx.env.interner;
        match literal {
            Literal::Int(value) => interner.literal_int(*value),
            Literal::Float(value) => interner.literal_float(*value),
            Literal::Bool(value) => interner.literal_bool(*value),
            Literal::Char(value) => interner.literal_char(*value),
            Literal::String(atom) => interner.literal_string(&interner.resolve_atom(*atom)),
            Literal::Null => TypeId::NULL,
            Literal::Undefined => TypeId::UNDEFINED,
        }
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// Resolve `name` from the current scope.
    pub fn lookup_var(&self, name: Atom) -> Option<VarId> {
        let scope = self.ctx.current_scope()?;
        self.ctx
            .scopes
            .find_variable_in_class_or_enclosing(scope, name)
    }

    /// Declared type of `var`; fields come from their class.
    pub(crate) fn declared_var_type(&self, var: VarId) -> TypeId {
        let info = self.ctx.scopes.var(var);
        match info.kind {
            VarKind::Field(def) => {
                let env = self.ctx.env;
                env.property_type(env.declared_type(def), info.name)
                    .unwrap_or(TypeId::ERROR)
            }
            VarKind::Local | VarKind::Param => self.ctx.declared_type_of(var),
        }
    }

    fn check_ident(&mut self, name: Atom, span: Span) -> TypeId {
        let Some(var) = self.lookup_var(name) else {
            self.report_error(diagnostic_codes::CANNOT_FIND_NAME, vec![name.into()], span);
            return TypeId::ERROR;
        };
        if self.ctx.scopes.var(var).is_local() {
            self.ctx.smart_type(var)
        } else {
            self.declared_var_type(var)
        }
    }

    fn check_assign(&mut self, target: Atom, value: &Expr, span: Span) -> TypeId {
        let Some(var) = self.lookup_var(target) else {
            self.check_expr(value);
            self.report_error(diagnostic_codes::CANNOT_FIND_NAME, vec![target.into()], span);
            return TypeId::ERROR;
        };
        let declared = self.declared_var_type(var);
        let value_ty = self.check_expr_with_expected(value, Some(declared));
        self.check_assignable(
            value_ty,
            declared,
            value.id,
            value.span,
            FailureKind::Assignment,
            RelationFlags::empty(),
        );
        self.ctx.reset_smart_cast(var);
        declared
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// Numeric kind of a primitive, boxed or literal operand.
    fn numeric_kind(&self, ty: TypeId) -> Option<(PrimitiveKind, bool)> {
        let env = self.ctx.env;
        let widened = env.interner.widen_literal(ty);
        if let Some(kind) = env.interner.primitive_kind(widened) {
            return kind.is_numeric().then_some((kind, false));
        }
        let kind = env.unboxed_kind(widened)?;
        kind.is_numeric().then_some((kind, true))
    }

    fn check_binary(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> TypeId {
        let left_ty = self.check_expr(left);
        let right_ty = self.check_expr(right);
        if left_ty.is_error() || right_ty.is_error() {
            return if op.is_equality() || op.is_comparison() {
                TypeId::BOOLEAN
            } else {
                TypeId::ERROR
            };
        }
        if op.is_equality() {
            return TypeId::BOOLEAN;
        }

        let interner = &self.ctx.env.interner;
        if op == BinaryOp::Add
            && (interner.widen_literal(left_ty) == TypeId::STRING
                || interner.widen_literal(right_ty) == TypeId::STRING)
        {
            return TypeId::STRING;
        }

        let (Some(l), Some(r)) = (self.numeric_kind(left_ty), self.numeric_kind(right_ty)) else {
            self.report_error(
                diagnostic_codes::OPERATOR_CANNOT_BE_APPLIED,
                vec![op.as_str().into(), left_ty.into(), right_ty.into()],
                expr.span,
            );
            return if op.is_comparison() {
                TypeId::BOOLEAN
            } else {
                TypeId::ERROR
            };
        };
        let promoted = promote(l.0, r.0);
        self.record_operand_conversions(left.id, l, promoted);
        self.record_operand_conversions(right.id, r, promoted);
        if op.is_comparison() {
            TypeId::BOOLEAN
        } else {
            TypeId::primitive(promoted)
        }
    }

    fn check_negation(&mut self, operand: &Expr) -> TypeId {
        let ty = self.check_expr(operand);
        if ty.is_error() {
            return TypeId::ERROR;
        }
        let Some(kind) = self.numeric_kind(ty) else {
            self.report_error(
                diagnostic_codes::OPERATOR_CANNOT_BE_APPLIED,
                vec!["-".into(), ty.into(), ty.into()],
                operand.span,
            );
            return TypeId::ERROR;
        };
        let promoted = promote(kind.0, PrimitiveKind::Int);
        self.record_operand_conversions(operand.id, kind, promoted);
        TypeId::primitive(promoted)
    }

    /// Unboxing and widening an arithmetic operand needs.
    fn record_operand_conversions(
        &mut self,
        node: NodeId,
        (kind, boxed): (PrimitiveKind, bool),
        promoted: PrimitiveKind,
    ) {
        let mut conversions: SmallVec<[Conversion; 2]> = SmallVec::new();
        if boxed {
            conversions.push(Conversion::Unbox(kind));
        }
        if kind != promoted {
            conversions.push(Conversion::Widen {
                from: kind,
                to: promoted,
            });
        }
        if !conversions.is_empty() {
            self.ctx.node_conversions.insert(node, conversions);
        }
    }

    /// `operand instanceof T`; returns `T`.
    pub(crate) fn check_instanceof(&mut self, expr: &Expr, operand: &Expr, ty: &TypeNode) -> TypeId {
        let operand_ty = self.check_expr(operand);
        let tested = self.resolve_type_node(ty);
        self.record_type(expr, TypeId::BOOLEAN);
        if operand_ty.is_error() || tested.is_error() || operand_ty == TypeId::ANY {
            return tested;
        }
        if relation_queries::is_subtype_of(self.ctx.env, operand_ty, tested) {
            self.report_warning(
                diagnostic_codes::INSTANCEOF_ALWAYS_TRUE,
                vec![operand_ty.into(), tested.into()],
                expr.span,
            );
        }
        tested
    }

    // =========================================================================
    // Members, casts, conditionals
    // =========================================================================

    fn check_member(&mut self, object: &Expr, name: Atom) -> TypeId {
        let object_ty = self.check_expr(object);
        if object_ty.is_error() {
            return TypeId::ERROR;
        }
        let receiver = self.require_non_nullish(object_ty, object.span);
        let env = self.ctx.env;
        match env.property_type(env.box_if_primitive(receiver), name) {
            Some(ty) => ty,
            None => {
                self.report_error(
                    diagnostic_codes::PROPERTY_DOES_NOT_EXIST_ON_TYPE,
                    vec![name.into(), receiver.into()],
                    object.span,
                );
                TypeId::ERROR
            }
        }
    }

    /// Dereferencing a nullable value is an error; checking continues with
    /// the non-nullish part.
    pub(crate) fn require_non_nullish(&mut self, ty: TypeId, span: Span) -> TypeId {
        let env = self.ctx.env;
        if !env.interner.contains_nullish(ty) {
            return ty;
        }
        self.report_error(
            diagnostic_codes::VALUE_IS_POSSIBLY_NULLISH,
            vec![ty.into()],
            span,
        );
        env.non_nullish(ty)
    }

    fn check_cast(&mut self, expr: &Expr, inner: &Expr, ty: &TypeNode) -> TypeId {
        let source = self.check_expr(inner);
        let target = self.resolve_type_node(ty);
        if source.is_error() || target.is_error() {
            return target;
        }
        let mut relation = TypeRelation::new(self.ctx.env).with_failure_kind(FailureKind::Cast);
        if relation.is_castable(source, target) {
            let conversions = relation.take_conversions();
            if !conversions.is_empty() {
                self.ctx.node_conversions.insert(expr.id, conversions);
            }
        }
        let diagnostics = relation.take_diagnostics();
        self.report_all(diagnostics, expr.span);
        target
    }

    fn check_conditional(
        &mut self,
        test: &Expr,
        consequent: &Expr,
        alternate: &Expr,
        expected: Option<TypeId>,
    ) -> TypeId {
        let tests = self.check_test(test);
        let before = self.ctx.fn_ctx.smart_casts.clone();

        self.ctx.apply_test(&tests, Branch::Consequent);
        let then_ty = self.check_expr_with_expected(consequent, expected);
        let then_state = std::mem::replace(&mut self.ctx.fn_ctx.smart_casts, before);

        self.ctx.apply_test(&tests, Branch::Alternate);
        let else_ty = self.check_expr_with_expected(alternate, expected);
        let else_state = std::mem::take(&mut self.ctx.fn_ctx.smart_casts);

        self.ctx.fn_ctx.smart_casts = self.ctx.combine_smart_casts(&then_state, &else_state);
        if then_ty.is_error() || else_ty.is_error() {
            return TypeId::ERROR;
        }
        let interner = &self.ctx.env.interner;
        self.ctx
            .env
            .union2(interner.widen_literal(then_ty), interner.widen_literal(else_ty))
    }

    // =========================================================================
    // Relation helpers
    // =========================================================================

    /// Report unless `source` is assignable to `target`; conversions are
    /// recorded on `node`.
    pub fn check_assignable(
        &mut self,
        source: TypeId,
        target: TypeId,
        node: NodeId,
        span: Span,
        kind: FailureKind,
        flags: RelationFlags,
    ) -> bool {
        let mut relation = TypeRelation::new(self.ctx.env)
            .with_flags(flags)
            .with_failure_kind(kind);
        let related = relation.is_assignable(source, target);
        let conversions = relation.take_conversions();
        if !conversions.is_empty() {
            self.ctx.node_conversions.insert(node, conversions);
        }
        let diagnostics = relation.take_diagnostics();
        self.report_all(diagnostics, span);
        related
    }
}

/// Binary numeric promotion: at least `int`, else the wider operand.
fn promote(a: PrimitiveKind, b: PrimitiveKind) -> PrimitiveKind {
    use PrimitiveKind::{Double, Float, Int, Long};
    if a == Double || b == Double {
        Double
    } else if a == Float || b == Float {
        Float
    } else if a == Long || b == Long {
        Long
    } else {
        Int
    }
}
