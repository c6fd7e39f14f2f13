//! Expression lowering: dispatch, literals, names, conversions and
//! aggregates.
//!
//! Every expression lowers to a [`Typed`] value, or to `None` once its
//! problem has been reported.

use reso_diagnostic::unknown_identifier;
use reso_ir::{ExprId, ExprKind, FieldInitRange, Name, ParsedTypeId, Span};
use reso_llir::{CastOp, IrType, ValueId};
use reso_stack::ensure_sufficient_stack;
use reso_types::{classify_cast, BindError, CastKind, LitKind, LitType, Type};

use crate::alloc::AllocKind;

use super::errors;
use super::fold::{self, Const, FoldError, FoldErrorKind};
use super::scope::Binding;
use super::{Lowered, Lowerer, Typed};

impl Lowerer<'_> {
    // ── Main dispatch ──────────────────────────────────────────

    /// Lower `id`. `expected` is the type the context wants, used to bind
    /// unconstrained literals; it is a hint, not a check.
    pub(crate) fn lower_expr(&mut self, id: ExprId, expected: Option<&Type>) -> Lowered {
        ensure_sufficient_stack(|| self.lower_expr_inner(id, expected))
    }

    fn lower_expr_inner(&mut self, id: ExprId, expected: Option<&Type>) -> Lowered {
        let span = self.arena.expr_span(id);
        match *self.arena.expr_kind(id) {
            // ── Literals ───────────────────────────────────────
            ExprKind::Int(value) => self.lower_literal(id, LitKind::Int(i128::from(value)), expected),
            ExprKind::Float(_) => self.lower_literal(id, LitKind::Float, expected),
            ExprKind::Bool(value) => Some(Typed {
                value: self.builder.const_bool(value),
                ty: Type::Bool,
            }),
            ExprKind::Char(c) => {
                let ir = self.ir(&Type::Char);
                Some(Typed {
                    value: self.builder.const_int(ir, u64::from(c)),
                    ty: Type::Char,
                })
            }
            ExprKind::Str(text) => {
                let text = self.text(text);
                Some(Typed {
                    value: self.builder.global_string(text),
                    ty: Type::String,
                })
            }
            ExprKind::Unit => self.unit(),
            ExprKind::Null => Some(Typed {
                value: self.builder.const_null(),
                ty: Type::Null,
            }),

            // ── Names ──────────────────────────────────────────
            ExprKind::Ident(name) => self.lower_ident(name, span),

            // ── Operators ──────────────────────────────────────
            ExprKind::Unary { op, operand } => match fold::literal_kind(self.arena, id) {
                Some(kind) => self.lower_literal(id, kind, expected),
                None => self.lower_unary(op, operand, span, expected),
            },
            ExprKind::Binary { op, left, right } => match fold::literal_kind(self.arena, id) {
                Some(kind) => self.lower_literal(id, kind, expected),
                None => self.lower_binary(op, left, right, span),
            },
            ExprKind::Cast { expr, target } => self.lower_cast(expr, target, span),

            // ── Calls ──────────────────────────────────────────
            ExprKind::Call { func, args } => self.lower_call(func, args, span),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.lower_method_call(receiver, method, args, span),

            // ── Aggregates and vectors ─────────────────────────
            ExprKind::Field { receiver, field } => self.lower_field(receiver, field, span),
            ExprKind::StructLit { name, fields } => self.lower_struct_lit(name, fields, span),
            ExprKind::Index { receiver, index } => self.lower_index_expr(receiver, index, span),
            ExprKind::VectorNew { elem } => self.lower_vector_new(elem, span),
        }
    }

    // ── Literals ───────────────────────────────────────────────

    /// Bind an unconstrained literal expression and fold it to a constant.
    ///
    /// A literal that cannot take the expected type at all (a float where an
    /// integer is wanted) keeps its default type and lets the consumer report
    /// the mismatch. An integer that is merely out of range is reported here.
    fn lower_literal(&mut self, id: ExprId, kind: LitKind, expected: Option<&Type>) -> Lowered {
        let unbound = LitType::Unbound(kind);
        let state = match expected.map(|target| (target, unbound.bind(target, self.layout))) {
            Some((_, Ok(bound))) => bound,
            Some((target, Err(BindError::OutOfRange))) => LitType::Bound(target.clone()),
            Some((_, Err(BindError::Incompatible))) | None => unbound,
        };
        let ty = state.resolve();
        match fold::eval_const(self.arena, id, &ty, self.layout) {
            Ok(Const::Int(v)) => {
                let ir = self.ir(&ty);
                Some(Typed {
                    value: self.builder.const_int(ir, v as u64),
                    ty,
                })
            }
            Ok(Const::Float(v)) => {
                let ir = self.ir(&ty);
                Some(Typed {
                    value: self.builder.const_float(ir, v),
                    ty,
                })
            }
            Err(err) => {
                self.report_fold_error(err, &ty);
                None
            }
        }
    }

    pub(crate) fn report_fold_error(&mut self, err: FoldError, ty: &Type) {
        let span = self.arena.expr_span(err.expr);
        let shown = self.show(ty);
        let diag = match err.kind {
            FoldErrorKind::OutOfRange(value) => {
                let leaf = matches!(
                    self.arena.expr_kind(err.expr),
                    ExprKind::Int(_) | ExprKind::Unary { .. }
                );
                let what = if leaf {
                    format!("integer literal `{value}`")
                } else if value == i128::MAX {
                    "constant expression".to_owned()
                } else {
                    format!("constant value `{value}`")
                };
                errors::literal_out_of_range(span, &what, &shown)
            }
            FoldErrorKind::DivisionByZero(op) => errors::const_div_by_zero(span, op.as_symbol()),
            FoldErrorKind::ShiftAmount(amount) => {
                errors::literal_out_of_range(span, &format!("shift amount `{amount}`"), &shown)
            }
            FoldErrorKind::NotInteger(op) => {
                errors::cannot_perform(span, op.as_symbol(), &shown, &shown)
            }
        };
        self.report(diag);
    }

    // ── Names ──────────────────────────────────────────────────

    fn lower_ident(&mut self, name: Name, span: Span) -> Lowered {
        match self.scope.lookup(name) {
            Some(Binding::Local { slot, ty }) => {
                let (slot, ty) = (*slot, ty.clone());
                let ir = self.ir(&ty);
                let text = self.text(name);
                Some(Typed {
                    value: self.builder.load(ir, slot, text),
                    ty,
                })
            }
            Some(Binding::Poisoned) => None,
            None => {
                let text = self.text(name);
                self.report(unknown_identifier(span, text));
                None
            }
        }
    }

    // ── Conversions ────────────────────────────────────────────

    fn lower_cast(&mut self, expr: ExprId, target: ParsedTypeId, span: Span) -> Lowered {
        let target = self.resolve(target, span)?;
        // A literal operand takes the target type when its value fits, so
        // `1 as f64` and `255 as u8` emit nothing. Otherwise it keeps its
        // default type and the conversion happens at runtime.
        let hint = fold::literal_kind(self.arena, expr)
            .filter(|kind| LitType::Unbound(*kind).bind(&target, self.layout).is_ok())
            .filter(|_| fold::eval_const(self.arena, expr, &target, self.layout).is_ok())
            .map(|_| &target);
        let operand = self.lower_expr(expr, hint)?;

        let kind = match classify_cast(&operand.ty, &target, self.layout) {
            Ok(kind) => kind,
            Err(_) => {
                let from = self.show(&operand.ty);
                let to = self.show(&target);
                self.report(errors::invalid_conversion(span, &from, &to));
                return None;
            }
        };
        let to = self.ir(&target);
        let value = match kind {
            CastKind::Identity => operand.value,
            CastKind::IntExtend { signed: true } => self.builder.sext(operand.value, to, "conv"),
            CastKind::IntExtend { signed: false } => self.builder.zext(operand.value, to, "conv"),
            CastKind::IntTruncate => self.builder.trunc(operand.value, to, "conv"),
            CastKind::IntToFloat { signed } => {
                let op = if signed { CastOp::SIToFP } else { CastOp::UIToFP };
                self.builder.cast(op, operand.value, to, "conv")
            }
            CastKind::FloatToInt { signed } => {
                let op = if signed { CastOp::FPToSI } else { CastOp::FPToUI };
                self.builder.cast(op, operand.value, to, "conv")
            }
            CastKind::FloatExtend => self.builder.cast(CastOp::FPExt, operand.value, to, "conv"),
            CastKind::FloatTruncate => {
                self.builder.cast(CastOp::FPTrunc, operand.value, to, "conv")
            }
        };
        Some(Typed { value, ty: target })
    }

    // ── Aggregates ─────────────────────────────────────────────

    /// Address and type of `receiver.field`.
    fn field_address(&mut self, receiver: ExprId, field: Name, span: Span) -> Option<(ValueId, Type)> {
        let recv = self.lower_expr(receiver, None)?;
        let tables = self.tables;
        let found = match &recv.ty {
            Type::Aggregate(name) => tables
                .structs
                .get(name)
                .and_then(|info| info.field(field).map(|(index, ty)| (info.id, index, ty))),
            _ => None,
        };
        let Some((struct_id, index, ty)) = found else {
            let field_text = self.text(field);
            let ty_text = self.show(&recv.ty);
            self.report(errors::unknown_field(span, field_text, &ty_text));
            return None;
        };
        let text = self.text(field);
        let addr = self.builder.struct_gep(struct_id, recv.value, index, text);
        Some((addr, ty.clone()))
    }

    fn lower_field(&mut self, receiver: ExprId, field: Name, span: Span) -> Lowered {
        let (addr, ty) = self.field_address(receiver, field, span)?;
        let ir = self.ir(&ty);
        let text = self.text(field);
        Some(Typed {
            value: self.builder.load(ir, addr, text),
            ty,
        })
    }

    /// `receiver.field = value`. The receiver is evaluated first.
    pub(crate) fn lower_field_assign(&mut self, receiver: ExprId, field: Name, value: ExprId, span: Span) {
        let Some((addr, ty)) = self.field_address(receiver, field, span) else {
            self.lower_expr(value, None);
            return;
        };
        let context = format!("assignment to field `{}`", self.text(field));
        let value_span = self.arena.expr_span(value);
        if let Some(v) = self
            .lower_expr(value, Some(&ty))
            .and_then(|v| self.coerce(v, &ty, value_span, &context))
        {
            self.builder.store(v.value, addr);
        }
    }

    /// `Name { field: value, ... }`: evaluate the initializers in source
    /// order, then allocate the instance and store each field.
    fn lower_struct_lit(&mut self, name: Name, fields: FieldInitRange, span: Span) -> Lowered {
        let tables = self.tables;
        let struct_name = self.text(name);
        let Some(info) = tables.structs.get(&name) else {
            self.report(errors::unknown_type(span, struct_name));
            return None;
        };

        let arena = self.arena;
        let mut values: Vec<Option<ValueId>> = vec![None; info.fields.len()];
        let mut seen = vec![false; info.fields.len()];
        let mut ok = true;
        for init in arena.field_inits(fields) {
            let field_text = self.text(init.name);
            let Some((index, ty)) = info.field(init.name) else {
                self.report(errors::unknown_field(init.span, field_text, struct_name));
                self.lower_expr(init.value, None);
                ok = false;
                continue;
            };
            let index = index as usize;
            if seen[index] {
                self.report(errors::already_defined(init.span, "field", field_text));
                ok = false;
                continue;
            }
            seen[index] = true;
            let context = format!("field `{field_text}` of `{struct_name}`");
            match self
                .lower_expr(init.value, Some(ty))
                .and_then(|v| self.coerce(v, ty, init.span, &context))
            {
                Some(v) => values[index] = Some(v.value),
                None => ok = false,
            }
        }
        for (index, (field, _)) in info.fields.iter().enumerate() {
            if !seen[index] {
                let field_text = self.text(*field);
                self.report(errors::missing_field(span, field_text, struct_name));
                ok = false;
            }
        }
        if !ok {
            return None;
        }

        let kind = if info.has_references() {
            AllocKind::General
        } else {
            AllocKind::NoInternalRefs
        };
        let bytes = self.builder.module().size_of(IrType::Struct(info.id));
        let size = self.builder.const_usize(bytes);
        let object = self.alloc.allocate(&mut self.builder, size, kind, struct_name);
        for (index, value) in values.into_iter().enumerate() {
            if let Some(value) = value {
                let field_text = self.text(info.fields[index].0);
                let index = u32::try_from(index).unwrap_or(u32::MAX);
                let addr = self.builder.struct_gep(info.id, object, index, field_text);
                self.builder.store(value, addr);
            }
        }
        Some(Typed {
            value: object,
            ty: Type::Aggregate(name),
        })
    }
}
