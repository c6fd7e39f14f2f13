//! Operator lowering.
//!
//! Binary operators require identical operand types; the only adaptation is
//! binding an unconstrained literal operand to its sibling's type. Shift
//! amounts are the exception: any integer type, resized to the shifted
//! value's width.
//!
//! `and` / `or` never evaluate eagerly. They branch on the left operand and
//! merge the short-circuit constant with the right operand in a phi.

use reso_diagnostic::type_mismatch;
use reso_ir::{BinaryOp, ExprId, Span, UnaryOp};
use reso_llir::{BinOp, FCmpPred, ICmpPred, IrType, ValueId};
use reso_types::{unify_literals, LitType, Type, TypeFlags};

use super::errors;
use super::fold;
use super::{Lowered, Lowerer, Typed};

impl Lowerer<'_> {
    // ── Binary dispatch ────────────────────────────────────────

    pub(crate) fn lower_binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId, span: Span) -> Lowered {
        if op.is_logical() {
            return self.lower_short_circuit(op, left, right);
        }
        if op.is_comparison() {
            if let Some(folded) = self.fold_literal_comparison(op, left, right) {
                return folded;
            }
        }
        let (l, r) = self.lower_operands(op, left, right, span)?;
        if op.is_arithmetic() {
            self.lower_arithmetic(op, &l, &r, span)
        } else if op.is_comparison() {
            self.lower_comparison(op, &l, &r, span)
        } else {
            self.lower_bitwise(op, &l, &r, span)
        }
    }

    /// `1 < 2` and friends: both sides fold at their shared default type.
    /// `None` when either side is not a literal or the kinds differ.
    fn fold_literal_comparison(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> Option<Lowered> {
        let kind = unify_literals(
            fold::literal_kind(self.arena, left)?,
            fold::literal_kind(self.arena, right)?,
        )?;
        let ty = LitType::Unbound(kind).resolve();
        let l = fold::eval_const(self.arena, left, &ty, self.layout);
        let r = fold::eval_const(self.arena, right, &ty, self.layout);
        match (l, r) {
            (Ok(l), Ok(r)) => Some(Some(Typed {
                value: self.builder.const_bool(fold::compare(op, l, r)),
                ty: Type::Bool,
            })),
            (Err(err), _) | (_, Err(err)) => {
                self.report_fold_error(err, &ty);
                Some(None)
            }
        }
    }

    /// Lower both operands left to right, binding literal operands.
    ///
    /// A lone literal takes the other operand's type. Lowering a literal
    /// emits no instructions, so lowering the non-literal side first does
    /// not change evaluation order.
    fn lower_operands(&mut self, op: BinaryOp, left: ExprId, right: ExprId, span: Span) -> Option<(Typed, Typed)> {
        let left_kind = fold::literal_kind(self.arena, left);
        let right_kind = fold::literal_kind(self.arena, right);
        match (left_kind, right_kind) {
            (Some(a), Some(b)) => {
                let Some(kind) = unify_literals(a, b) else {
                    self.report(errors::literal_kinds_differ(
                        span,
                        op.as_symbol(),
                        a.describe(),
                        b.describe(),
                    ));
                    return None;
                };
                let ty = kind.default_type();
                let l = self.lower_expr(left, Some(&ty));
                let r = self.lower_expr(right, Some(&ty));
                Some((l?, r?))
            }
            (Some(_), None) => {
                let r = self.lower_expr(right, None)?;
                let l = self.lower_expr(left, Some(&r.ty))?;
                Some((l, r))
            }
            (None, Some(_)) => {
                let l = self.lower_expr(left, None)?;
                let r = self.lower_expr(right, Some(&l.ty))?;
                Some((l, r))
            }
            (None, None) => {
                let l = self.lower_expr(left, None);
                let r = self.lower_expr(right, None);
                Some((l?, r?))
            }
        }
    }

    // ── Arithmetic ─────────────────────────────────────────────

    fn lower_arithmetic(&mut self, op: BinaryOp, l: &Typed, r: &Typed, span: Span) -> Lowered {
        let symbol = op.as_symbol();
        if !l.ty.is_numeric() || !r.ty.is_numeric() {
            let offenders: Vec<String> = [&l.ty, &r.ty]
                .into_iter()
                .filter(|ty| !ty.is_numeric())
                .map(|ty| self.show(ty))
                .collect();
            let first = &offenders[0];
            let second = offenders.last().unwrap_or(first);
            self.report(errors::non_numeric(span, symbol, first, second));
            return None;
        }
        if l.ty != r.ty {
            let (lt, rt) = (self.show(&l.ty), self.show(&r.ty));
            self.report(errors::cannot_perform(span, symbol, &lt, &rt));
            return None;
        }

        let ty = l.ty.clone();
        let float = ty.is_float();
        let signed = ty.is_signed_int();
        let (a, b) = (l.value, r.value);
        let divides = matches!(op, BinaryOp::Div | BinaryOp::Rem | BinaryOp::Mod);
        if divides && !float && self.builder.const_int_value(b) == Some(0) {
            self.report(errors::const_div_by_zero(span, symbol));
            return None;
        }

        let value = match op {
            BinaryOp::Add if float => self.builder.fadd(a, b, "add"),
            BinaryOp::Add => self.builder.add(a, b, "add"),
            BinaryOp::Sub if float => self.builder.binary(BinOp::FSub, a, b, "sub"),
            BinaryOp::Sub => self.builder.sub(a, b, "sub"),
            BinaryOp::Mul if float => self.builder.binary(BinOp::FMul, a, b, "mul"),
            BinaryOp::Mul => self.builder.mul(a, b, "mul"),
            BinaryOp::Div if float => self.builder.binary(BinOp::FDiv, a, b, "div"),
            BinaryOp::Div if signed => self.builder.sdiv(a, b, "div"),
            BinaryOp::Div => self.builder.udiv(a, b, "div"),
            BinaryOp::Rem if float => self.builder.frem(a, b, "rem"),
            BinaryOp::Rem if signed => self.builder.srem(a, b, "rem"),
            BinaryOp::Rem => self.builder.urem(a, b, "rem"),
            BinaryOp::Mod if float => self.lower_float_mod(a, b, &ty),
            BinaryOp::Mod if signed => self.lower_signed_mod(a, b, &ty),
            BinaryOp::Mod => self.builder.urem(a, b, "mod"),
            _ => return None,
        };
        Some(Typed { value, ty })
    }

    /// `a mod b` on signed integers: the remainder, plus `b` when it is
    /// non-zero and its sign differs from the divisor's.
    fn lower_signed_mod(&mut self, a: ValueId, b: ValueId, ty: &Type) -> ValueId {
        let ir = self.ir(ty);
        let rem = self.builder.srem(a, b, "rem");
        let zero = self.builder.const_int(ir, 0);
        let nonzero = self.builder.icmp(ICmpPred::Ne, rem, zero, "rem.nz");
        let rem_neg = self.builder.icmp(ICmpPred::Slt, rem, zero, "rem.neg");
        let div_neg = self.builder.icmp(ICmpPred::Slt, b, zero, "div.neg");
        let differ = self.builder.xor(rem_neg, div_neg, "sign.differ");
        let adjust = self.builder.and(nonzero, differ, "mod.adjust");
        let fixed = self.builder.add(rem, b, "rem.fixed");
        self.builder.select(adjust, fixed, rem, "mod")
    }

    /// Float `mod`: same adjustment on the float remainder. A zero remainder
    /// (either sign) is left as is.
    fn lower_float_mod(&mut self, a: ValueId, b: ValueId, ty: &Type) -> ValueId {
        let ir = self.ir(ty);
        let rem = self.builder.frem(a, b, "rem");
        let zero = self.builder.const_float(ir, 0.0);
        let nonzero = self.builder.fcmp(FCmpPred::Une, rem, zero, "rem.nz");
        let rem_neg = self.builder.fcmp(FCmpPred::Olt, rem, zero, "rem.neg");
        let div_neg = self.builder.fcmp(FCmpPred::Olt, b, zero, "div.neg");
        let differ = self.builder.xor(rem_neg, div_neg, "sign.differ");
        let adjust = self.builder.and(nonzero, differ, "mod.adjust");
        let fixed = self.builder.fadd(rem, b, "rem.fixed");
        self.builder.select(adjust, fixed, rem, "mod")
    }

    // ── Comparisons ────────────────────────────────────────────

    fn lower_comparison(&mut self, op: BinaryOp, l: &Typed, r: &Typed, span: Span) -> Lowered {
        let symbol = op.as_symbol();
        let null_against = |a: &Type, b: &Type| *a == Type::Null && (b.is_nullable() || *b == Type::Null);
        let value = if op.is_ordering() {
            if l.ty != r.ty {
                let (lt, rt) = (self.show(&l.ty), self.show(&r.ty));
                self.report(errors::cannot_compare(span, symbol, &lt, &rt));
                return None;
            }
            if !l.ty.flags().contains(TypeFlags::ORDERED) {
                let ty = self.show(&l.ty);
                self.report(errors::ordering_unsupported(span, symbol, &ty));
                return None;
            }
            self.emit_ordering(op, l, r)
        } else {
            let same = l.ty == r.ty && l.ty.flags().contains(TypeFlags::EQUATABLE);
            if !(same || null_against(&l.ty, &r.ty) || null_against(&r.ty, &l.ty)) {
                let (lt, rt) = (self.show(&l.ty), self.show(&r.ty));
                self.report(errors::cannot_compare(span, symbol, &lt, &rt));
                return None;
            }
            let equal = op == BinaryOp::Eq;
            if l.ty.is_float() {
                let pred = if equal { FCmpPred::Oeq } else { FCmpPred::Une };
                self.builder.fcmp(pred, l.value, r.value, "cmp")
            } else {
                let pred = if equal { ICmpPred::Eq } else { ICmpPred::Ne };
                self.builder.icmp(pred, l.value, r.value, "cmp")
            }
        };
        Some(Typed {
            value,
            ty: Type::Bool,
        })
    }

    fn emit_ordering(&mut self, op: BinaryOp, l: &Typed, r: &Typed) -> ValueId {
        if l.ty.is_float() {
            let pred = match op {
                BinaryOp::Lt => FCmpPred::Olt,
                BinaryOp::LtEq => FCmpPred::Ole,
                BinaryOp::Gt => FCmpPred::Ogt,
                _ => FCmpPred::Oge,
            };
            return self.builder.fcmp(pred, l.value, r.value, "cmp");
        }
        let pred = match (op, l.ty.is_signed_int()) {
            (BinaryOp::Lt, true) => ICmpPred::Slt,
            (BinaryOp::LtEq, true) => ICmpPred::Sle,
            (BinaryOp::Gt, true) => ICmpPred::Sgt,
            (_, true) => ICmpPred::Sge,
            (BinaryOp::Lt, false) => ICmpPred::Ult,
            (BinaryOp::LtEq, false) => ICmpPred::Ule,
            (BinaryOp::Gt, false) => ICmpPred::Ugt,
            (_, false) => ICmpPred::Uge,
        };
        self.builder.icmp(pred, l.value, r.value, "cmp")
    }

    // ── Bitwise ────────────────────────────────────────────────

    fn lower_bitwise(&mut self, op: BinaryOp, l: &Typed, r: &Typed, span: Span) -> Lowered {
        let symbol = op.as_symbol();
        let value = if op.is_shift() {
            if !l.ty.is_integer() || !r.ty.is_integer() {
                let (lt, rt) = (self.show(&l.ty), self.show(&r.ty));
                self.report(errors::cannot_perform(span, symbol, &lt, &rt));
                return None;
            }
            let width = self.ir(&l.ty);
            let amount = self
                .builder
                .int_resize(r.value, width, r.ty.is_signed_int(), "shamt");
            let bin = match op {
                BinaryOp::Shl => BinOp::Shl,
                _ if l.ty.is_signed_int() => BinOp::AShr,
                _ => BinOp::LShr,
            };
            self.builder.binary(bin, l.value, amount, "shift")
        } else {
            if l.ty != r.ty || !(l.ty.is_integer() || l.ty == Type::Bool) {
                let (lt, rt) = (self.show(&l.ty), self.show(&r.ty));
                self.report(errors::cannot_perform(span, symbol, &lt, &rt));
                return None;
            }
            match op {
                BinaryOp::BitAnd => self.builder.and(l.value, r.value, "and"),
                BinaryOp::BitOr => self.builder.or(l.value, r.value, "or"),
                _ => self.builder.xor(l.value, r.value, "xor"),
            }
        };
        Some(Typed {
            value,
            ty: l.ty.clone(),
        })
    }

    // ── Unary ──────────────────────────────────────────────────

    pub(crate) fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: ExprId,
        span: Span,
        expected: Option<&Type>,
    ) -> Lowered {
        let hint = match op {
            UnaryOp::Not => Some(&Type::Bool),
            UnaryOp::Plus | UnaryOp::Neg | UnaryOp::BitNot => expected,
        };
        let v = self.lower_expr(operand, hint)?;
        let (value, kind) = match op {
            UnaryOp::Plus if v.ty.is_numeric() => return Some(v),
            UnaryOp::Neg if v.ty.is_float() => (self.builder.fneg(v.value, "neg"), ""),
            UnaryOp::Neg if v.ty.is_integer() => (self.builder.neg(v.value, "neg"), ""),
            UnaryOp::Plus | UnaryOp::Neg => (v.value, "a numeric"),
            UnaryOp::Not if v.ty == Type::Bool => (self.builder.not(v.value, "not"), ""),
            UnaryOp::Not => (v.value, "a `bool`"),
            UnaryOp::BitNot if v.ty.is_integer() => (self.builder.not(v.value, "bitnot"), ""),
            UnaryOp::BitNot => (v.value, "an integer"),
        };
        if !kind.is_empty() {
            let found = self.show(&v.ty);
            self.report(errors::unary_operand(span, op.as_symbol(), kind, &found));
            return None;
        }
        Some(Typed { value, ty: v.ty })
    }

    // ── Short-circuit logic ────────────────────────────────────

    /// `and` / `or` as a branch on the left operand and a two-edge phi.
    ///
    /// ```text
    /// origin:     br %l, label %and.rhs, label %and.merge
    /// and.rhs:    %r = ... ; br label %and.merge
    /// and.merge:  %and = phi i1 [ false, %origin ], [ %r, %rhs.exit ]
    /// ```
    fn lower_short_circuit(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> Lowered {
        let is_and = op == BinaryOp::And;
        let prefix = if is_and { "and" } else { "or" };
        let l = self.lower_bool_operand(op, left)?;
        let origin = self.builder.current_block()?;

        let rhs_bb = self.builder.append_block(&format!("{prefix}.rhs"));
        let merge_bb = self.builder.append_block(&format!("{prefix}.merge"));
        if is_and {
            self.builder.cond_br(l, rhs_bb, merge_bb);
        } else {
            self.builder.cond_br(l, merge_bb, rhs_bb);
        }

        self.builder.position_at_end(rhs_bb);
        let r = self.lower_bool_operand(op, right);
        let rhs_exit = self.builder.current_block().unwrap_or(rhs_bb);
        if !self.builder.current_block_terminated() {
            self.builder.br(merge_bb);
        }

        self.builder.position_at_end(merge_bb);
        let r = r?;
        let short = self.builder.const_bool(!is_and);
        let value = self
            .builder
            .phi_from_incoming(IrType::I1, &[(short, origin), (r, rhs_exit)], prefix);
        Some(Typed {
            value,
            ty: Type::Bool,
        })
    }

    fn lower_bool_operand(&mut self, op: BinaryOp, id: ExprId) -> Option<ValueId> {
        let v = self.lower_expr(id, Some(&Type::Bool))?;
        if v.ty == Type::Bool {
            return Some(v.value);
        }
        let span = self.arena.expr_span(id);
        let found = self.show(&v.ty);
        let context = format!("operand of `{}`", op.as_symbol());
        self.report(type_mismatch(span, "bool", &found, &context));
        None
    }
}

#[cfg(test)]
mod tests;
