//! Literal classification and constant folding.
//!
//! An expression built only from numeric literals, unary `+`/`-` and
//! arithmetic or bitwise operators is an *unconstrained literal*: its type
//! comes from context. Once the type is known the whole expression folds to
//! one constant and no instruction is emitted. A comparison of two literal
//! expressions folds to a `bool` constant the same way.

use std::cmp::Ordering;

use reso_ir::{BinaryOp, ExprId, ExprKind, SyntaxArena, UnaryOp};
use reso_types::{unify_literals, LitKind, TargetLayout, Type};

/// A folded constant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Const {
    Int(i128),
    Float(f64),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FoldErrorKind {
    /// A literal or intermediate result does not fit the bound type.
    OutOfRange(i128),
    DivisionByZero(BinaryOp),
    /// Shift amount negative or not below the bit width.
    ShiftAmount(i128),
    /// Bitwise operator on a float constant.
    NotInteger(BinaryOp),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct FoldError {
    pub kind: FoldErrorKind,
    /// The node whose value failed.
    pub expr: ExprId,
}

/// Literal kind of `id` if it is an unconstrained literal expression.
///
/// Integer kinds carry the literal value for range checks; for folded
/// operator nodes the value is a placeholder and the fold checks ranges.
pub(crate) fn literal_kind(arena: &SyntaxArena, id: ExprId) -> Option<LitKind> {
    match *arena.expr_kind(id) {
        ExprKind::Int(value) => Some(LitKind::Int(i128::from(value))),
        ExprKind::Float(_) => Some(LitKind::Float),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match literal_kind(arena, operand)? {
            LitKind::Int(value) => Some(LitKind::Int(-value)),
            LitKind::Float => Some(LitKind::Float),
        },
        ExprKind::Unary {
            op: UnaryOp::Plus,
            operand,
        } => literal_kind(arena, operand),
        ExprKind::Binary { op, left, right } if op.is_arithmetic() || op.is_bitwise() => {
            let unified = unify_literals(literal_kind(arena, left)?, literal_kind(arena, right)?)?;
            Some(match unified {
                LitKind::Int(_) => LitKind::Int(0),
                LitKind::Float => LitKind::Float,
            })
        }
        _ => None,
    }
}

/// Inclusive value range of an integer type.
pub(crate) fn int_range(ty: &Type, layout: TargetLayout) -> Option<(i128, i128)> {
    match ty {
        Type::Signed(w) => {
            let bits = layout.int_bits(*w);
            Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1))
        }
        Type::Unsigned(w) => Some((0, (1i128 << layout.int_bits(*w)) - 1)),
        _ => None,
    }
}

/// Evaluate the literal expression `id` at type `ty`.
pub(crate) fn eval_const(
    arena: &SyntaxArena,
    id: ExprId,
    ty: &Type,
    layout: TargetLayout,
) -> Result<Const, FoldError> {
    let fail = |kind| FoldError { kind, expr: id };
    let value = match *arena.expr_kind(id) {
        ExprKind::Int(value) => int_leaf(i128::from(value), ty),
        ExprKind::Float(bits) => Const::Float(f64::from_bits(bits)),
        ExprKind::Unary { op, operand } => match (op, *arena.expr_kind(operand)) {
            // `-128` is a single literal; the range check sees the negated value.
            (UnaryOp::Neg, ExprKind::Int(value)) => int_leaf(-i128::from(value), ty),
            _ => match (op, eval_const(arena, operand, ty, layout)?) {
                (UnaryOp::Neg, Const::Int(v)) => Const::Int(-v),
                (UnaryOp::Neg, Const::Float(v)) => Const::Float(-v),
                (_, value) => value,
            },
        },
        ExprKind::Binary { op, left, right } => {
            let l = eval_const(arena, left, ty, layout)?;
            let r = eval_const(arena, right, ty, layout)?;
            fold_binary(op, l, r, ty, layout).map_err(fail)?
        }
        _ => return Err(fail(FoldErrorKind::OutOfRange(0))),
    };
    check(value, ty, layout).map_err(fail)
}

fn int_leaf(value: i128, ty: &Type) -> Const {
    if ty.is_float() {
        Const::Float(value as f64)
    } else {
        Const::Int(value)
    }
}

fn check(value: Const, ty: &Type, layout: TargetLayout) -> Result<Const, FoldErrorKind> {
    match value {
        Const::Int(v) => match int_range(ty, layout) {
            Some((min, max)) if v < min || v > max => Err(FoldErrorKind::OutOfRange(v)),
            _ => Ok(value),
        },
        Const::Float(v) if *ty == Type::F32 => Ok(Const::Float(f64::from(v as f32))),
        Const::Float(_) => Ok(value),
    }
}

/// Fold one operator application at type `ty`.
pub(crate) fn fold_binary(
    op: BinaryOp,
    l: Const,
    r: Const,
    ty: &Type,
    layout: TargetLayout,
) -> Result<Const, FoldErrorKind> {
    match (l, r) {
        (Const::Int(a), Const::Int(b)) => fold_int(op, a, b, ty, layout).map(Const::Int),
        (Const::Float(a), Const::Float(b)) => fold_float(op, a, b).map(Const::Float),
        _ => Err(FoldErrorKind::NotInteger(op)),
    }
}

/// Evaluate a comparison of two folded constants of one type.
///
/// Float predicates are ordered except `!=`, which holds for NaN like the
/// emitted `une` compare.
pub(crate) fn compare(op: BinaryOp, l: Const, r: Const) -> bool {
    let ordering = match (l, r) {
        (Const::Int(a), Const::Int(b)) => Some(a.cmp(&b)),
        (Const::Float(a), Const::Float(b)) => a.partial_cmp(&b),
        _ => None,
    };
    match op {
        BinaryOp::Eq => ordering == Some(Ordering::Equal),
        BinaryOp::NotEq => ordering != Some(Ordering::Equal),
        BinaryOp::Lt => ordering == Some(Ordering::Less),
        BinaryOp::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => ordering == Some(Ordering::Greater),
        BinaryOp::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => false,
    }
}

fn fold_int(
    op: BinaryOp,
    a: i128,
    b: i128,
    ty: &Type,
    layout: TargetLayout,
) -> Result<i128, FoldErrorKind> {
    let overflow = FoldErrorKind::OutOfRange(i128::MAX);
    let bits = ty.int_width().map_or(64, |w| layout.int_bits(w));
    Ok(match op {
        BinaryOp::Add => a.checked_add(b).ok_or(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or(overflow)?,
        BinaryOp::Div | BinaryOp::Rem | BinaryOp::Mod if b == 0 => {
            return Err(FoldErrorKind::DivisionByZero(op));
        }
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Mod => {
            let rem = a % b;
            if rem != 0 && (rem < 0) != (b < 0) {
                rem + b
            } else {
                rem
            }
        }
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Shl | BinaryOp::Shr if b < 0 || b >= i128::from(bits) => {
            return Err(FoldErrorKind::ShiftAmount(b));
        }
        // Shifting left wraps at the type's width like the runtime instruction.
        BinaryOp::Shl => wrap(a << b, bits, ty.is_signed_int()),
        BinaryOp::Shr => a >> b,
        _ => return Err(FoldErrorKind::NotInteger(op)),
    })
}

fn wrap(value: i128, bits: u32, signed: bool) -> i128 {
    let masked = value & ((1i128 << bits) - 1);
    if signed && masked >= 1i128 << (bits - 1) {
        masked - (1i128 << bits)
    } else {
        masked
    }
}

fn fold_float(op: BinaryOp, a: f64, b: f64) -> Result<f64, FoldErrorKind> {
    Ok(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Mod => {
            let rem = a % b;
            if rem != 0.0 && (rem < 0.0) != (b < 0.0) {
                rem + b
            } else {
                rem
            }
        }
        _ => return Err(FoldErrorKind::NotInteger(op)),
    })
}
