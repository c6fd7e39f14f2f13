//! Explicit (`as`) and implicit (assignment) conversion rules.

use crate::{TargetLayout, Type};

/// The machine operation an `as` conversion needs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CastKind {
    /// Same representation; no instruction.
    Identity,
    /// Integer widening. `signed` is the source signedness.
    IntExtend { signed: bool },
    IntTruncate,
    /// `signed` is the source signedness.
    IntToFloat { signed: bool },
    /// `signed` is the target signedness.
    FloatToInt { signed: bool },
    FloatExtend,
    FloatTruncate,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CastError {
    /// One side is bool, string, unit, aggregate or vector.
    NotConvertible,
}

/// Classify `from as to`.
///
/// `char` behaves as an unsigned 32-bit integer and converts only to and
/// from integer types.
pub fn classify_cast(from: &Type, to: &Type, layout: TargetLayout) -> Result<CastKind, CastError> {
    if from == to {
        return Ok(CastKind::Identity);
    }
    if !from.flags().is_convertible() || !to.flags().is_convertible() {
        return Err(CastError::NotConvertible);
    }

    let int_bits = |ty: &Type| -> Option<(u32, bool)> {
        match ty {
            Type::Signed(w) => Some((layout.int_bits(*w), true)),
            Type::Unsigned(w) => Some((layout.int_bits(*w), false)),
            Type::Char => Some((32, false)),
            _ => None,
        }
    };

    match (from, to) {
        (Type::Char, Type::Float(_)) | (Type::Float(_), Type::Char) => {
            Err(CastError::NotConvertible)
        }
        (Type::Float(a), Type::Float(b)) => Ok(if a.bits() < b.bits() {
            CastKind::FloatExtend
        } else {
            CastKind::FloatTruncate
        }),
        (Type::Float(_), _) => match int_bits(to) {
            Some((_, signed)) => Ok(CastKind::FloatToInt { signed }),
            None => Err(CastError::NotConvertible),
        },
        (_, Type::Float(_)) => match int_bits(from) {
            Some((_, signed)) => Ok(CastKind::IntToFloat { signed }),
            None => Err(CastError::NotConvertible),
        },
        _ => match (int_bits(from), int_bits(to)) {
            (Some((src, signed)), Some((dst, _))) => Ok(if src == dst {
                CastKind::Identity
            } else if src < dst {
                CastKind::IntExtend { signed }
            } else {
                CastKind::IntTruncate
            }),
            _ => Err(CastError::NotConvertible),
        },
    }
}

/// Whether a value of type `value` may be stored where `target` is expected
/// without `as`: identical types, or `null` into a nullable reference.
pub fn assignable(value: &Type, target: &Type) -> bool {
    value == target || (*value == Type::Null && target.is_nullable())
}

#[cfg(test)]
mod tests;
