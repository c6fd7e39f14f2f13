//! Runtime values.

use crate::{EvalError, EvalResult};

/// A register value.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Val {
    /// Integer (and `i1`) bits, zero-extended and masked to the value's width.
    Int(u64),
    /// Float; `f32` values are kept rounded to `f32` precision.
    Float(f64),
    Ptr(u64),
}

impl Val {
    pub const NULL: Val = Val::Ptr(0);

    /// Integer value of `bits` width from a signed host integer.
    pub fn from_i64(value: i64, bits: u32) -> Val {
        Val::Int(mask(value as u64, bits))
    }

    pub fn bool(value: bool) -> Val {
        Val::Int(u64::from(value))
    }

    pub fn as_int(self) -> EvalResult<u64> {
        match self {
            Val::Int(bits) => Ok(bits),
            other => Err(EvalError::malformed(format!("expected integer, found {other:?}"))),
        }
    }

    /// Integer value interpreted as two's complement of `bits` width.
    pub fn as_signed(self, bits: u32) -> EvalResult<i64> {
        self.as_int().map(|raw| sign_extend(raw, bits))
    }

    pub fn as_float(self) -> EvalResult<f64> {
        match self {
            Val::Float(value) => Ok(value),
            other => Err(EvalError::malformed(format!("expected float, found {other:?}"))),
        }
    }

    pub fn as_ptr(self) -> EvalResult<u64> {
        match self {
            Val::Ptr(addr) => Ok(addr),
            other => Err(EvalError::malformed(format!("expected pointer, found {other:?}"))),
        }
    }

    pub fn as_bool(self) -> EvalResult<bool> {
        self.as_int().map(|raw| raw & 1 == 1)
    }
}

/// Keep the low `bits` bits of `value`.
#[inline]
pub(crate) fn mask(value: u64, bits: u32) -> u64 {
    if bits >= 64 {
        value
    } else {
        value & ((1u64 << bits) - 1)
    }
}

/// Interpret the low `bits` bits of `raw` as two's complement.
#[inline]
pub(crate) fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits >= 64 {
        raw as i64
    } else {
        let shift = 64 - bits;
        ((raw << shift) as i64) >> shift
    }
}
