//! Target data layout.

use crate::{IntWidth, Type};

/// Sizes the lowering engine needs from the compilation target.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct TargetLayout {
    /// Width of `isize` / `usize` and of every reference.
    pub pointer_bits: u32,
}

impl TargetLayout {
    pub const fn new(pointer_bits: u32) -> Self {
        TargetLayout { pointer_bits }
    }

    #[inline]
    pub const fn pointer_bytes(self) -> u64 {
        (self.pointer_bits / 8) as u64
    }

    /// Width of an integer type in bits.
    #[inline]
    pub const fn int_bits(self, width: IntWidth) -> u32 {
        width.bits(self.pointer_bits)
    }

    /// Storage size of a value of `ty` in bytes.
    ///
    /// References store only the pointer; `()` occupies nothing.
    pub fn size_of(self, ty: &Type) -> u64 {
        match ty {
            Type::Signed(w) | Type::Unsigned(w) => u64::from(self.int_bits(*w) / 8),
            Type::Float(w) => u64::from(w.bits() / 8),
            Type::Bool => 1,
            Type::Char => 4,
            Type::Unit => 0,
            Type::String | Type::Aggregate(_) | Type::Array(_) | Type::Null => {
                self.pointer_bytes()
            }
        }
    }

    /// Natural alignment; equal to the size for every scalar.
    pub fn align_of(self, ty: &Type) -> u64 {
        self.size_of(ty).max(1)
    }
}

impl Default for TargetLayout {
    fn default() -> Self {
        TargetLayout::new(64)
    }
}
