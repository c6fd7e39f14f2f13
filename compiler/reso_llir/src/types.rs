//! IR types and struct layout.

use crate::StructId;

/// A first-class IR type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IrType {
    I1,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Opaque pointer.
    Ptr,
    /// No value; only valid as a return type.
    Void,
    Struct(StructId),
}

impl IrType {
    /// Integer type of exactly `bits` bits.
    pub fn int(bits: u32) -> Option<IrType> {
        Some(match bits {
            1 => IrType::I1,
            8 => IrType::I8,
            16 => IrType::I16,
            32 => IrType::I32,
            64 => IrType::I64,
            _ => return None,
        })
    }

    /// Bit width of an integer type.
    pub fn int_bits(self) -> Option<u32> {
        match self {
            IrType::I1 => Some(1),
            IrType::I8 => Some(8),
            IrType::I16 => Some(16),
            IrType::I32 => Some(32),
            IrType::I64 => Some(64),
            _ => None,
        }
    }

    #[inline]
    pub fn is_int(self) -> bool {
        self.int_bits().is_some()
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, IrType::F32 | IrType::F64)
    }

    #[inline]
    pub fn is_ptr(self) -> bool {
        matches!(self, IrType::Ptr)
    }
}

/// Named struct type with natural (C) layout.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<IrType>,
}
