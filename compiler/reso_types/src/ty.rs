//! The `Type` enum and its widths.

use std::fmt;

use reso_ir::{Name, StringInterner};

use crate::TypeFlags;

/// Integer width. `Ptr` is the target's pointer width (`isize` / `usize`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    Ptr,
}

impl IntWidth {
    /// Width in bits for a target with `pointer_bits`-wide pointers.
    #[inline]
    pub const fn bits(self, pointer_bits: u32) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::Ptr => pointer_bits,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            FloatWidth::F32 => 32,
            FloatWidth::F64 => 64,
        }
    }
}

/// A Reso type.
///
/// `Aggregate` and `Array` are nullable references; `Null` is the type of
/// the `null` literal and is only ever the type of that literal.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    Signed(IntWidth),
    Unsigned(IntWidth),
    Float(FloatWidth),
    Bool,
    /// 32-bit code point.
    Char,
    Unit,
    String,
    /// User-defined record, by name.
    Aggregate(Name),
    /// Built-in `Vector<T>`.
    Array(Box<Type>),
    Null,
}

impl Type {
    pub const I8: Type = Type::Signed(IntWidth::W8);
    pub const I16: Type = Type::Signed(IntWidth::W16);
    pub const I32: Type = Type::Signed(IntWidth::W32);
    pub const I64: Type = Type::Signed(IntWidth::W64);
    pub const ISIZE: Type = Type::Signed(IntWidth::Ptr);
    pub const U8: Type = Type::Unsigned(IntWidth::W8);
    pub const U16: Type = Type::Unsigned(IntWidth::W16);
    pub const U32: Type = Type::Unsigned(IntWidth::W32);
    pub const U64: Type = Type::Unsigned(IntWidth::W64);
    pub const USIZE: Type = Type::Unsigned(IntWidth::Ptr);
    pub const F32: Type = Type::Float(FloatWidth::F32);
    pub const F64: Type = Type::Float(FloatWidth::F64);

    /// Vector of `elem`.
    pub fn vector(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    /// Look up a built-in type by its source name.
    pub fn primitive(name: &str) -> Option<Type> {
        Some(match name {
            "i8" => Type::I8,
            "i16" => Type::I16,
            "i32" => Type::I32,
            "i64" => Type::I64,
            "isize" => Type::ISIZE,
            "u8" => Type::U8,
            "u16" => Type::U16,
            "u32" => Type::U32,
            "u64" => Type::U64,
            "usize" => Type::USIZE,
            "f32" => Type::F32,
            "f64" => Type::F64,
            "bool" => Type::Bool,
            "char" => Type::Char,
            "String" => Type::String,
            _ => return None,
        })
    }

    /// Compute classification flags.
    pub fn flags(&self) -> TypeFlags {
        match self {
            Type::Signed(_) => TypeFlags::INTEGER | TypeFlags::SIGNED | TypeFlags::NUMERIC_ORDERED,
            Type::Unsigned(_) => TypeFlags::INTEGER | TypeFlags::NUMERIC_ORDERED,
            Type::Float(_) => TypeFlags::FLOAT | TypeFlags::SIGNED | TypeFlags::NUMERIC_ORDERED,
            Type::Bool => TypeFlags::BOOL | TypeFlags::EQUATABLE,
            Type::Char => TypeFlags::CHAR | TypeFlags::EQUATABLE | TypeFlags::ORDERED,
            Type::Unit => TypeFlags::UNIT,
            Type::String => TypeFlags::REFERENCE | TypeFlags::EQUATABLE,
            Type::Aggregate(_) | Type::Array(_) => {
                TypeFlags::REFERENCE | TypeFlags::NULLABLE | TypeFlags::EQUATABLE
            }
            Type::Null => TypeFlags::REFERENCE | TypeFlags::NULL | TypeFlags::EQUATABLE,
        }
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Signed(_) | Type::Unsigned(_))
    }

    #[inline]
    pub fn is_signed_int(&self) -> bool {
        matches!(self, Type::Signed(_))
    }

    #[inline]
    pub fn is_unsigned_int(&self) -> bool {
        matches!(self, Type::Unsigned(_))
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    #[inline]
    pub fn is_unit(&self) -> bool {
        matches!(self, Type::Unit)
    }

    /// Heap references that `null` may stand in for.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Aggregate(_) | Type::Array(_))
    }

    /// Represented as a pointer at runtime.
    #[inline]
    pub fn is_reference(&self) -> bool {
        self.flags().contains(TypeFlags::REFERENCE)
    }

    /// Element type of a vector.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Integer width, if this is an integer.
    pub fn int_width(&self) -> Option<IntWidth> {
        match self {
            Type::Signed(w) | Type::Unsigned(w) => Some(*w),
            _ => None,
        }
    }

    /// Render with aggregate names resolved through `interner`.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> TypeDisplay<'a> {
        TypeDisplay { ty: self, interner }
    }
}

/// `Display` adapter returned by [`Type::display`].
pub struct TypeDisplay<'a> {
    ty: &'a Type,
    interner: &'a StringInterner,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Type::Signed(w) => match w {
                IntWidth::Ptr => f.write_str("isize"),
                _ => write!(f, "i{}", w.bits(64)),
            },
            Type::Unsigned(w) => match w {
                IntWidth::Ptr => f.write_str("usize"),
                _ => write!(f, "u{}", w.bits(64)),
            },
            Type::Float(w) => write!(f, "f{}", w.bits()),
            Type::Bool => f.write_str("bool"),
            Type::Char => f.write_str("char"),
            Type::Unit => f.write_str("()"),
            Type::String => f.write_str("String"),
            Type::Aggregate(name) => f.write_str(self.interner.lookup(*name)),
            Type::Array(elem) => write!(f, "Vector<{}>", elem.display(self.interner)),
            Type::Null => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests;
