//! Error codes for all compile-time diagnostics.
//!
//! Each code is a unique identifier (e.g. `E2001`) whose first digit is the
//! phase. Tests match on codes rather than message text.

use std::fmt;

/// Error codes for all diagnostics.
///
/// E2xxx codes are type, scope and coverage errors found during lowering.
/// Warnings use the W prefix.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Type and scope errors (E20xx)
    /// Type mismatch
    E2001,
    /// Unknown type name
    E2002,
    /// Name is not defined
    E2003,
    /// Wrong number of arguments
    E2004,
    /// Invalid assignment target
    E2005,
    /// Name already defined in this scope
    E2006,

    // Operator errors (E202x)
    /// Cannot perform operator on the given types
    E2020,
    /// Arithmetic on non-numeric types
    E2021,
    /// Cannot compare the given types
    E2022,
    /// Ordering comparison on a type that only supports equality
    E2023,
    /// Unary operator applied to the wrong kind of operand
    E2024,
    /// Invalid `as` conversion
    E2025,
    /// Literal cannot take the required type
    E2026,
    /// `null` used where the type is not nullable
    E2027,

    // Control-flow errors (E203x)
    /// Function must return a value on every path
    E2030,
    /// `break` / `continue` outside a loop
    E2031,
    /// Unknown field or method
    E2032,
    /// Constant division by zero
    E2033,

    // Warnings (Wxxxx)
    /// Unreachable code
    W2001,
}

impl ErrorCode {
    #[cfg(test)]
    pub(crate) const ALL: &[ErrorCode] = &[
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2020,
        ErrorCode::E2021,
        ErrorCode::E2022,
        ErrorCode::E2023,
        ErrorCode::E2024,
        ErrorCode::E2025,
        ErrorCode::E2026,
        ErrorCode::E2027,
        ErrorCode::E2030,
        ErrorCode::E2031,
        ErrorCode::E2032,
        ErrorCode::E2033,
        ErrorCode::W2001,
    ];

    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2020 => "E2020",
            ErrorCode::E2021 => "E2021",
            ErrorCode::E2022 => "E2022",
            ErrorCode::E2023 => "E2023",
            ErrorCode::E2024 => "E2024",
            ErrorCode::E2025 => "E2025",
            ErrorCode::E2026 => "E2026",
            ErrorCode::E2027 => "E2027",
            ErrorCode::E2030 => "E2030",
            ErrorCode::E2031 => "E2031",
            ErrorCode::E2032 => "E2032",
            ErrorCode::E2033 => "E2033",
            ErrorCode::W2001 => "W2001",
        }
    }

    /// Check if this is a warning code (Wxxxx range).
    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W2001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
