//! Pre-computed type classification flags.
//!
//! Operator lowering dispatches on these instead of matching the full
//! `Type` enum at every call site.

use bitflags::bitflags;

bitflags! {
    /// Classification bits for a [`Type`](crate::Type).
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u16 {
        // === Category Flags ===

        /// Signed or unsigned integer.
        const INTEGER = 1 << 0;
        /// Floating point.
        const FLOAT = 1 << 1;
        const BOOL = 1 << 2;
        const CHAR = 1 << 3;
        const UNIT = 1 << 4;
        /// Pointer at runtime: strings, aggregates, vectors, `null`.
        const REFERENCE = 1 << 5;
        /// May hold `null`.
        const NULLABLE = 1 << 6;
        /// The `null` literal itself.
        const NULL = 1 << 7;

        // === Capability Flags ===

        /// Has a sign; signed integers and floats.
        const SIGNED = 1 << 8;
        /// Supports `==` / `!=`.
        const EQUATABLE = 1 << 9;
        /// Supports `<`, `<=`, `>`, `>=`.
        const ORDERED = 1 << 10;
        /// Accepted by `as` on both sides of a numeric conversion.
        const CONVERTIBLE = 1 << 11;

        /// Integers and floats: equatable, ordered, convertible.
        const NUMERIC_ORDERED = Self::EQUATABLE.bits()
            | Self::ORDERED.bits()
            | Self::CONVERTIBLE.bits();
    }
}

impl TypeFlags {
    #[inline]
    pub const fn is_numeric(self) -> bool {
        self.intersects(Self::INTEGER.union(Self::FLOAT))
    }

    #[inline]
    pub const fn is_convertible(self) -> bool {
        self.intersects(Self::CONVERTIBLE.union(Self::CHAR))
    }
}

impl Default for TypeFlags {
    fn default() -> Self {
        Self::empty()
    }
}
