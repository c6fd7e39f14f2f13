//! Opaque ID newtypes.
//!
//! Each ID is a `u32` index into the corresponding table of a [`Module`]
//! or [`Function`]. Value and block IDs are local to one function.
//!
//! [`Module`]: crate::Module
//! [`Function`]: crate::Function

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// The raw index.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[expect(
                clippy::cast_possible_truncation,
                reason = "IR tables never exceed u32 entries"
            )]
            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a value (constant, parameter or instruction result).
    ValueId,
    "v"
);
define_id!(
    /// Handle to a basic block. Block 0 is the entry block.
    BlockId,
    "bb"
);
define_id!(
    /// Handle to a defined function.
    FuncId,
    "fn"
);
define_id!(
    /// Handle to an external function declaration.
    ExternId,
    "ext"
);
define_id!(
    /// Handle to a named struct type.
    StructId,
    "struct"
);
define_id!(
    /// Handle to a private constant global.
    GlobalId,
    "global"
);

impl BlockId {
    /// The entry block of every function.
    pub const ENTRY: BlockId = BlockId(0);
}
