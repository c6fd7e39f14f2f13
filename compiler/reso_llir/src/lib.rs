//! Low-level IR for Reso.
//!
//! The lowering engine produces a [`Module`] of functions made of basic
//! blocks. The shape follows LLVM IR closely so the native backend can map
//! it one-to-one:
//!
//! - **[`Module`]**: struct types, string globals, extern declarations, functions
//! - **[`Function`]**: parameters, a value table, blocks
//! - **[`Block`]**: sequential instructions plus exactly one [`Terminator`]
//! - **[`InstKind`]**: a single instruction; phi nodes come first in a block
//!
//! Callers never touch the tables directly while building; they go through
//! the ID-based [`IrBuilder`], which hands out `Copy` handles (`ValueId`,
//! `BlockId`, `FuncId`, ...).
//!
//! # Method Organization
//!
//! | Category | Methods |
//! |----------|---------|
//! | Constants | `const_int`, `const_bool`, `const_usize`, `const_float`, `const_null`, `global_string` |
//! | Memory | `alloca`, `create_entry_alloca`, `load`, `store`, `ptr_add`, `struct_gep`, `memcpy`, `memmove` |
//! | Arithmetic | `add`, `sub`, `mul`, `sdiv`, `udiv`, `srem`, `urem`, `fadd`, `frem`, `fneg`, ... |
//! | Comparisons | `icmp`, `fcmp` |
//! | Conversions | `cast`, `trunc`, `sext`, `zext`, `int_resize` |
//! | Control flow | `br`, `cond_br`, `select`, `ret`, `ret_void`, `unreachable` |
//! | Calls / phi | `call`, `call_extern`, `phi_from_incoming` |
//! | Blocks | `append_block`, `position_at_end`, `current_block`, `current_block_terminated` |

mod builder;
mod ids;
mod instr;
mod module;
mod printer;
mod types;
mod verify;

pub use builder::IrBuilder;
pub use ids::{BlockId, ExternId, FuncId, GlobalId, StructId, ValueId};
pub use instr::{BinOp, Callee, CastOp, FCmpPred, ICmpPred, Inst, InstKind, Terminator};
pub use module::{Block, ExternDecl, Function, Global, Module, ValueData, ValueKind};
pub use types::{IrType, StructType};
pub use verify::{verify_function, verify_module, VerifyError};
