//! Reso Eval - reference interpreter for Reso low-level IR.
//!
//! Runs a [`reso_llir::Module`] directly, without a native backend. Used to
//! observe the runtime behavior of lowered programs: exit codes, arithmetic
//! results, vector growth and the bounds-check trap.
//!
//! # Model
//!
//! - Integers are kept as zero-extended `u64` masked to their IR width and
//!   reinterpreted as signed by the instructions that need it.
//! - Memory is a table of byte allocations. A pointer is
//!   `allocation << 32 | offset`; allocation 0 is `null`. Only 64-bit
//!   modules are supported.
//! - `GC_malloc` and `GC_malloc_atomic` return zeroed allocations that are
//!   never freed. Stack slots are released when their function returns.
//! - Execution is bounded by fuel (one unit per instruction) and call depth.

#![allow(
    // IR integers are raw u64 bits reinterpreted at their declared width
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    // int-to-float conversions mirror the IR instruction semantics
    clippy::cast_precision_loss,
    reason = "interpreter models fixed-width machine arithmetic"
)]

mod error;
mod host;
mod interp;
mod memory;
mod value;

pub use error::{EvalError, EvalResult};
pub use interp::{EvalConfig, Interpreter};
pub use value::Val;
