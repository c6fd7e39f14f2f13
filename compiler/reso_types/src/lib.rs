//! Type model for Reso.
//!
//! - `Type`: the closed set of Reso types (primitives, references, `null`)
//! - `TypeFlags`: pre-computed classification bits used for operator dispatch
//! - `LitType` / `bind_literal`: unconstrained literal binding
//! - `classify_cast` / `assignable`: explicit and implicit conversion rules
//! - `TargetLayout`: sizes and pointer width of the compilation target
//!
//! The model is deliberately strict: no implicit widening between numeric
//! types of different signedness or width. Every relation here is a pure
//! function of its inputs, so the lowering engine can call them freely.

mod conversion;
mod flags;
mod layout;
mod literal;
mod ty;

pub use conversion::{assignable, classify_cast, CastError, CastKind};
pub use flags::TypeFlags;
pub use layout::TargetLayout;
pub use literal::{bind_literal, unify_literals, BindError, LitKind, LitType};
pub use ty::{FloatWidth, IntWidth, Type, TypeDisplay};
