//! Reso IR - syntax tree types consumed by the lowering engine.
//!
//! This crate contains the core input data structures for the Reso compiler:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Operators
//! - The flat, arena-allocated syntax tree (`Program`, `SyntaxArena`)
//! - A programmatic tree builder (`SyntaxBuilder`) for the parser and tests
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers are `Name(u32)`
//! - **Flatten Everything**: no `Box<Expr>`, nodes refer to each other by
//!   `ExprId(u32)` / `StmtId(u32)` indices and list ranges
//! - Every node kind is `Copy`, so lowering can match on `*arena.expr_kind(id)`
//!   without borrowing the arena across recursive calls.
//!
//! Types that contain floats store them as `u64` bits for `Hash` compatibility.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod builder;
mod interner;
mod name;
mod operators;
mod span;

pub use ast::{
    Expr, ExprId, ExprKind, ExprRange, FieldDef, FieldInit, FieldInitRange, FunctionDef,
    IfClause, IfClauseRange, Param, ParsedType, ParsedTypeId, Program, Receiver, Stmt, StmtId,
    StmtKind, StmtRange, StructDef, SyntaxArena,
};
pub use builder::SyntaxBuilder;
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use operators::{BinaryOp, UnaryOp};
pub use span::Span;
