//! Diagnostic system for compile-time problems.
//!
//! Every problem the lowering engine finds becomes a [`Diagnostic`]:
//! - an error code for searchability
//! - a single-line message naming the operation and the concrete types
//! - a primary span
//! - optional notes
//!
//! # Error Guarantees
//!
//! `ErrorGuaranteed` is type-level proof that at least one error was
//! reported. It is only handed out for a nonzero error count, so a failure
//! carrying one always comes with diagnostics.

mod diagnostic;
mod error_code;
mod guarantee;
pub mod queue;

pub use diagnostic::{type_mismatch, unknown_identifier, Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::DiagnosticQueue;
