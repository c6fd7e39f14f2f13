//! Reso Lower - lowering from the Reso syntax tree to low-level IR.
//!
//! Takes a parsed, name-resolved [`Program`] and produces a
//! [`reso_llir::Module`]: one IR function per source function or method,
//! plus a C `main` wrapper around the entry point.
//!
//! # Pipeline
//!
//! ```text
//! Program ──collect──▶ ProgramTables ──per function──▶ Lowerer ──▶ Module
//!                      (structs, signatures)           (IrBuilder)
//! ```
//!
//! Type checking happens during lowering. Every problem is reported into
//! one diagnostic list and lowering carries on with the next statement, so
//! a single run reports all errors of the program. Warnings (unreachable
//! statements) do not fail the run.
//!
//! # Example
//!
//! ```
//! use reso_ir::{StringInterner, SyntaxBuilder};
//! use reso_lower::{lower_program, LowerConfig};
//!
//! let interner = StringInterner::new();
//! let mut b = SyntaxBuilder::new(&interner);
//! let forty_two = b.int(42);
//! let ret = b.ret_value(forty_two);
//! b.function("main", &[], "i32", vec![ret]);
//! let program = b.finish();
//!
//! let output = lower_program(&program, &interner, &LowerConfig::default());
//! assert!(!output.has_errors());
//! ```

#![allow(
    // IR constants are raw u64 bits; folded literals are range-checked i128
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "literal folding works on i128 and reinterprets at the bound width"
)]

mod alloc;
mod config;
mod lower;

#[cfg(test)]
mod test_helpers;

use std::fmt;

use reso_diagnostic::{Diagnostic, DiagnosticQueue, ErrorGuaranteed};
use reso_ir::{Program, StringInterner};
use reso_llir::Module;
use tracing::debug;

pub use alloc::{AllocKind, GcAllocator, HeapAllocator};
pub use config::LowerConfig;
pub use lower::reachability::reachable_blocks;

/// Result of lowering a program: the module and every diagnostic.
///
/// The module is always produced. When errors were reported it contains
/// the functions that lowered cleanly, with failed regions sealed, and
/// must not be run.
#[derive(Debug)]
pub struct LowerOutput {
    pub module: Module,
    /// Errors and warnings, ordered by source position.
    pub diagnostics: Vec<Diagnostic>,
}

impl LowerOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// The module and its warnings, or every diagnostic if any is an error.
    pub fn into_result(self) -> Result<(Module, Vec<Diagnostic>), LowerFailure> {
        let error_count = self.errors().count();
        match ErrorGuaranteed::from_error_count(error_count) {
            Some(guarantee) => Err(LowerFailure {
                diagnostics: self.diagnostics,
                guarantee,
            }),
            None => Ok((self.module, self.diagnostics)),
        }
    }
}

/// Lowering reported at least one error.
#[derive(Debug)]
pub struct LowerFailure {
    pub diagnostics: Vec<Diagnostic>,
    pub guarantee: ErrorGuaranteed,
}

impl LowerFailure {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

impl fmt::Display for LowerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.error_count();
        let plural = if count == 1 { "" } else { "s" };
        write!(f, "lowering failed with {count} error{plural}")?;
        for diag in self.diagnostics.iter().filter(|d| d.is_error()) {
            write!(f, "\n{diag}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LowerFailure {}

/// Lower `program` with the garbage-collected allocator.
pub fn lower_program(program: &Program, interner: &StringInterner, config: &LowerConfig) -> LowerOutput {
    lower_program_with(program, interner, config, &GcAllocator)
}

/// Lower `program`, emitting heap allocations through `alloc`.
pub fn lower_program_with(
    program: &Program,
    interner: &StringInterner,
    config: &LowerConfig,
    alloc: &dyn HeapAllocator,
) -> LowerOutput {
    let mut diags = DiagnosticQueue::new();
    let module = lower::lower_program(program, interner, config, alloc, &mut diags);
    debug!(
        module = %module.name,
        errors = diags.error_count(),
        warnings = diags.warning_count(),
        "lowering finished"
    );
    LowerOutput {
        module,
        diagnostics: diags.flush(),
    }
}
