//! Diagnostic queue for collecting and ordering diagnostics.
//!
//! Lowering never stops at the first problem: every function is lowered and
//! every diagnostic lands here. Errors are counted separately from warnings,
//! and a diagnostic identical in code, primary span and message to one
//! already queued is dropped. Distinct problems at one node are all kept.

use rustc_hash::FxHashSet;

use reso_ir::Span;

use crate::{Diagnostic, ErrorCode};

#[derive(Default, Debug)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    seen: FxHashSet<(ErrorCode, Option<Span>, String)>,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `diag`. Returns `false` if an identical diagnostic is queued.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        let key = (diag.code, diag.primary_span(), diag.message.clone());
        if !self.seen.insert(key) {
            return false;
        }
        if diag.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
        true
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Return all diagnostics ordered by primary span, clearing the queue.
    ///
    /// The sort is stable, so diagnostics at the same position keep their
    /// emission order.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        let mut out = std::mem::take(&mut self.diagnostics);
        out.sort_by_key(|d| d.primary_span().map_or(u32::MAX, |s| s.start));
        self.error_count = 0;
        self.seen.clear();
        out
    }
}
