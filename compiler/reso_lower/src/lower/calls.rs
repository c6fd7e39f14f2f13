//! Direct calls and method dispatch.
//!
//! Arguments are evaluated left to right. Each one is bound against its
//! parameter type, so literals and `null` adapt; anything else must already
//! match.

use reso_diagnostic::unknown_identifier;
use reso_ir::{ExprId, ExprRange, Name, Span};
use reso_llir::ValueId;
use reso_types::Type;
use smallvec::SmallVec;

use super::errors;
use super::{FnSig, Lowered, Lowerer, Typed};

/// Lowered argument values, receiver first for methods.
type Args = SmallVec<[ValueId; 4]>;

impl Lowerer<'_> {
    // ── Free functions ─────────────────────────────────────────

    pub(crate) fn lower_call(&mut self, func: Name, args: ExprRange, span: Span) -> Lowered {
        let tables = self.tables;
        let name = self.text(func);
        let sig = tables
            .functions
            .get(&func)
            .filter(|sig| sig.receiver.is_none());
        let Some(sig) = sig else {
            if !tables.poisoned.contains(&func) {
                self.report(unknown_identifier(span, name));
            }
            self.lower_args_unchecked(args);
            return None;
        };

        let arena = self.arena;
        let arg_ids = arena.expr_list(args);
        if arg_ids.len() != sig.params.len() {
            self.report(errors::arg_count(span, "function", name, sig.params.len(), arg_ids.len()));
            self.lower_args_unchecked(args);
            return None;
        }
        let values = self.lower_args(name, &sig.params, arg_ids, Args::new())?;
        self.emit_call(sig, name, &values)
    }

    // ── Methods ────────────────────────────────────────────────

    pub(crate) fn lower_method_call(
        &mut self,
        receiver: ExprId,
        method: Name,
        args: ExprRange,
        span: Span,
    ) -> Lowered {
        let Some(recv) = self.lower_expr(receiver, None) else {
            self.lower_args_unchecked(args);
            return None;
        };
        if let Type::Array(elem) = &recv.ty {
            let elem = (**elem).clone();
            return self.lower_vector_method(recv, &elem, method, args, span);
        }

        let tables = self.tables;
        let method_text = self.text(method);
        let Some(symbol) = tables.methods.get(&(recv.ty.clone(), method)) else {
            let ty = self.show(&recv.ty);
            self.report(errors::unknown_method(span, method_text, &ty));
            self.lower_args_unchecked(args);
            return None;
        };
        let Some(sig) = tables.functions.get(symbol) else {
            self.lower_args_unchecked(args);
            return None;
        };

        let arena = self.arena;
        let arg_ids = arena.expr_list(args);
        if arg_ids.len() != sig.params.len() {
            self.report(errors::arg_count(
                span,
                "method",
                method_text,
                sig.params.len(),
                arg_ids.len(),
            ));
            self.lower_args_unchecked(args);
            return None;
        }
        let mut first = Args::new();
        first.push(recv.value);
        let values = self.lower_args(method_text, &sig.params, arg_ids, first)?;
        let symbol_text = self.text(*symbol);
        self.emit_call(sig, symbol_text, &values)
    }

    // ── Arguments ──────────────────────────────────────────────

    /// Lower `args` against `params`, appending to `values`. Every argument
    /// is lowered even after one fails, so each mistake is reported.
    fn lower_args(&mut self, callee: &str, params: &[Type], args: &[ExprId], mut values: Args) -> Option<Args> {
        let mut ok = true;
        for (position, (&arg, param)) in args.iter().zip(params).enumerate() {
            let span = self.arena.expr_span(arg);
            let context = format!("argument {} of `{callee}`", position + 1);
            match self
                .lower_expr(arg, Some(param))
                .and_then(|v| self.coerce(v, param, span, &context))
            {
                Some(v) => values.push(v.value),
                None => ok = false,
            }
        }
        ok.then_some(values)
    }

    /// Lower arguments of a call that cannot be made, for their diagnostics.
    pub(crate) fn lower_args_unchecked(&mut self, args: ExprRange) {
        let arena = self.arena;
        for &arg in arena.expr_list(args) {
            self.lower_expr(arg, None);
        }
    }

    /// Emit the call. A non-unit result is named after the callee.
    fn emit_call(&mut self, sig: &FnSig, name: &str, args: &[ValueId]) -> Lowered {
        match self.builder.call(sig.func, args, name) {
            Some(value) => Some(Typed {
                value,
                ty: sig.ret.clone(),
            }),
            None => self.unit(),
        }
    }
}
