//! Statement lowering: declarations, assignment, `if` chains and loops.
//!
//! Every `if` body, loop body and bare block gets its own scope frame.
//! Bodies branch to their join block only while the insertion point is
//! live; a body that already returned or broke leaves its block terminated.

use reso_diagnostic::{type_mismatch, unknown_identifier};
use reso_ir::{ExprId, ExprKind, IfClauseRange, Name, ParsedTypeId, Span, StmtId, StmtKind, StmtRange};
use reso_llir::{BlockId, ValueId};
use reso_stack::ensure_sufficient_stack;
use reso_types::Type;

use super::errors;
use super::scope::Binding;
use super::{Lowerer, LoopTargets};

impl Lowerer<'_> {
    // ── Statement lists ────────────────────────────────────────

    /// Lower `range` in order. Statements after an unconditional exit emit
    /// nothing; the first of each such run is reported once.
    pub(crate) fn lower_stmts(&mut self, range: StmtRange) {
        let arena = self.arena;
        for &stmt in arena.stmt_list(range) {
            if self.position_is_dead() {
                if !self.dead_reported {
                    let span = arena.stmt(stmt).span;
                    self.report(errors::unreachable_code(span));
                    self.dead_reported = true;
                }
                continue;
            }
            self.dead_reported = false;
            self.lower_stmt(stmt);
        }
    }

    /// Lower `range` inside a fresh scope frame.
    pub(crate) fn lower_block_scoped(&mut self, range: StmtRange) {
        self.scope.push();
        self.lower_stmts(range);
        self.scope.pop();
    }

    fn lower_stmt(&mut self, id: StmtId) {
        ensure_sufficient_stack(|| {
            let stmt = *self.arena.stmt(id);
            match stmt.kind {
                StmtKind::Var { name, ty, init } => self.lower_var(name, ty, init, stmt.span),
                StmtKind::Assign { target, value } => self.lower_assign(target, value, stmt.span),
                StmtKind::Expr(expr) => {
                    self.lower_expr(expr, None);
                }
                StmtKind::If { clauses, else_body } => self.lower_if(clauses, else_body),
                StmtKind::While { cond, body } => self.lower_while(cond, body),
                StmtKind::Return(value) => self.lower_return(value, stmt.span),
                StmtKind::Break => self.lower_loop_exit(stmt.span, "break"),
                StmtKind::Continue => self.lower_loop_exit(stmt.span, "continue"),
                StmtKind::Block(body) => self.lower_block_scoped(body),
            }
        });
    }

    // ── Declarations and assignment ────────────────────────────

    fn lower_var(&mut self, name: Name, ty: Option<ParsedTypeId>, init: ExprId, span: Span) {
        let text = self.text(name);
        let declared = match ty {
            Some(parsed) => match self.resolve(parsed, span) {
                Some(ty) => Some(ty),
                None => {
                    self.lower_expr(init, None);
                    self.bind_local(name, Binding::Poisoned, span);
                    return;
                }
            },
            None => None,
        };

        let init_span = self.arena.expr_span(init);
        let value = match &declared {
            Some(target) => {
                let context = format!("declaration of `{text}`");
                self.lower_expr(init, Some(target))
                    .and_then(|v| self.coerce(v, target, init_span, &context))
            }
            None => match self.lower_expr(init, None) {
                Some(v) if v.ty == Type::Null => {
                    let context = format!("declaration of `{text}`");
                    self.report(errors::null_needs_reference(init_span, &context));
                    None
                }
                other => other,
            },
        };

        let binding = match value {
            Some(v) => {
                let ir = self.ir(&v.ty);
                let slot = self.builder.create_entry_alloca(ir, text);
                self.builder.store(v.value, slot);
                Binding::Local { slot, ty: v.ty }
            }
            None => Binding::Poisoned,
        };
        self.bind_local(name, binding, span);
    }

    pub(crate) fn bind_local(&mut self, name: Name, binding: Binding, span: Span) {
        if self.scope.declare(name, binding).is_err() {
            let text = self.text(name);
            self.report(errors::already_defined(span, "variable", text));
        }
    }

    fn lower_assign(&mut self, target: ExprId, value: ExprId, span: Span) {
        match *self.arena.expr_kind(target) {
            ExprKind::Ident(name) => self.lower_local_assign(name, target, value),
            ExprKind::Field { receiver, field } => {
                self.lower_field_assign(receiver, field, value, span);
            }
            ExprKind::Index { receiver, index } => {
                self.lower_index_assign(receiver, index, value, span);
            }
            _ => {
                let target_span = self.arena.expr_span(target);
                self.report(errors::invalid_assign_target(target_span));
                self.lower_expr(value, None);
            }
        }
    }

    fn lower_local_assign(&mut self, name: Name, target: ExprId, value: ExprId) {
        let text = self.text(name);
        let (slot, ty) = match self.scope.lookup(name) {
            Some(Binding::Local { slot, ty }) => (*slot, ty.clone()),
            Some(Binding::Poisoned) => {
                self.lower_expr(value, None);
                return;
            }
            None => {
                let target_span = self.arena.expr_span(target);
                self.report(unknown_identifier(target_span, text));
                self.lower_expr(value, None);
                return;
            }
        };
        let value_span = self.arena.expr_span(value);
        let context = format!("assignment to `{text}`");
        if let Some(v) = self
            .lower_expr(value, Some(&ty))
            .and_then(|v| self.coerce(v, &ty, value_span, &context))
        {
            self.builder.store(v.value, slot);
        }
    }

    // ── Branching ──────────────────────────────────────────────

    /// A `bool` condition value. A poisoned or mistyped condition lowers as
    /// `false` so the surrounding blocks keep their shape.
    fn lower_condition(&mut self, cond: ExprId, what: &str) -> ValueId {
        match self.lower_expr(cond, Some(&Type::Bool)) {
            Some(v) if v.ty == Type::Bool => v.value,
            Some(v) => {
                let span = self.arena.expr_span(cond);
                let found = self.show(&v.ty);
                self.report(type_mismatch(span, "bool", &found, what));
                self.builder.const_bool(false)
            }
            None => self.builder.const_bool(false),
        }
    }

    /// `if c1 {..} else if c2 {..} else {..}`
    ///
    /// ```text
    /// origin:   br %c1, label %if.then, label %if.cond
    /// if.then:  ... br label %if.end
    /// if.cond:  br %c2, label %if.then, label %if.else
    /// if.then:  ... br label %if.end
    /// if.else:  ... br label %if.end
    /// if.end:
    /// ```
    fn lower_if(&mut self, clauses: IfClauseRange, else_body: Option<StmtRange>) {
        let arena = self.arena;
        let clauses = arena.if_clauses(clauses);
        let end = self.builder.append_block("if.end");

        for (i, clause) in clauses.iter().enumerate() {
            let cond = self.lower_condition(clause.cond, "condition of `if`");
            let then_bb = self.builder.append_block("if.then");
            let is_last = i + 1 == clauses.len();
            let next = match (is_last, else_body) {
                (false, _) => self.builder.append_block("if.cond"),
                (true, Some(_)) => self.builder.append_block("if.else"),
                (true, None) => end,
            };
            self.builder.cond_br(cond, then_bb, next);

            self.builder.position_at_end(then_bb);
            self.lower_block_scoped(clause.body);
            self.branch_if_live(end);

            if next != end {
                self.builder.position_at_end(next);
            }
        }

        if let Some(body) = else_body {
            self.lower_block_scoped(body);
            self.branch_if_live(end);
        }
        self.builder.position_at_end(end);
    }

    /// Close the current block with `br target` unless control cannot reach it.
    pub(crate) fn branch_if_live(&mut self, target: BlockId) {
        if !self.position_is_dead() {
            self.builder.br(target);
        }
    }

    // ── Loops ──────────────────────────────────────────────────

    /// ```text
    /// origin:      br label %while.cond
    /// while.cond:  br %c, label %while.body, label %while.end
    /// while.body:  ... br label %while.cond
    /// while.end:
    /// ```
    fn lower_while(&mut self, cond: ExprId, body: StmtRange) {
        let cond_bb = self.builder.append_block("while.cond");
        let body_bb = self.builder.append_block("while.body");
        let end_bb = self.builder.append_block("while.end");
        self.builder.br(cond_bb);

        self.builder.position_at_end(cond_bb);
        let c = self.lower_condition(cond, "condition of `while`");
        self.builder.cond_br(c, body_bb, end_bb);

        self.builder.position_at_end(body_bb);
        self.loops.push(LoopTargets {
            cond: cond_bb,
            end: end_bb,
        });
        self.lower_block_scoped(body);
        self.loops.pop();
        self.branch_if_live(cond_bb);

        self.builder.position_at_end(end_bb);
    }

    fn lower_loop_exit(&mut self, span: Span, keyword: &str) {
        let Some(targets) = self.loops.last().copied() else {
            self.report(errors::outside_loop(span, keyword));
            return;
        };
        let target = if keyword == "break" {
            targets.end
        } else {
            targets.cond
        };
        self.builder.br(target);
    }

    // ── Return ─────────────────────────────────────────────────

    fn lower_return(&mut self, value: Option<ExprId>, span: Span) {
        let ret_ty = self.ret_ty.clone();
        let context = format!("return value of `{}`", self.fn_name);
        match value {
            Some(expr) => {
                let expr_span = self.arena.expr_span(expr);
                let lowered = self
                    .lower_expr(expr, Some(&ret_ty))
                    .and_then(|v| self.coerce(v, &ret_ty, expr_span, &context));
                match lowered {
                    Some(_) if ret_ty.is_unit() => self.builder.ret_void(),
                    Some(v) => self.builder.ret(v.value),
                    None => self.builder.unreachable(),
                }
            }
            None if ret_ty.is_unit() => self.builder.ret_void(),
            None => {
                let expected = self.show(&ret_ty);
                let context = format!("return of `{}`", self.fn_name);
                self.report(type_mismatch(span, &expected, "()", &context));
                self.builder.unreachable();
            }
        }
    }
}

#[cfg(test)]
mod tests;
