//! Programmatic syntax tree construction.
//!
//! The parser drives the arena directly; `SyntaxBuilder` is the convenience
//! layer for hand-built trees. Every node receives a distinct synthetic span
//! so diagnostics in tests can be matched back to the node that caused them.

use crate::ast::{
    ExprId, ExprKind, FieldDef, FieldInit, FunctionDef, IfClause, Param, ParsedType,
    ParsedTypeId, Program, Receiver, StmtId, StmtKind, StructDef,
};
use crate::{BinaryOp, Name, Span, StringInterner, UnaryOp};

pub struct SyntaxBuilder<'a> {
    interner: &'a StringInterner,
    program: Program,
    next_pos: u32,
}

impl<'a> SyntaxBuilder<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        SyntaxBuilder {
            interner,
            program: Program::default(),
            next_pos: 0,
        }
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn span(&mut self) -> Span {
        let start = self.next_pos;
        self.next_pos += 2;
        Span::new(start, start + 1)
    }

    /// Span assigned to an expression, for matching diagnostics.
    pub fn span_of(&self, id: ExprId) -> Span {
        self.program.arena.expr_span(id)
    }

    /// Span assigned to a statement.
    pub fn stmt_span(&self, id: StmtId) -> Span {
        self.program.arena.stmt(id).span
    }

    /// Parse a written type: `()`, `Vector<T>`, or a name.
    pub fn ty(&mut self, text: &str) -> ParsedTypeId {
        let text = text.trim();
        let parsed = if text == "()" {
            ParsedType::Unit
        } else if let Some(inner) = text
            .strip_prefix("Vector<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            ParsedType::Vector(self.ty(inner))
        } else {
            ParsedType::Named(self.name(text))
        };
        self.program.arena.alloc_type(parsed)
    }

    fn expr(&mut self, kind: ExprKind) -> ExprId {
        let span = self.span();
        self.program.arena.alloc_expr(kind, span)
    }

    fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.span();
        self.program.arena.alloc_stmt(kind, span)
    }

    // Expressions

    pub fn int(&mut self, value: u64) -> ExprId {
        self.expr(ExprKind::Int(value))
    }

    /// Negative integer literal, built as unary minus like the parser does.
    pub fn neg_int(&mut self, value: u64) -> ExprId {
        let operand = self.int(value);
        self.unary(UnaryOp::Neg, operand)
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::Float(value.to_bits()))
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Bool(value))
    }

    pub fn char(&mut self, value: char) -> ExprId {
        self.expr(ExprKind::Char(value))
    }

    pub fn str(&mut self, value: &str) -> ExprId {
        let name = self.name(value);
        self.expr(ExprKind::Str(name))
    }

    pub fn unit(&mut self) -> ExprId {
        self.expr(ExprKind::Unit)
    }

    pub fn null(&mut self) -> ExprId {
        self.expr(ExprKind::Null)
    }

    pub fn ident(&mut self, name: &str) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::Ident(name))
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand })
    }

    pub fn cast(&mut self, expr: ExprId, target: &str) -> ExprId {
        let target = self.ty(target);
        self.expr(ExprKind::Cast { expr, target })
    }

    pub fn call(&mut self, func: &str, args: &[ExprId]) -> ExprId {
        let func = self.name(func);
        let args = self.program.arena.alloc_expr_list(args.iter().copied());
        self.expr(ExprKind::Call { func, args })
    }

    pub fn method_call(&mut self, receiver: ExprId, method: &str, args: &[ExprId]) -> ExprId {
        let method = self.name(method);
        let args = self.program.arena.alloc_expr_list(args.iter().copied());
        self.expr(ExprKind::MethodCall {
            receiver,
            method,
            args,
        })
    }

    pub fn field(&mut self, receiver: ExprId, field: &str) -> ExprId {
        let field = self.name(field);
        self.expr(ExprKind::Field { receiver, field })
    }

    pub fn index(&mut self, receiver: ExprId, index: ExprId) -> ExprId {
        self.expr(ExprKind::Index { receiver, index })
    }

    pub fn struct_lit(&mut self, name: &str, fields: &[(&str, ExprId)]) -> ExprId {
        let name = self.name(name);
        let inits: Vec<FieldInit> = fields
            .iter()
            .map(|&(field, value)| FieldInit {
                name: self.name(field),
                value,
                span: self.program.arena.expr_span(value),
            })
            .collect();
        let fields = self.program.arena.alloc_field_inits(inits);
        self.expr(ExprKind::StructLit { name, fields })
    }

    /// `Vector<elem>()`
    pub fn vector_new(&mut self, elem: &str) -> ExprId {
        let elem = self.ty(elem);
        self.expr(ExprKind::VectorNew { elem })
    }

    // Statements

    pub fn var(&mut self, name: &str, ty: Option<&str>, init: ExprId) -> StmtId {
        let name = self.name(name);
        let ty = ty.map(|t| self.ty(t));
        self.stmt(StmtKind::Var { name, ty, init })
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> StmtId {
        self.stmt(StmtKind::Assign { target, value })
    }

    /// `name = value`
    pub fn assign_to(&mut self, name: &str, value: ExprId) -> StmtId {
        let target = self.ident(name);
        self.assign(target, value)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    /// `if c0 {..} else if c1 {..} ... else {..}`
    pub fn if_chain(
        &mut self,
        clauses: Vec<(ExprId, Vec<StmtId>)>,
        else_body: Option<Vec<StmtId>>,
    ) -> StmtId {
        let clauses: Vec<IfClause> = clauses
            .into_iter()
            .map(|(cond, body)| IfClause {
                cond,
                body: self.program.arena.alloc_stmt_list(body),
            })
            .collect();
        let clauses = self.program.arena.alloc_if_clauses(clauses);
        let else_body = else_body.map(|body| self.program.arena.alloc_stmt_list(body));
        self.stmt(StmtKind::If { clauses, else_body })
    }

    pub fn if_then(&mut self, cond: ExprId, then_body: Vec<StmtId>) -> StmtId {
        self.if_chain(vec![(cond, then_body)], None)
    }

    pub fn if_else(
        &mut self,
        cond: ExprId,
        then_body: Vec<StmtId>,
        else_body: Vec<StmtId>,
    ) -> StmtId {
        self.if_chain(vec![(cond, then_body)], Some(else_body))
    }

    pub fn while_loop(&mut self, cond: ExprId, body: Vec<StmtId>) -> StmtId {
        let body = self.program.arena.alloc_stmt_list(body);
        self.stmt(StmtKind::While { cond, body })
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return(value))
    }

    pub fn ret_value(&mut self, value: ExprId) -> StmtId {
        self.ret(Some(value))
    }

    pub fn brk(&mut self) -> StmtId {
        self.stmt(StmtKind::Break)
    }

    pub fn cont(&mut self) -> StmtId {
        self.stmt(StmtKind::Continue)
    }

    pub fn block(&mut self, body: Vec<StmtId>) -> StmtId {
        let body = self.program.arena.alloc_stmt_list(body);
        self.stmt(StmtKind::Block(body))
    }

    // Definitions

    pub fn struct_def(&mut self, name: &str, fields: &[(&str, &str)]) {
        let name = self.name(name);
        let fields = fields
            .iter()
            .map(|&(field, ty)| FieldDef {
                name: self.name(field),
                ty: self.ty(ty),
                span: self.span(),
            })
            .collect();
        let span = self.span();
        self.program.structs.push(StructDef { name, fields, span });
    }

    fn params(&mut self, params: &[(&str, &str)]) -> Vec<Param> {
        params
            .iter()
            .map(|&(name, ty)| Param {
                name: self.name(name),
                ty: self.ty(ty),
                span: self.span(),
            })
            .collect()
    }

    /// Define a free function. Returns the definition span.
    pub fn function(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
        return_type: &str,
        body: Vec<StmtId>,
    ) -> Span {
        let name = self.name(name);
        let params = self.params(params);
        let return_type = self.ty(return_type);
        let body = self.program.arena.alloc_stmt_list(body);
        let span = self.span();
        self.program.functions.push(FunctionDef {
            name,
            receiver: None,
            params,
            return_type,
            body,
            span,
        });
        span
    }

    /// Define a method on `receiver`, mangled to the flat symbol `Type.method`.
    pub fn method(
        &mut self,
        receiver: &str,
        method: &str,
        params: &[(&str, &str)],
        return_type: &str,
        body: Vec<StmtId>,
    ) -> Span {
        let symbol = self.name(&format!("{receiver}.{method}"));
        let receiver = Receiver {
            ty: self.ty(receiver),
            method: self.name(method),
        };
        let params = self.params(params);
        let return_type = self.ty(return_type);
        let body = self.program.arena.alloc_stmt_list(body);
        let span = self.span();
        self.program.functions.push(FunctionDef {
            name: symbol,
            receiver: Some(receiver),
            params,
            return_type,
            body,
            span,
        });
        span
    }

    pub fn finish(self) -> Program {
        self.program
    }
}
