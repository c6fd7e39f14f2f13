//! Flat syntax tree.
//!
//! Nodes live in a [`SyntaxArena`] and refer to each other by 32-bit ids.
//! Variable-length children (call arguments, block statements, struct literal
//! fields, if-clauses) are stored contiguously in side tables and addressed
//! by `start`/`len` ranges.

use std::fmt;

use crate::{BinaryOp, Name, Span, UnaryOp};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel for "no node".
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(INVALID)", stringify!($name))
                }
            }
        }
    };
}

macro_rules! define_range {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
        pub struct $name {
            pub start: u32,
            pub len: u32,
        }

        impl $name {
            /// Empty range.
            pub const EMPTY: $name = $name { start: 0, len: 0 };

            #[inline]
            pub const fn new(start: u32, len: u32) -> Self {
                $name { start, len }
            }

            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.len == 0
            }

            #[inline]
            pub const fn len(&self) -> usize {
                self.len as usize
            }

            #[inline]
            fn to_range(self) -> std::ops::Range<usize> {
                self.start as usize..(self.start + self.len) as usize
            }
        }
    };
}

define_id!(
    /// Index of an expression in the arena.
    ExprId
);
define_id!(
    /// Index of a statement in the arena.
    StmtId
);
define_id!(
    /// Index of a written type annotation in the arena.
    ParsedTypeId
);

define_range!(
    /// Contiguous run of expression ids (call arguments).
    ExprRange
);
define_range!(
    /// Contiguous run of statement ids (a block body).
    StmtRange
);
define_range!(
    /// Contiguous run of `name: value` pairs in a struct literal.
    FieldInitRange
);
define_range!(
    /// Contiguous run of `if` / `else if` clauses.
    IfClauseRange
);

/// A type as written in source.
///
/// Resolution against the built-in and user type tables happens during
/// lowering, so an unknown name is representable here.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ParsedType {
    /// `()`
    Unit,
    /// A built-in or user type name: `i32`, `bool`, `Point`, ...
    Named(Name),
    /// `Vector<T>`
    Vector(ParsedTypeId),
}

/// Expression node.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ExprKind {
    /// Integer literal; the magnitude only, negation is a unary op.
    Int(u64),
    /// Float literal stored as `f64` bits.
    Float(u64),
    Bool(bool),
    Char(char),
    Str(Name),
    /// `()`
    Unit,
    Null,
    Ident(Name),
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// `expr as T`
    Cast {
        expr: ExprId,
        target: ParsedTypeId,
    },
    /// `f(args)`
    Call {
        func: Name,
        args: ExprRange,
    },
    /// `recv.method(args)`
    MethodCall {
        receiver: ExprId,
        method: Name,
        args: ExprRange,
    },
    /// `recv.field`
    Field {
        receiver: ExprId,
        field: Name,
    },
    /// `recv[index]`, sugar for `recv.get(index)`.
    Index {
        receiver: ExprId,
        index: ExprId,
    },
    /// `Name { field: value, ... }`
    StructLit {
        name: Name,
        fields: FieldInitRange,
    },
    /// `Vector<T>()`
    VectorNew {
        elem: ParsedTypeId,
    },
}

/// One `field: value` entry of a struct literal.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FieldInit {
    pub name: Name,
    pub value: ExprId,
    pub span: Span,
}

/// One `if cond { body }` clause; `else if` chains are further clauses.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct IfClause {
    pub cond: ExprId,
    pub body: StmtRange,
}

/// Statement node.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum StmtKind {
    /// `var name: T = init` (annotation optional).
    Var {
        name: Name,
        ty: Option<ParsedTypeId>,
        init: ExprId,
    },
    /// `target = value`; target is an identifier, field access or index.
    Assign {
        target: ExprId,
        value: ExprId,
    },
    Expr(ExprId),
    If {
        clauses: IfClauseRange,
        else_body: Option<StmtRange>,
    },
    While {
        cond: ExprId,
        body: StmtRange,
    },
    Return(Option<ExprId>),
    Break,
    Continue,
    /// Nested `{ ... }` block with its own scope.
    Block(StmtRange),
}

/// Function parameter.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: ParsedTypeId,
    pub span: Span,
}

/// Receiver of a method definition.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Receiver {
    /// Type of the implicit `self` parameter.
    pub ty: ParsedTypeId,
    /// Method name as written at call sites.
    pub method: Name,
}

/// Function or method definition.
///
/// `name` is the flat symbol. For methods it is the mangled name produced
/// upstream, and call sites find it through `receiver`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FunctionDef {
    pub name: Name,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    pub return_type: ParsedTypeId,
    pub body: StmtRange,
    pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FieldDef {
    pub name: Name,
    pub ty: ParsedTypeId,
    pub span: Span,
}

/// User aggregate definition.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct StructDef {
    pub name: Name,
    pub fields: Vec<FieldDef>,
    pub span: Span,
}

/// Storage for every node of a program.
#[derive(Clone, Default, Debug)]
pub struct SyntaxArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    types: Vec<ParsedType>,
    expr_lists: Vec<ExprId>,
    stmt_lists: Vec<StmtId>,
    field_inits: Vec<FieldInit>,
    if_clauses: Vec<IfClause>,
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("syntax arena exceeded u32::MAX nodes"))
}

impl SyntaxArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId::new(next_index(self.exprs.len()));
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn alloc_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId::new(next_index(self.stmts.len()));
        self.stmts.push(Stmt { kind, span });
        id
    }

    pub fn alloc_type(&mut self, ty: ParsedType) -> ParsedTypeId {
        let id = ParsedTypeId::new(next_index(self.types.len()));
        self.types.push(ty);
        id
    }

    pub fn alloc_expr_list(&mut self, items: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = next_index(self.expr_lists.len());
        self.expr_lists.extend(items);
        ExprRange::new(start, next_index(self.expr_lists.len()) - start)
    }

    pub fn alloc_stmt_list(&mut self, items: impl IntoIterator<Item = StmtId>) -> StmtRange {
        let start = next_index(self.stmt_lists.len());
        self.stmt_lists.extend(items);
        StmtRange::new(start, next_index(self.stmt_lists.len()) - start)
    }

    pub fn alloc_field_inits(
        &mut self,
        items: impl IntoIterator<Item = FieldInit>,
    ) -> FieldInitRange {
        let start = next_index(self.field_inits.len());
        self.field_inits.extend(items);
        FieldInitRange::new(start, next_index(self.field_inits.len()) - start)
    }

    pub fn alloc_if_clauses(&mut self, items: impl IntoIterator<Item = IfClause>) -> IfClauseRange {
        let start = next_index(self.if_clauses.len());
        self.if_clauses.extend(items);
        IfClauseRange::new(start, next_index(self.if_clauses.len()) - start)
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn expr_kind(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()].kind
    }

    #[inline]
    pub fn expr_span(&self, id: ExprId) -> Span {
        self.exprs[id.index()].span
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn parsed_type(&self, id: ParsedTypeId) -> ParsedType {
        self.types[id.index()]
    }

    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.to_range()]
    }

    #[inline]
    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        &self.stmt_lists[range.to_range()]
    }

    #[inline]
    pub fn field_inits(&self, range: FieldInitRange) -> &[FieldInit] {
        &self.field_inits[range.to_range()]
    }

    #[inline]
    pub fn if_clauses(&self, range: IfClauseRange) -> &[IfClause] {
        &self.if_clauses[range.to_range()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }
}

/// A whole compilation unit: arena plus top-level definitions in source order.
#[derive(Clone, Default, Debug)]
pub struct Program {
    pub arena: SyntaxArena,
    pub structs: Vec<StructDef>,
    pub functions: Vec<FunctionDef>,
}

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{ExprId, StmtId};
    crate::static_assert_size!(ExprId, 4);
    crate::static_assert_size!(StmtId, 4);
    crate::static_assert_size!(Option<super::StmtRange>, 12);
}
