//! Statements and blocks.

use crate::{BindingId, ExprId, Name, Span, Type};

/// `var name: ty = init;` or `const name: ty = init;`
#[derive(Clone, PartialEq, Debug)]
pub struct VarDecl {
    pub binding: BindingId,
    pub name: Name,
    pub name_span: Span,
    pub ty: Type,
    pub ty_span: Span,
    pub init: Option<ExprId>,
    pub is_const: bool,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    Var(VarDecl),
    Expr(ExprId),
    /// `else if` chains are represented as an else block holding one `If`.
    If {
        cond: ExprId,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        cond: ExprId,
        body: Block,
    },
    /// `for (var, start, end, step) body`; `var` is an identifier
    /// expression naming an existing `int` variable.
    For {
        var: ExprId,
        start: ExprId,
        end: ExprId,
        step: ExprId,
        body: Block,
    },
    Return(Option<ExprId>),
    Block(Block),
    /// Placeholder left by the parser after a syntax error.
    Error,
}
