//! Expression nodes and the arena that owns them.

use crate::{BinaryOp, ExprId, Name, Span, Type, UnaryOp};

/// An expression node.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    /// Integer literal, already range-checked to `i32`.
    Int(i32),
    /// Float literal stored as `f64` bits.
    Float(u64),
    Bool(bool),
    Str(Name),
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
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    Index {
        array: ExprId,
        index: ExprId,
    },
    /// `array [len] of elem`
    NewArray {
        elem: Type,
        len: ExprId,
    },
    /// `base.field`
    Field {
        base: ExprId,
        field: Name,
        field_span: Span,
    },
    /// `target = value`; the parser only accepts names, index and field
    /// expressions as targets.
    Assign {
        target: ExprId,
        value: ExprId,
    },
    /// Placeholder left by the parser after a syntax error.
    Error,
}

impl ExprKind {
    /// Float literal value.
    pub fn float_value(&self) -> Option<f64> {
        match self {
            ExprKind::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

/// Owner of every expression in a module.
///
/// Children are referenced by `ExprId`; each id is referenced by exactly
/// one parent, so the arena encodes a tree.
#[derive(Clone, Default, Debug)]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena { exprs: Vec::new() }
    }

    /// Allocate an expression and return its id.
    ///
    /// # Panics
    /// Panics after `u32::MAX` expressions.
    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = u32::try_from(self.exprs.len())
            .unwrap_or_else(|_| panic!("expression arena exceeded u32::MAX entries"));
        self.exprs.push(expr);
        ExprId::new(id)
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()].kind
    }

    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.exprs[id.index()].span
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExprId, &Expr)> {
        self.exprs
            .iter()
            .enumerate()
            .map(|(i, e)| (ExprId::new(i as u32), e))
    }
}
