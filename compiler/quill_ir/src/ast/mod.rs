//! Abstract syntax tree.
//!
//! Expressions are flattened into an [`ExprArena`]; statements, blocks and
//! items are owned values. Every node carries a [`Span`](crate::Span).

mod expr;
mod operators;
mod stmt;

pub use expr::{Expr, ExprArena, ExprKind};
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{Block, Stmt, StmtKind, VarDecl};

use crate::{BindingId, Name, Span, Type};

/// A function parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct Param {
    pub binding: BindingId,
    pub name: Name,
    pub ty: Type,
    pub span: Span,
}

/// `function name(params): ret { body }`
#[derive(Clone, PartialEq, Debug)]
pub struct Function {
    pub binding: BindingId,
    pub name: Name,
    pub name_span: Span,
    pub params: Vec<Param>,
    pub ret: Type,
    /// The return annotation, or the name when there is none.
    pub ret_span: Span,
    pub body: Block,
    pub span: Span,
}

impl Function {
    pub fn signature(&self) -> Type {
        Type::function(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.ret.clone(),
        )
    }
}

/// `name: ty;` inside a record.
#[derive(Clone, PartialEq, Debug)]
pub struct RecordField {
    pub name: Name,
    pub name_span: Span,
    pub ty: Type,
    pub ty_span: Span,
}

/// `record Name { field: T; ... }`
#[derive(Clone, PartialEq, Debug)]
pub struct RecordDecl {
    pub binding: BindingId,
    pub name: Name,
    pub name_span: Span,
    /// Always `Type::Record` naming this declaration.
    pub ty: Type,
    pub fields: Vec<RecordField>,
    pub span: Span,
}

impl RecordDecl {
    /// Signature of `Name(field, ...)`, which builds a new record.
    pub fn constructor(&self) -> Type {
        Type::function(
            self.fields.iter().map(|f| f.ty.clone()).collect(),
            self.ty.clone(),
        )
    }

    /// Declaration-order index and declaration of the field called `name`.
    pub fn field(&self, name: Name) -> Option<(usize, &RecordField)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

/// Top-level item.
#[derive(Clone, PartialEq, Debug)]
pub enum Item {
    Function(Function),
    /// Global variable or constant.
    Global(VarDecl),
    Record(RecordDecl),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Function(f) => f.span,
            Item::Global(decl) => decl.span,
            Item::Record(record) => record.span,
        }
    }
}

/// Root of a parsed module.
#[derive(Clone, PartialEq, Debug)]
pub enum ModuleRoot {
    Items(Vec<Item>),
    /// The parser could not establish any item and reported errors.
    Error,
}

/// A parsed compilation unit.
#[derive(Clone, Debug)]
pub struct Module {
    pub root: ModuleRoot,
    pub arena: ExprArena,
    /// Number of binding sites; every `BindingId` is below this.
    pub binding_count: u32,
}

impl Module {
    /// Items of the module; empty for an error root.
    pub fn items(&self) -> &[Item] {
        match &self.root {
            ModuleRoot::Items(items) => items,
            ModuleRoot::Error => &[],
        }
    }

    pub fn is_error_root(&self) -> bool {
        matches!(self.root, ModuleRoot::Error)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items().iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            Item::Global(_) | Item::Record(_) => None,
        })
    }

    pub fn globals(&self) -> impl Iterator<Item = &VarDecl> {
        self.items().iter().filter_map(|item| match item {
            Item::Global(decl) => Some(decl),
            Item::Function(_) | Item::Record(_) => None,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = &RecordDecl> {
        self.items().iter().filter_map(|item| match item {
            Item::Record(record) => Some(record),
            Item::Function(_) | Item::Global(_) => None,
        })
    }

    /// The record declaration behind a `Type::Record`, if any.
    pub fn record(&self, ty: &Type) -> Option<&RecordDecl> {
        self.records().find(|record| record.ty == *ty)
    }
}
