//! Quill IR - core data structures shared by every compiler phase.
//!
//! - Spans for source locations
//! - Names for interned identifiers
//! - Tokens and `TokenList` for lexer output
//! - AST nodes with arena-allocated expressions
//! - Source-level `Type`s, including user records
//!
//! Floats inside tokens and literals are stored as bits so these types can
//! derive `Eq` and `Hash`.

pub mod ast;
mod ids;
mod interner;
mod name;
mod span;
mod token;
mod ty;

pub use ast::{
    BinaryOp, Block, Expr, ExprArena, ExprKind, Function, Item, Module, ModuleRoot, Param,
    RecordDecl, RecordField, Stmt, StmtKind, UnaryOp, VarDecl,
};
pub use ids::{BindingId, ExprId};
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use span::{Span, SpanError};
pub use token::{LexErrorKind, Token, TokenKind, TokenList};
pub use ty::{FnType, PrimKind, Type};
