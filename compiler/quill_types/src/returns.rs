//! Return-path analysis over statement lists.
//!
//! Not dataflow: a list always returns if it contains a `return`, a block
//! that always returns, or an `if`/`else` whose branches both always
//! return. Loops never count, whatever their condition.

use quill_ir::{Stmt, StmtKind};

/// Whether executing `stmts` always reaches a `return`.
///
/// A statement the parser could not recover counts as returning: its
/// error is already reported, and a missing `return` would be a second
/// diagnostic for the same mistake.
pub fn always_returns(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| returns(stmt, true))
}

/// Whether code after `stmt` is unreachable. Error statements never hide
/// what follows them.
pub(crate) fn stmt_always_returns(stmt: &Stmt) -> bool {
    returns(stmt, false)
}

fn returns(stmt: &Stmt, error_returns: bool) -> bool {
    let all = |stmts: &[Stmt]| stmts.iter().any(|s| returns(s, error_returns));
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::Error => error_returns,
        StmtKind::Block(block) => all(&block.stmts),
        StmtKind::If {
            then_block,
            else_block: Some(else_block),
            ..
        } => all(&then_block.stmts) && all(&else_block.stmts),
        StmtKind::If { .. }
        | StmtKind::While { .. }
        | StmtKind::For { .. }
        | StmtKind::Var(_)
        | StmtKind::Expr(_) => false,
    }
}
