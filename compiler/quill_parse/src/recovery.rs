//! Error recovery for the parser.
//!
//! Token sets use a `u64` bitset over `TokenKind::discriminant_index`.

use quill_ir::TokenKind;

use crate::cursor::Cursor;

const _: () = assert!(
    TokenKind::Eof.discriminant_index() < 64,
    "TokenSet uses a u64 bitset; all discriminant indices must be < 64"
);

/// A set of token kinds with O(1) membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TokenSet(u64);

impl TokenSet {
    pub const fn new() -> Self {
        Self(0)
    }

    #[must_use]
    #[allow(
        clippy::needless_pass_by_value,
        reason = "const fn builder API; by-value required for static init"
    )]
    pub const fn with(self, kind: TokenKind) -> Self {
        Self(self.0 | (1u64 << kind.discriminant_index()))
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(&self, kind: TokenKind) -> bool {
        (self.0 & (1u64 << kind.discriminant_index())) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }
}

/// Tokens that start a top-level item.
pub const ITEM_START: TokenSet = TokenSet::new()
    .with(TokenKind::Function)
    .with(TokenKind::Var)
    .with(TokenKind::Const)
    .with(TokenKind::Record);

/// Tokens that start a statement and can only appear there.
pub const STMT_START: TokenSet = ITEM_START
    .with(TokenKind::If)
    .with(TokenKind::While)
    .with(TokenKind::For)
    .with(TokenKind::Return);

/// Where statement-level recovery stops: a terminator, the end of the
/// enclosing block, or the next statement keyword.
pub const STMT_BOUNDARY: TokenSet = STMT_START
    .with(TokenKind::Semicolon)
    .with(TokenKind::RBrace);

/// Advance until a token in `recovery` at brace depth zero, or EOF.
///
/// Braced groups met along the way are skipped whole, so a block opened
/// after the error point cannot close the enclosing one. Unbalanced `}`
/// tokens not in `recovery` are skipped too.
///
/// Returns `true` if a recovery token was found, `false` if EOF was reached.
pub fn synchronize(cursor: &mut Cursor<'_>, recovery: TokenSet) -> bool {
    let mut depth = 0u32;
    while !cursor.is_at_end() {
        let kind = cursor.current_kind();
        if depth == 0 && recovery.contains(kind) {
            return true;
        }
        match kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth = depth.saturating_sub(1),
            _ => {}
        }
        cursor.advance();
    }
    false
}
