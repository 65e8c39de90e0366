//! Token cursor for navigating the token stream.
//!
//! `Invalid` tokens are skipped transparently: the lexer has already
//! reported each of them, so the grammar never sees them.

use quill_ir::{Name, Span, StringInterner, Token, TokenKind, TokenList};
use tracing::trace;

/// Cursor for navigating tokens.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    interner: &'a StringInterner,
    pos: usize,
    /// Returned once `pos` runs past a stream with no trailing `Eof`.
    eof: Token,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the first valid token.
    pub fn new(tokens: &'a TokenList, interner: &'a StringInterner) -> Self {
        let end = tokens.iter().last().map_or(0, |t| t.span.end);
        let mut cursor = Cursor {
            tokens,
            interner,
            pos: 0,
            eof: Token::new(TokenKind::Eof, Span::point(end)),
        };
        cursor.skip_invalid();
        cursor
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    /// Current position in the token stream. Compare before and after a
    /// parse step to detect whether anything was consumed.
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    #[inline]
    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// Span of the last consumed valid token.
    pub fn previous_span(&self) -> Span {
        self.tokens.as_slice()[..self.pos.min(self.tokens.len())]
            .iter()
            .rev()
            .find(|t| !matches!(t.kind, TokenKind::Invalid(_)))
            .map_or(Span::DUMMY, |t| t.span)
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Check if the current token has the same kind as `kind`, ignoring
    /// payloads.
    #[inline]
    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_kind().discriminant_index() == kind.discriminant_index()
    }

    #[inline]
    pub fn check_ident(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(_))
    }

    /// Kind of the `n`th valid token after the current one.
    pub fn peek_kind_at(&self, n: usize) -> TokenKind {
        self.tokens.as_slice()[self.pos.min(self.tokens.len())..]
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Invalid(_)))
            .nth(n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    /// Move past the current token. Never moves past `Eof`.
    pub fn advance(&mut self) -> Token {
        let tok = *self.current();
        if !self.is_at_end() {
            trace!(kind = %tok.kind, span = %tok.span, "advance");
            self.pos += 1;
            self.skip_invalid();
        }
        tok
    }

    /// Consume the current token if it matches `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume an identifier, returning its name and span.
    pub fn eat_ident(&mut self) -> Option<(Name, Span)> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                Some((name, span))
            }
            _ => None,
        }
    }

    fn skip_invalid(&mut self) {
        while let Some(tok) = self.tokens.get(self.pos) {
            if !matches!(tok.kind, TokenKind::Invalid(_)) {
                break;
            }
            self.pos += 1;
        }
    }
}
