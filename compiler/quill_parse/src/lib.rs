//! Recursive descent parser for Quill.
//!
//! Produces a [`Module`] whose expressions live in an `ExprArena`.
//! Parsing never fails outright: syntax errors are collected, the parser
//! resynchronizes at the next statement or item boundary, and a module
//! with no recoverable items gets an explicit error root.

mod cursor;
mod error;
mod grammar;
mod recovery;


pub use cursor::Cursor;
pub use error::ParseError;
pub use recovery::{synchronize, TokenSet};

use quill_ir::{
    BindingId, Expr, ExprArena, ExprId, ExprKind, Item, Module, ModuleRoot, Name, Span,
    StringInterner, Token, TokenKind, TokenList,
};

/// Output of [`parse`].
#[derive(Clone, Debug)]
pub struct ParseOutput {
    pub module: Module,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parse a token stream into a module.
#[tracing::instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
pub fn parse(tokens: &TokenList, interner: &StringInterner) -> ParseOutput {
    let mut parser = Parser::new(tokens, interner);
    let items = parser.parse_items();
    let output = parser.finish(items);
    tracing::debug!(
        items = output.module.items().len(),
        exprs = output.module.arena.len(),
        errors = output.errors.len(),
        "parsed"
    );
    output
}

/// Parser state.
pub(crate) struct Parser<'a> {
    cursor: Cursor<'a>,
    arena: ExprArena,
    errors: Vec<ParseError>,
    next_binding: u32,
    /// Set by a syntax error, cleared when the grammar next consumes a
    /// token. Syntax errors reported while set are dropped.
    recovering: bool,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a TokenList, interner: &'a StringInterner) -> Self {
        Parser {
            cursor: Cursor::new(tokens, interner),
            arena: ExprArena::new(),
            errors: Vec::new(),
            next_binding: 0,
            recovering: false,
        }
    }

    fn finish(self, items: Vec<Item>) -> ParseOutput {
        let root = if items.is_empty() && !self.errors.is_empty() {
            ModuleRoot::Error
        } else {
            ModuleRoot::Items(items)
        };
        ParseOutput {
            module: Module {
                root,
                arena: self.arena,
                binding_count: self.next_binding,
            },
            errors: self.errors,
        }
    }

    // Token access

    #[inline]
    fn current_kind(&self) -> TokenKind {
        self.cursor.current_kind()
    }

    #[inline]
    fn current_span(&self) -> Span {
        self.cursor.current_span()
    }

    #[inline]
    fn check(&self, kind: TokenKind) -> bool {
        self.cursor.check(kind)
    }

    /// Consume the current token as part of a successful parse.
    fn bump(&mut self) -> Token {
        self.recovering = false;
        self.cursor.advance()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(kind.display_name()))
        }
    }

    /// Expect a closing delimiter, pointing back at the opening one.
    fn expect_closing(&mut self, kind: TokenKind, open: Span) -> Result<Token, ParseError> {
        self.expect(kind)
            .map_err(|err| err.with_context(open, "unclosed delimiter"))
    }

    fn expect_ident(&mut self, what: &str) -> Result<(Name, Span), ParseError> {
        match self.cursor.eat_ident() {
            Some(found) => {
                self.recovering = false;
                Ok(found)
            }
            None => Err(self.unexpected(what)),
        }
    }

    /// `expected {expected}, found <current token>`.
    fn unexpected(&self, expected: &str) -> ParseError {
        let found = match self.current_kind() {
            TokenKind::Ident(name) => {
                format!("identifier `{}`", self.cursor.interner().lookup(name))
            }
            kind => kind.display_name().to_string(),
        };
        ParseError::unexpected(expected, &found, self.current_span())
    }

    /// Record a syntax error unless one is already being recovered from.
    fn report(&mut self, err: ParseError) {
        if self.recovering {
            tracing::trace!(message = %err.message, "suppressed cascading error");
        } else {
            self.errors.push(err);
        }
        self.recovering = true;
    }

    // Node construction

    fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.arena.alloc(Expr::new(kind, span))
    }

    fn fresh_binding(&mut self) -> BindingId {
        let id = BindingId::new(self.next_binding);
        self.next_binding += 1;
        id
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: Span) -> Span {
        let end = self.cursor.previous_span().end;
        if end > start.start {
            Span::new(start.start, end)
        } else {
            start
        }
    }
}
