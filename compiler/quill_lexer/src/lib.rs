//! Lexer for Quill.
//!
//! [`tokenize`] returns a lazy [`Lexer`] iterator; [`lex`] drains it into a
//! [`TokenList`] for the parser. Malformed input never stops the lexer: each
//! bad sequence becomes one `Invalid` token plus one [`LexError`].

mod escape;
mod lex_error;
mod raw_token;

use std::collections::VecDeque;

use logos::Logos;
use quill_ir::{LexErrorKind, Span, StringInterner, Token, TokenKind, TokenList};

pub use lex_error::LexError;
use raw_token::RawToken;

/// Lazy token stream over one source buffer.
///
/// Yields exactly one `Eof` token and then `None`. To re-scan, call
/// [`tokenize`] again.
pub struct Lexer<'src, 'i> {
    logos: logos::Lexer<'src, RawToken>,
    source: &'src str,
    interner: &'i StringInterner,
    /// Tokens scanned but not yet yielded.
    ready: VecDeque<Token>,
    errors: Vec<LexError>,
    finished: bool,
}

/// Start lexing `source`.
pub fn tokenize<'src, 'i>(source: &'src str, interner: &'i StringInterner) -> Lexer<'src, 'i> {
    Lexer {
        logos: RawToken::lexer(source),
        source,
        interner,
        ready: VecDeque::new(),
        errors: Vec::new(),
        finished: false,
    }
}

impl Lexer<'_, '_> {
    /// Errors recorded so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    fn push_invalid(&mut self, kind: LexErrorKind, span: Span) {
        let text = self.source.get(span.to_range()).unwrap_or("");
        self.errors.push(LexError::new(kind, span, text));
        self.ready.push_back(Token::new(TokenKind::Invalid(kind), span));
    }

    /// Scan until at least one token is ready.
    fn scan(&mut self) {
        // Adjacent unrecognized characters collapse into one invalid token
        let mut run: Option<Span> = None;
        loop {
            let result = self.logos.next();
            let span = Span::from_range(self.logos.span());

            match result {
                // A digit-led error is a numeric literal its callback rejected
                Some(Err(())) if !starts_with_digit(self.logos.slice()) => {
                    run = Some(match run {
                        Some(prev) if prev.end == span.start => prev.merge(span),
                        Some(prev) => {
                            self.push_invalid(LexErrorKind::InvalidCharacter, prev);
                            span
                        }
                        None => span,
                    });
                }
                other => {
                    if let Some(prev) = run {
                        self.push_invalid(LexErrorKind::InvalidCharacter, prev);
                    }
                    match other {
                        Some(Ok(raw)) => {
                            let tok = self.convert(raw, span);
                            self.ready.push_back(tok);
                        }
                        Some(Err(())) => self.push_invalid(LexErrorKind::InvalidNumber, span),
                        None => {
                            self.finished = true;
                            let eof = Span::point(clamp_offset(self.source.len()));
                            self.ready.push_back(Token::new(TokenKind::Eof, eof));
                        }
                    }
                    return;
                }
            }
        }
    }

    fn convert(&mut self, raw: RawToken, span: Span) -> Token {
        let slice = self.logos.slice();
        let kind = match raw {
            RawToken::Int(n) => TokenKind::Int(n),
            RawToken::Float(f) => TokenKind::Float(f.to_bits()),
            RawToken::String => {
                let body = &slice[1..slice.len() - 1];
                match escape::unescape_string(body) {
                    Ok(text) => TokenKind::String(self.interner.intern(&text)),
                    Err(at) => {
                        let escape: String = body[at..].chars().take(2).collect();
                        self.errors
                            .push(LexError::new(LexErrorKind::InvalidEscape, span, escape));
                        TokenKind::Invalid(LexErrorKind::InvalidEscape)
                    }
                }
            }
            RawToken::UnterminatedString => {
                self.errors.push(LexError::new(
                    LexErrorKind::UnterminatedString,
                    span,
                    slice,
                ));
                TokenKind::Invalid(LexErrorKind::UnterminatedString)
            }
            RawToken::Ident => TokenKind::Ident(self.interner.intern(slice)),
            RawToken::Function => TokenKind::Function,
            RawToken::Var => TokenKind::Var,
            RawToken::Const => TokenKind::Const,
            RawToken::If => TokenKind::If,
            RawToken::Else => TokenKind::Else,
            RawToken::While => TokenKind::While,
            RawToken::For => TokenKind::For,
            RawToken::Return => TokenKind::Return,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,
            RawToken::Array => TokenKind::Array,
            RawToken::Of => TokenKind::Of,
            RawToken::Record => TokenKind::Record,

            RawToken::IntType => TokenKind::IntType,
            RawToken::FloatType => TokenKind::FloatType,
            RawToken::BoolType => TokenKind::BoolType,
            RawToken::StringType => TokenKind::StringType,
            RawToken::VoidType => TokenKind::VoidType,

            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Dot => TokenKind::Dot,

            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::Eq => TokenKind::Eq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
            RawToken::Bang => TokenKind::Bang,
        };
        Token::new(kind, span)
    }
}

impl Iterator for Lexer<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.ready.is_empty() && !self.finished {
            self.scan();
        }
        self.ready.pop_front()
    }
}

fn starts_with_digit(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit())
}

fn clamp_offset(offset: usize) -> u32 {
    u32::try_from(offset).unwrap_or(u32::MAX)
}

/// Output of [`lex`].
#[derive(Clone, Debug, Default)]
pub struct LexOutput {
    pub tokens: TokenList,
    pub errors: Vec<LexError>,
}

impl LexOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Lex `source` to completion.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn lex(source: &str, interner: &StringInterner) -> LexOutput {
    let mut lexer = tokenize(source, interner);
    let tokens: TokenList = lexer.by_ref().collect();
    let errors = lexer.into_errors();
    tracing::debug!(tokens = tokens.len(), errors = errors.len(), "lexed");
    LexOutput { tokens, errors }
}
