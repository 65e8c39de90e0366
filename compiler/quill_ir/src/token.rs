//! Tokens produced by the lexer.

use std::fmt;
use std::ops::Index;

use crate::{Name, Span};

/// Why the lexer produced an `Invalid` token.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LexErrorKind {
    /// A character that starts no token.
    InvalidCharacter,
    /// A string literal with no closing quote on its line.
    UnterminatedString,
    /// A numeric literal that does not fit in 64 bits.
    InvalidNumber,
    /// A string literal containing an unknown escape sequence.
    InvalidEscape,
}

/// Token kind.
///
/// Float literals are stored as `u64` bits so the enum stays `Eq + Hash`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    // Literals
    Int(u64),
    Float(u64),
    String(Name),
    Ident(Name),

    // Keywords
    Function,
    Var,
    Const,
    If,
    Else,
    While,
    For,
    Return,
    True,
    False,
    Array,
    Of,
    Record,

    // Type keywords
    IntType,
    FloatType,
    BoolType,
    StringType,
    VoidType,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpAmp,
    PipePipe,
    Bang,

    /// Unrecognized or malformed input. The lexer has already reported it.
    Invalid(LexErrorKind),
    Eof,
}

impl TokenKind {
    /// Stable index of the variant, ignoring payloads. Used by token sets.
    pub const fn discriminant_index(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Float(_) => 1,
            Self::String(_) => 2,
            Self::Ident(_) => 3,
            Self::Function => 4,
            Self::Var => 5,
            Self::Const => 6,
            Self::If => 7,
            Self::Else => 8,
            Self::While => 9,
            Self::For => 10,
            Self::Return => 11,
            Self::True => 12,
            Self::False => 13,
            Self::Array => 14,
            Self::Of => 15,
            Self::Record => 16,
            Self::IntType => 17,
            Self::FloatType => 18,
            Self::BoolType => 19,
            Self::StringType => 20,
            Self::VoidType => 21,
            Self::LParen => 22,
            Self::RParen => 23,
            Self::LBrace => 24,
            Self::RBrace => 25,
            Self::LBracket => 26,
            Self::RBracket => 27,
            Self::Comma => 28,
            Self::Semicolon => 29,
            Self::Colon => 30,
            Self::Dot => 31,
            Self::Plus => 32,
            Self::Minus => 33,
            Self::Star => 34,
            Self::Slash => 35,
            Self::Percent => 36,
            Self::Eq => 37,
            Self::EqEq => 38,
            Self::NotEq => 39,
            Self::Lt => 40,
            Self::LtEq => 41,
            Self::Gt => 42,
            Self::GtEq => 43,
            Self::AmpAmp => 44,
            Self::PipePipe => 45,
            Self::Bang => 46,
            Self::Invalid(_) => 47,
            Self::Eof => 48,
        }
    }

    /// Human-readable description for error messages.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer literal",
            Self::Float(_) => "float literal",
            Self::String(_) => "string literal",
            Self::Ident(_) => "identifier",
            Self::Function => "`function`",
            Self::Var => "`var`",
            Self::Const => "`const`",
            Self::If => "`if`",
            Self::Else => "`else`",
            Self::While => "`while`",
            Self::For => "`for`",
            Self::Return => "`return`",
            Self::True => "`true`",
            Self::False => "`false`",
            Self::Array => "`array`",
            Self::Of => "`of`",
            Self::Record => "`record`",
            Self::IntType => "`int`",
            Self::FloatType => "`float`",
            Self::BoolType => "`bool`",
            Self::StringType => "`string`",
            Self::VoidType => "`void`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Comma => "`,`",
            Self::Semicolon => "`;`",
            Self::Colon => "`:`",
            Self::Dot => "`.`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::Percent => "`%`",
            Self::Eq => "`=`",
            Self::EqEq => "`==`",
            Self::NotEq => "`!=`",
            Self::Lt => "`<`",
            Self::LtEq => "`<=`",
            Self::Gt => "`>`",
            Self::GtEq => "`>=`",
            Self::AmpAmp => "`&&`",
            Self::PipePipe => "`||`",
            Self::Bang => "`!`",
            Self::Invalid(_) => "invalid token",
            Self::Eof => "end of input",
        }
    }

    /// Whether this token names a type (`int`, `float`, ...).
    pub const fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            Self::IntType | Self::FloatType | Self::BoolType | Self::StringType | Self::VoidType
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A token with its source span.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    /// The exact source text this token was scanned from.
    pub fn lexeme<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.span.to_range()).unwrap_or("")
    }
}

/// Fully materialized token stream, terminated by `Eof`.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }
}

impl Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl FromIterator<Token> for TokenList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        TokenList {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
