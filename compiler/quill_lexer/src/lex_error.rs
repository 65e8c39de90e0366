//! Lexer errors.

use quill_diagnostic::{Diagnostic, ErrorCode};
use quill_ir::{LexErrorKind, Span};

/// A lexer error. Each one corresponds to exactly one `Invalid` token.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
    /// Offending source text, for the message.
    pub text: String,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span, text: impl Into<String>) -> Self {
        LexError {
            kind,
            span,
            text: text.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self.kind {
            LexErrorKind::InvalidCharacter => ErrorCode::E0001,
            LexErrorKind::UnterminatedString => ErrorCode::E0002,
            LexErrorKind::InvalidNumber => ErrorCode::E0003,
            LexErrorKind::InvalidEscape => ErrorCode::E0004,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code());
        match self.kind {
            LexErrorKind::InvalidCharacter => diag
                .with_message(format!("invalid character sequence `{}`", self.text))
                .with_label(self.span, "not valid in Quill source"),
            LexErrorKind::UnterminatedString => diag
                .with_message("unterminated string literal")
                .with_label(self.span, "missing closing `\"`")
                .with_note("string literals cannot span multiple lines"),
            LexErrorKind::InvalidNumber => diag
                .with_message(format!("numeric literal `{}` is too large", self.text))
                .with_label(self.span, "does not fit in 64 bits"),
            LexErrorKind::InvalidEscape => diag
                .with_message(format!("unknown escape sequence `{}`", self.text))
                .with_label(self.span, "unknown escape")
                .with_suggestion("supported escapes are \\n \\t \\r \\0 \\\\ and \\\""),
        }
    }
}
