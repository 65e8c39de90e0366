//! Parse errors.

use quill_diagnostic::{Diagnostic, ErrorCode, Stage};
use quill_ir::Span;

/// A parse error. Converted to a [`Diagnostic`] by the driver.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// Extra context, e.g. "to close this block".
    pub note: Option<(Span, String)>,
}

impl ParseError {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            code,
            message: message.into(),
            span,
            note: None,
        }
    }

    /// `expected X, found Y` at the offending token.
    #[cold]
    pub fn unexpected(expected: &str, found: &str, span: Span) -> Self {
        Self::new(
            ErrorCode::E1001,
            format!("expected {expected}, found {found}"),
            span,
        )
    }

    #[must_use]
    pub fn with_context(mut self, span: Span, message: impl Into<String>) -> Self {
        self.note = Some((span, message.into()));
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = match self.code {
            ErrorCode::E1002 => "cannot assign to this expression",
            ErrorCode::E1003 => "literal out of range for `int`",
            _ => "unexpected token",
        };
        let mut diag = Diagnostic::error(self.code)
            .with_message(self.message.clone())
            .at_stage(Stage::Parse)
            .with_label(self.span, label);
        if let Some((span, message)) = &self.note {
            diag = diag.with_secondary_label(*span, message.clone());
        }
        if self.code == ErrorCode::E1003 {
            diag = diag.with_note(format!(
                "`int` values range from {} to {}",
                i32::MIN,
                i32::MAX
            ));
        }
        diag
    }
}
