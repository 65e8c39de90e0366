//! Resolution errors.

use quill_diagnostic::{Diagnostic, ErrorCode, Stage};
use quill_ir::Span;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolveErrorKind {
    /// A name declared twice in the same scope.
    Duplicate { name: String, first: Span },
    /// A reference to a name no enclosing scope declares.
    Undeclared {
        name: String,
        suggestion: Option<String>,
    },
    /// A type name that no `record` item declares.
    UnknownType {
        name: String,
        suggestion: Option<String>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub span: Span,
}

impl ResolveError {
    pub fn code(&self) -> ErrorCode {
        match self.kind {
            ResolveErrorKind::Duplicate { .. } => ErrorCode::E2001,
            ResolveErrorKind::Undeclared { .. } | ResolveErrorKind::UnknownType { .. } => {
                ErrorCode::E2002
            }
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).at_stage(Stage::Resolve);
        match &self.kind {
            ResolveErrorKind::Duplicate { name, first } => diag
                .with_message(format!("`{name}` is already declared in this scope"))
                .with_label(self.span, "redeclared here")
                .with_secondary_label(*first, format!("`{name}` first declared here"))
                .with_note("a nested block may shadow an outer name, but not redeclare its own"),
            ResolveErrorKind::Undeclared { name, suggestion } => {
                let diag = diag
                    .with_message(format!("cannot find `{name}` in this scope"))
                    .with_label(self.span, "not declared");
                match suggestion {
                    Some(similar) => diag.with_suggestion(format!("did you mean `{similar}`?")),
                    None => diag,
                }
            }
            ResolveErrorKind::UnknownType { name, suggestion } => {
                let diag = diag
                    .with_message(format!("cannot find type `{name}`"))
                    .with_label(self.span, "no record with this name");
                match suggestion {
                    Some(similar) => diag.with_suggestion(format!("did you mean `{similar}`?")),
                    None => diag.with_note(
                        "a type is `int`, `float`, `bool`, `string`, `void` or a record name",
                    ),
                }
            }
        }
    }
}

/// Largest edit distance offered as a "did you mean" suggestion.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Levenshtein distance between two strings, by characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];
    for (i, a_char) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b.chars().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b_len]
}
