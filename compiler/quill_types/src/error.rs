//! Type errors and warnings.

use quill_diagnostic::{Diagnostic, ErrorCode, Stage};
use quill_ir::{BinaryOp, Span, Type, UnaryOp};

/// What a position required, when that is not a single type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expected {
    Type(Type),
    /// A primitive or a record: what `write` can print.
    Printable,
    Array,
    Record,
    /// An array or a string (`len`).
    Sized,
    /// A variable, array element or field, not a function or record name.
    Assignable,
    /// A type a variable can hold.
    Storable,
    /// Anything but a function name outside a call.
    Value,
    /// `int` or `float`.
    Numeric,
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Type(ty) => write!(f, "`{ty}`"),
            Expected::Printable => f.write_str("a primitive value or a record"),
            Expected::Array => f.write_str("an array"),
            Expected::Record => f.write_str("a record"),
            Expected::Sized => f.write_str("an array or a string"),
            Expected::Assignable => f.write_str("a variable, array element or field"),
            Expected::Storable => f.write_str("a non-void type"),
            Expected::Value => f.write_str("a value"),
            Expected::Numeric => f.write_str("`int` or `float`"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeErrorKind {
    Mismatch { expected: Expected, found: Type },
    BinaryOperands { op: BinaryOp, left: Type, right: Type },
    UnaryOperand { op: UnaryOp, operand: Type },
    NotCallable { found: Type },
    Arity { expected: usize, found: usize },
    /// A non-void function whose body can finish without `return`.
    MissingReturn { function: String, ret: Type },
    AssignToConstant { name: String, declared: Span },
    /// `base.field` where the record declares no such field.
    UnknownField {
        record: String,
        field: String,
        suggestion: Option<String>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub span: Span,
}

impl TypeError {
    pub fn code(&self) -> ErrorCode {
        match self.kind {
            TypeErrorKind::Mismatch { .. }
            | TypeErrorKind::BinaryOperands { .. }
            | TypeErrorKind::UnaryOperand { .. }
            | TypeErrorKind::NotCallable { .. } => ErrorCode::E3001,
            TypeErrorKind::Arity { .. } => ErrorCode::E3002,
            TypeErrorKind::MissingReturn { .. } => ErrorCode::E3003,
            TypeErrorKind::AssignToConstant { .. } => ErrorCode::E3004,
            TypeErrorKind::UnknownField { .. } => ErrorCode::E3005,
        }
    }

    /// Convert to a diagnostic with helpful suggestions.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let span = self.span;
        let diag = match &self.kind {
            TypeErrorKind::Mismatch {
                expected: Expected::Type(expected),
                found,
            } => {
                let diag = quill_diagnostic::type_mismatch(
                    span,
                    &expected.to_string(),
                    &found.to_string(),
                );
                if *found == Type::Void {
                    diag.with_note("a call to a `void` function produces no value")
                } else if *expected == Type::INT && *found == Type::FLOAT {
                    diag.with_suggestion("use `floor(x)` to convert float to int")
                } else if *expected == Type::BOOL && found.is_numeric() {
                    diag.with_suggestion(
                        "use a comparison operator (e.g., `x != 0`) to convert a number to bool",
                    )
                } else {
                    diag
                }
            }
            TypeErrorKind::Mismatch { expected, found } => {
                let diag = Diagnostic::error(ErrorCode::E3001)
                    .with_message(format!("type mismatch: expected {expected}, found `{found}`"))
                    .with_label(span, format!("expected {expected}"));
                if *expected == Expected::Value {
                    diag.with_note("functions can only be called, not used as values")
                } else {
                    diag
                }
            }
            TypeErrorKind::BinaryOperands { op, left, right } => {
                let diag = Diagnostic::error(ErrorCode::E3001)
                    .with_message(format!(
                        "cannot apply `{}` to `{left}` and `{right}`",
                        op.as_symbol()
                    ))
                    .with_label(span, "incompatible operands");
                if *op == BinaryOp::Add && (*left == Type::STR || *right == Type::STR) {
                    diag.with_note("`+` concatenates only two strings")
                } else {
                    diag
                }
            }
            TypeErrorKind::UnaryOperand { op, operand } => Diagnostic::error(ErrorCode::E3001)
                .with_message(format!(
                    "cannot apply unary `{}` to `{operand}`",
                    op.as_symbol()
                ))
                .with_label(span, "incompatible operand"),
            TypeErrorKind::NotCallable { found } => Diagnostic::error(ErrorCode::E3001)
                .with_message(format!("type mismatch: `{found}` is not a function"))
                .with_label(span, "called here"),
            TypeErrorKind::Arity { expected, found } => {
                let plural = if *expected == 1 { "" } else { "s" };
                Diagnostic::error(ErrorCode::E3002)
                    .with_message(format!(
                        "wrong number of arguments: expected {expected}, found {found}"
                    ))
                    .with_label(span, format!("expected {expected} argument{plural}"))
                    .with_suggestion(if found > expected {
                        "remove extra arguments"
                    } else {
                        "add missing arguments"
                    })
            }
            TypeErrorKind::MissingReturn { function, ret } => Diagnostic::error(ErrorCode::E3003)
                .with_message(format!(
                    "function `{function}` may finish without returning a `{ret}`"
                ))
                .with_label(span, format!("declared to return `{ret}`"))
                .with_note("loops do not count as returning; add a `return` after them"),
            TypeErrorKind::AssignToConstant { name, declared } => {
                Diagnostic::error(ErrorCode::E3004)
                    .with_message(format!("cannot assign to constant `{name}`"))
                    .with_label(span, "assignment to constant")
                    .with_secondary_label(*declared, "declared `const` here")
                    .with_suggestion(format!("declare `{name}` with `var` to make it mutable"))
            }
            TypeErrorKind::UnknownField {
                record,
                field,
                suggestion,
            } => {
                let diag = Diagnostic::error(ErrorCode::E3005)
                    .with_message(format!("record `{record}` has no field `{field}`"))
                    .with_label(span, "unknown field");
                match suggestion {
                    Some(similar) => diag.with_suggestion(format!("did you mean `{similar}`?")),
                    None => diag,
                }
            }
        };
        diag.at_stage(Stage::TypeCheck)
    }
}

/// Statements that can never execute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnreachableCode {
    pub span: Span,
}

impl UnreachableCode {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(ErrorCode::W3001)
            .with_message("unreachable statement")
            .with_label(self.span, "this code can never run")
            .at_stage(Stage::TypeCheck)
    }
}
