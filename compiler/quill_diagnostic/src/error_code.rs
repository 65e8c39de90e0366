//! Error codes for all compiler diagnostics.
//!
//! The first digit of an error code names the phase:
//! - E0xxx: lexer
//! - E1xxx: parser
//! - E2xxx: scope resolution
//! - E3xxx: type checking
//! - E9xxx: internal compiler errors
//!
//! Warnings use the `W` prefix with the same phase digits.

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer
    /// Character that starts no token
    E0001,
    /// Unterminated string literal
    E0002,
    /// Numeric literal out of range
    E0003,
    /// Unknown escape sequence in a string literal
    E0004,

    // Parser
    /// Unexpected token
    E1001,
    /// Invalid assignment target
    E1002,
    /// Integer literal does not fit in `int`
    E1003,

    // Resolver
    /// Name declared twice in one scope
    E2001,
    /// Name not declared in any enclosing scope
    E2002,

    // Type checker
    /// Type mismatch
    E3001,
    /// Wrong number of call arguments
    E3002,
    /// Non-void function may finish without returning
    E3003,
    /// Assignment to a constant
    E3004,
    /// Field access naming no field of the record
    E3005,

    // Warnings
    /// Statement can never execute
    W3001,

    // Internal
    /// Violated compiler invariant
    E9001,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E0004,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E3004,
        ErrorCode::E3005,
        ErrorCode::W3001,
        ErrorCode::E9001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E0004 => "E0004",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E3005 => "E3005",
            ErrorCode::W3001 => "W3001",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// Taxonomy name of the diagnostic (`"TypeMismatch"`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "InvalidCharacter",
            ErrorCode::E0002 => "UnterminatedString",
            ErrorCode::E0003 => "InvalidNumber",
            ErrorCode::E0004 => "InvalidEscape",
            ErrorCode::E1001 | ErrorCode::E1002 | ErrorCode::E1003 => "SyntaxError",
            ErrorCode::E2001 => "DuplicateDeclaration",
            ErrorCode::E2002 => "UndeclaredIdentifier",
            ErrorCode::E3001 => "TypeMismatch",
            ErrorCode::E3002 => "ArityMismatch",
            ErrorCode::E3003 => "MissingReturn",
            ErrorCode::E3004 => "AssignToConstant",
            ErrorCode::E3005 => "UnknownField",
            ErrorCode::W3001 => "UnreachableCode",
            ErrorCode::E9001 => "InternalError",
        }
    }

    /// Long-form explanation shown by `quill explain`.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => {
                "The source contains a character that cannot start any token, such as `@` or `#`."
            }
            ErrorCode::E0002 => {
                "A string literal is missing its closing `\"`. String literals cannot span lines."
            }
            ErrorCode::E0003 => "A numeric literal is too large to represent.",
            ErrorCode::E0004 => {
                "A string literal contains an unknown escape. Supported escapes are \
                 \\n, \\t, \\r, \\0, \\\\ and \\\"."
            }
            ErrorCode::E1001 => {
                "The parser found a token it did not expect. Parsing resumes at the next \
                 statement boundary, so later errors are still reported."
            }
            ErrorCode::E1002 => {
                "Only variables, array elements and record fields can appear on the left \
                 of `=`."
            }
            ErrorCode::E1003 => {
                "Integer literals must fit in a signed 32-bit `int` (at most 2147483647)."
            }
            ErrorCode::E2001 => {
                "A name was declared twice in the same scope. Declaring the same name in a \
                 nested block is allowed and shadows the outer one."
            }
            ErrorCode::E2002 => "A name was used without being declared in any enclosing scope.",
            ErrorCode::E3001 => {
                "An expression has a different type than its context requires. `int` values \
                 convert to `float` implicitly; no other conversions happen automatically."
            }
            ErrorCode::E3002 => "A function was called with the wrong number of arguments.",
            ErrorCode::E3003 => {
                "A function with a non-void return type has a path that reaches the end of its \
                 body without a `return`. Loops never count as returning."
            }
            ErrorCode::E3004 => "A `const` value cannot be assigned after its declaration.",
            ErrorCode::E3005 => {
                "A field access names a field the record does not declare. Field names are \
                 case-sensitive."
            }
            ErrorCode::W3001 => "A statement follows a `return` in the same block and never runs.",
            ErrorCode::E9001 => {
                "The compiler violated one of its own invariants. This is a compiler bug; \
                 no output was produced."
            }
        }
    }

    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == upper)
            .ok_or_else(|| format!("unknown error code: {s}"))
    }
}
