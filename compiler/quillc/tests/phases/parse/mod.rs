//! Parser phase tests.
//!
//! Lexing and parsing seen through the driver:
//! - `lexer` - lexical errors and how they flow into later stages
//! - `recovery` - one error per missing delimiter, parsing resumes after it

mod lexer;
mod recovery;
