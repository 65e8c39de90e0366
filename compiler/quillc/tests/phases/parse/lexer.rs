//! Lexer errors as the driver reports them.

use pretty_assertions::assert_eq;
use quill_diagnostic::ErrorCode;

use crate::common::{parse_err, parse_ok, typecheck_err};

#[test]
fn invalid_character_is_reported_once_and_skipped() {
    assert_eq!(
        parse_err("function f(): int { return 1 # ; }"),
        vec![ErrorCode::E0001]
    );
}

#[test]
fn unterminated_string_stops_at_end_of_line() {
    let codes = parse_err("function f(): void { writeln(\"abc);\n}");
    assert_eq!(codes[0], ErrorCode::E0002);
}

#[test]
fn unknown_escape_is_an_error() {
    assert_eq!(
        parse_err("function f(): void { writeln(\"a\\qb\"); }"),
        vec![ErrorCode::E0004]
    );
}

#[test]
fn lex_errors_block_code_generation() {
    let codes = typecheck_err("function main(): void { writeln(1 $ 2); }");
    assert_eq!(codes.first(), Some(&ErrorCode::E0001));
}

#[test]
fn comments_and_whitespace_are_not_tokens() {
    let parsed = parse_ok(
        "// leading comment\nfunction f(): int {\n  // inside\n  return 1; // trailing\n}\n",
    );
    assert_eq!(parsed.module.functions().count(), 1);
}
