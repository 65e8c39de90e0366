//! Syntax errors and recovery.

use pretty_assertions::assert_eq;
use quill_diagnostic::ErrorCode;
use quill_ir::{Item, StmtKind};

use crate::common::{parse_err, parse_ok, typecheck_err};

#[test]
fn missing_close_paren_is_one_syntax_error() {
    assert_eq!(
        parse_err("function f(x: int): void { if (x > 1 { x = 2; } x = 3; }"),
        vec![ErrorCode::E1001]
    );
}

#[test]
fn missing_close_brace_is_one_syntax_error() {
    assert_eq!(
        parse_err("function f(): void { while (true) { writeln(1);\nfunction g(): void { }"),
        vec![ErrorCode::E1001]
    );
}

#[test]
fn missing_semicolon_is_one_syntax_error() {
    assert_eq!(
        parse_err("function f(): int { var x: int = 1 return x; }"),
        vec![ErrorCode::E1001]
    );
}

#[test]
fn separate_mistakes_are_each_reported() {
    let codes = parse_err("function f(): void {\n  writeln(;\n  var y: int = 1;\n  y = );\n}");
    assert_eq!(codes, vec![ErrorCode::E1001, ErrorCode::E1001]);
}

#[test]
fn invalid_assignment_target() {
    assert_eq!(
        parse_err("function f(): void { 1 = 2; }"),
        vec![ErrorCode::E1002]
    );
}

#[test]
fn int_literal_must_fit_in_32_bits() {
    assert_eq!(
        parse_err("function f(): int { return 2147483648; }"),
        vec![ErrorCode::E1003]
    );
    parse_ok("function f(): int { return -2147483648; }");
}

#[test]
fn syntax_errors_do_not_cascade_into_later_stages() {
    // The broken statement becomes an error node that later stages skip.
    let codes = typecheck_err("function f(): int { var x: int = ; return 1; }");
    assert_eq!(codes, vec![ErrorCode::E1001]);

    // A broken `return` still satisfies the missing-return check.
    let codes = typecheck_err("function f(): int { return (1 + 2; }");
    assert_eq!(codes, vec![ErrorCode::E1001]);
}

#[test]
fn statements_after_an_error_are_kept() {
    let source = "function f(): void { writeln(; var y: int = 1; }";
    assert_eq!(parse_err(source), vec![ErrorCode::E1001]);

    let parsed = parse_ok("function f(): void { var y: int = 1; y = y + 1; }");
    let Some(Item::Function(f)) = parsed.module.items().first() else {
        panic!("expected a function");
    };
    assert!(matches!(f.body.stmts[0].kind, StmtKind::Var(_)));
    assert!(matches!(f.body.stmts[1].kind, StmtKind::Expr(_)));
}

#[test]
fn empty_input_is_one_syntax_error() {
    assert_eq!(parse_err(""), vec![ErrorCode::E1001]);
    // Later stages stop at the error root without reporting anything.
    assert_eq!(typecheck_err("\n// only a comment\n"), vec![ErrorCode::E1001]);

    let out = quillc::compile(
        &quillc::SourceUnit::new("Empty.ql", ""),
        &quillc::CompileOptions::default(),
    );
    assert!(out.artifact.is_none());
    assert_eq!(out.error_count(), 1);
}
