//! Scope resolution phase tests.
//!
//! Name binding as it shows up in the full pipeline: errors never cascade
//! into the type checker, and shadowing is visible at run time.

use pretty_assertions::assert_eq;
use quill_diagnostic::ErrorCode;
use quillc::SourceUnit;

use crate::common::{run, run_main, typecheck_err, typecheck_ok, Value};

#[test]
fn undeclared_name_in_a_larger_expression_is_one_error() {
    let codes = typecheck_err(
        "function f(a: int): int { return (a + missing * 2) / len(\"x\") - missing; }",
    );
    assert_eq!(codes, vec![ErrorCode::E2002, ErrorCode::E2002]);

    let codes = typecheck_err("function f(): bool { return !(undefined(1, 2) < 3.5); }");
    assert_eq!(codes, vec![ErrorCode::E2002]);
}

#[test]
fn undeclared_name_suggests_a_close_match() {
    let out = quillc::check(&SourceUnit::new(
        "t.ql",
        "function f(): int { var count: int = 1; return cuont; }",
    ));
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].code, ErrorCode::E2002);
    assert_eq!(out.diagnostics[0].suggestions, vec!["did you mean `count`?"]);
}

#[test]
fn duplicate_declaration_in_one_scope() {
    let codes = typecheck_err("function f(): void { var a: int = 1; var a: float = 2.0; }");
    assert_eq!(codes, vec![ErrorCode::E2001]);

    let codes = typecheck_err("const N: int = 1; function N(): void { }");
    assert_eq!(codes, vec![ErrorCode::E2001]);
}

#[test]
fn body_cannot_redeclare_a_parameter() {
    let codes = typecheck_err("function f(a: int): int { var a: int = 2; return a; }");
    assert_eq!(codes, vec![ErrorCode::E2001]);
}

#[test]
fn shadowing_in_a_nested_block_is_allowed() {
    typecheck_ok("function f(x: int): void { { var x: bool = true; writeln(x); } }");
}

#[test]
fn inner_declaration_wins_until_its_block_closes() {
    let out = run_main(
        "function main(): void {
            var x: int = 1;
            {
                var x: int = 2;
                writeln(x);
            }
            writeln(x);
        }",
    );
    assert_eq!(out, "2\n1\n");
}

#[test]
fn initializer_refers_to_the_outer_binding() {
    let result = run(
        "function f(x: int): int { { var x: int = x + 1; return x; } }",
        "f",
        "(I)I",
        vec![Value::Int(41)],
    );
    assert_eq!(result, Some(Value::Int(42)));
}

#[test]
fn functions_may_be_called_before_their_declaration() {
    let result = run(
        "function f(): int { return g() + 1; }
         function g(): int { return 41; }",
        "f",
        "()I",
        vec![],
    );
    assert_eq!(result, Some(Value::Int(42)));
}

#[test]
fn builtins_can_be_shadowed() {
    let out = run_main(
        "function len(x: int): int { return x * 2; }
         function main(): void { writeln(len(21)); }",
    );
    assert_eq!(out, "42\n");
}

#[test]
fn unknown_type_name_is_one_error() {
    let out = quillc::check(&SourceUnit::new(
        "t.ql",
        "record Point { x: int; }
         function f(p: Pont): int { return p.x; }",
    ));
    assert_eq!(out.error_count(), 1);
    assert_eq!(out.diagnostics[0].code, ErrorCode::E2002);
    assert_eq!(out.diagnostics[0].suggestions, vec!["did you mean `Point`?"]);
}

#[test]
fn records_may_be_used_before_their_declaration() {
    let out = run_main(
        "function main(): void { writeln(Pair(1, 2).b); }
         record Pair { a: int; b: int; }",
    );
    assert_eq!(out, "2\n");
}
