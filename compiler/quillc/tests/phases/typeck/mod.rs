//! Type checking phase tests.

use pretty_assertions::assert_eq;
use quill_diagnostic::ErrorCode;
use quillc::{CompileOptions, SourceUnit};

use crate::common::{compile_with, run, typecheck_err, typecheck_ok, warnings, Value};

// -- Mismatches --

#[test]
fn returning_a_string_from_an_int_function() {
    let source = "function f(): int { return \"x\"; }";
    assert_eq!(typecheck_err(source), vec![ErrorCode::E3001]);

    let out = compile_with(source, &CompileOptions::default());
    assert!(out.artifact.is_none());
    assert_eq!(out.error_count(), 1);
}

#[test]
fn float_does_not_narrow_to_int() {
    let out = quillc::check(&SourceUnit::new(
        "t.ql",
        "function f(): void { var i: int = 1.5; }",
    ));
    assert_eq!(out.error_count(), 1);
    assert_eq!(
        out.diagnostics[0].suggestions,
        vec!["use `floor(x)` to convert float to int"]
    );
}

#[test]
fn conditions_must_be_bool() {
    assert_eq!(
        typecheck_err("function f(n: int): void { if (n) { } while (1.0) { } }"),
        vec![ErrorCode::E3001, ErrorCode::E3001]
    );
}

#[test]
fn string_concatenation_needs_two_strings() {
    typecheck_ok("function f(a: string): string { return a + \"!\"; }");
    assert_eq!(
        typecheck_err("function f(a: string): string { return a + 1; }"),
        vec![ErrorCode::E3001]
    );
}

#[test]
fn operator_errors_do_not_cascade() {
    // The bad operand makes the whole expression an error; the `return`
    // around it is not reported again.
    assert_eq!(
        typecheck_err("function f(b: bool): int { return (b * 2) + 1; }"),
        vec![ErrorCode::E3001]
    );
}

#[test]
fn void_calls_have_no_value() {
    let codes = typecheck_err(
        "function g(): void { }
         function f(): void { var x: int = g(); }",
    );
    assert_eq!(codes, vec![ErrorCode::E3001]);
}

#[test]
fn arrays_index_with_ints_only() {
    typecheck_ok("function f(a: float[]): float { return a[len(a) - 1]; }");
    assert_eq!(
        typecheck_err("function f(a: float[]): float { return a[0.5]; }"),
        vec![ErrorCode::E3001]
    );
    assert_eq!(
        typecheck_err("function f(a: int): int { return a[0]; }"),
        vec![ErrorCode::E3001]
    );
}

// -- Widening --

#[test]
fn ints_widen_to_float_where_floats_are_expected() {
    typecheck_ok(
        "var ratio: float = 1;
         function half(x: float): float { return x / 2; }
         function f(n: int): float { ratio = n; return half(n) + n; }",
    );
}

#[test]
fn widened_arguments_run_as_floats() {
    let result = run(
        "function half(x: float): float { return x / 2; }
         function f(n: int): float { return half(n); }",
        "f",
        "(I)F",
        vec![Value::Int(3)],
    );
    assert_eq!(result, Some(Value::Float(1.5)));
}

// -- Calls --

#[test]
fn argument_count_must_match() {
    assert_eq!(
        typecheck_err(
            "function add(a: int, b: int): int { return a + b; }
             function f(): int { return add(1); }"
        ),
        vec![ErrorCode::E3002]
    );
    assert_eq!(
        typecheck_err("function f(): void { writeln(1, 2); }"),
        vec![ErrorCode::E3002]
    );
}

#[test]
fn write_accepts_any_primitive() {
    typecheck_ok(
        "function f(): void { write(1); write(2.5); write(true); write(\"s\"); writeln(); }",
    );
    assert_eq!(
        typecheck_err("function f(a: int[]): void { writeln(a); }"),
        vec![ErrorCode::E3001]
    );
}

#[test]
fn only_functions_can_be_called() {
    assert_eq!(
        typecheck_err("function f(x: int): int { return x(1); }"),
        vec![ErrorCode::E3001]
    );
}

#[test]
fn function_names_are_not_values() {
    assert_eq!(
        typecheck_err("function g(): int { return 1; } function main() { g; }"),
        vec![ErrorCode::E3001]
    );
    assert_eq!(
        typecheck_err("function f(): void { var n: int = len; writeln(f + 1); }"),
        vec![ErrorCode::E3001, ErrorCode::E3001]
    );
    // Assigning to a function is reported once, as a bad target.
    assert_eq!(
        typecheck_err("function g(): int { return 1; } function main() { g = 2; }"),
        vec![ErrorCode::E3001]
    );
}

// -- Returns --

#[test]
fn missing_return() {
    assert_eq!(
        typecheck_err("function f(n: int): int { if (n > 0) { return 1; } }"),
        vec![ErrorCode::E3003]
    );
    typecheck_ok("function f(n: int): int { if (n > 0) { return 1; } else { return 0; } }");
}

#[test]
fn loops_never_count_as_returning() {
    assert_eq!(
        typecheck_err("function f(): int { while (true) { return 1; } }"),
        vec![ErrorCode::E3003]
    );
    typecheck_ok("function f(): int { while (true) { return 1; } return 0; }");
}

#[test]
fn void_functions_return_nothing() {
    assert_eq!(
        typecheck_err("function f(): void { return 1; }"),
        vec![ErrorCode::E3001]
    );
    assert_eq!(
        typecheck_err("function f(): int { return; }"),
        vec![ErrorCode::E3001]
    );
}

// -- Constants --

#[test]
fn constants_cannot_be_assigned() {
    assert_eq!(
        typecheck_err("const LIMIT: int = 10; function f(): void { LIMIT = 11; }"),
        vec![ErrorCode::E3004]
    );
    assert_eq!(
        typecheck_err("function f(): void { const K: int = 1; K = 2; }"),
        vec![ErrorCode::E3004]
    );
}

#[test]
fn constant_cannot_drive_a_for_loop() {
    assert_eq!(
        typecheck_err("const I: int = 0; function f(): void { for (I, 0, 3, 1) { } }"),
        vec![ErrorCode::E3004]
    );
}

// -- Unreachable code --

#[test]
fn statements_after_return_are_warned() {
    assert_eq!(
        warnings("function f(): int { return 1; writeln(2); writeln(3); }"),
        vec![ErrorCode::W3001]
    );
}

#[test]
fn warnings_do_not_block_code_generation() {
    let out = compile_with(
        "function f(): int { return 1; writeln(2); }",
        &CompileOptions::default(),
    );
    assert!(out.succeeded());
    assert_eq!(out.warning_count(), 1);
    assert_eq!(out.error_count(), 0);
}

// -- Records --

#[test]
fn unknown_field_suggests_a_close_one() {
    let out = quillc::check(&SourceUnit::new(
        "t.ql",
        "record Point { x: int; y: int; }
         function f(p: Point): int { return p.xx * 2; }",
    ));
    assert_eq!(out.error_count(), 1);
    assert_eq!(out.diagnostics[0].code, ErrorCode::E3005);
    assert_eq!(out.diagnostics[0].suggestions, vec!["did you mean `x`?"]);
}

#[test]
fn fields_need_a_record() {
    assert_eq!(
        typecheck_err("function f(n: int): int { return n.x; }"),
        vec![ErrorCode::E3001]
    );
}

#[test]
fn constructor_arguments_follow_field_types() {
    assert_eq!(
        typecheck_err(
            "record Point { x: int; y: float; }
             function f(): Point { return Point(1.5, 2); }
             function g(): Point { return Point(1); }"
        ),
        vec![ErrorCode::E3001, ErrorCode::E3002]
    );
    typecheck_ok(
        "record Point { x: int; y: float; }
         function f(): Point { return Point(1, 2); }",
    );
}
