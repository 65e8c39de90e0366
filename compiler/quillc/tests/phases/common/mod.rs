//! Shared test utilities for phase tests.
//!
//! Each helper runs the pipeline as far as its phase needs and asserts the
//! outcome the caller expects, printing every diagnostic on failure.

#![allow(dead_code, reason = "not every phase module uses every helper")]

pub mod class_reader;
pub mod interp;

use quill_diagnostic::{Diagnostic, ErrorCode};
use quill_ir::{Module, StringInterner};
use quillc::{CompileOptions, CompileOutput, SourceUnit};

pub use class_reader::Class;
pub use interp::{Object, Trap, Value, Vm};

fn unit(source: &str) -> SourceUnit {
    SourceUnit::new("Test.ql", source)
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{}[{}]: {}", d.severity, d.code, d.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn error_codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.code)
        .collect()
}

// -- Parse --

/// A parsed module with the interner its names live in.
pub struct Parsed {
    pub module: Module,
    pub interner: StringInterner,
}

/// Lex and parse, asserting neither stage reports anything.
pub fn parse_ok(source: &str) -> Parsed {
    let interner = StringInterner::new();
    let lexed = quill_lexer::lex(source, &interner);
    assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
    let parsed = quill_parse::parse(&lexed.tokens, &interner);
    assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
    Parsed {
        module: parsed.module,
        interner,
    }
}

/// Codes of the lex and parse errors of `source`, asserting there is at
/// least one.
pub fn parse_err(source: &str) -> Vec<ErrorCode> {
    let interner = StringInterner::new();
    let lexed = quill_lexer::lex(source, &interner);
    let parsed = quill_parse::parse(&lexed.tokens, &interner);
    let codes: Vec<_> = lexed
        .errors
        .iter()
        .map(|e| e.to_diagnostic().code)
        .chain(parsed.errors.iter().map(|e| e.to_diagnostic().code))
        .collect();
    assert!(!codes.is_empty(), "expected syntax errors in {source:?}");
    codes
}

// -- Front end --

/// Run the whole front end, asserting no errors (warnings are allowed).
pub fn typecheck_ok(source: &str) -> CompileOutput {
    let out = quillc::check(&unit(source));
    assert!(!out.has_errors(), "unexpected errors:\n{}", render(&out.diagnostics));
    out
}

/// Error codes reported by the front end, in emission order.
pub fn typecheck_err(source: &str) -> Vec<ErrorCode> {
    let out = quillc::check(&unit(source));
    let codes = error_codes(&out.diagnostics);
    assert!(!codes.is_empty(), "expected errors in {source:?}");
    codes
}

/// Warning codes of a program that has no errors.
pub fn warnings(source: &str) -> Vec<ErrorCode> {
    typecheck_ok(source)
        .diagnostics
        .iter()
        .filter(|d| !d.is_error())
        .map(|d| d.code)
        .collect()
}

// -- Codegen --

pub fn compile_with(source: &str, options: &CompileOptions) -> CompileOutput {
    quillc::compile(&unit(source), options)
}

/// Compile and decode every class of the unit, the unit's class first,
/// asserting there are no errors.
pub fn compile_all(source: &str) -> Vec<Class> {
    let out = compile_with(source, &CompileOptions::default());
    let Some(artifact) = out.artifact else {
        panic!("no artifact:\n{}", render(&out.diagnostics));
    };
    assert!(!out.diagnostics.iter().any(Diagnostic::is_error));
    artifact
        .classes()
        .map(|(name, bytes)| {
            Class::parse(bytes).unwrap_or_else(|e| panic!("malformed class file {name}: {e}"))
        })
        .collect()
}

/// Compile and decode the unit's class.
pub fn compile_ok(source: &str) -> Class {
    compile_all(source).swap_remove(0)
}

/// Compile `source`, call `name` with `args`, and return its result and
/// everything it printed.
pub fn run_with_input(
    source: &str,
    name: &str,
    descriptor: &str,
    args: Vec<Value>,
    input: &str,
) -> Result<(Option<Value>, String), Trap> {
    let classes = compile_all(source);
    let mut vm = Vm::new(&classes, input)?;
    let result = vm.invoke(name, descriptor, args)?;
    Ok((result, vm.stdout))
}

pub fn run(source: &str, name: &str, descriptor: &str, args: Vec<Value>) -> Option<Value> {
    run_with_input(source, name, descriptor, args, "")
        .unwrap_or_else(|trap| panic!("{name}{descriptor} trapped: {trap:?}"))
        .0
}

/// Run `function main(): void` and return its output.
pub fn run_main(source: &str) -> String {
    run_main_with_input(source, "")
}

pub fn run_main_with_input(source: &str, input: &str) -> String {
    run_with_input(source, "main", "()V", Vec::new(), input)
        .unwrap_or_else(|trap| panic!("main trapped: {trap:?}"))
        .1
}
