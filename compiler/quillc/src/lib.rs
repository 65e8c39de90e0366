//! Quill compiler driver.
//!
//! Runs the stages in order over one source unit, collecting every
//! diagnostic into a single [`DiagnosticQueue`](quill_diagnostic::DiagnosticQueue):
//!
//! ```text
//! source ──► lex ──► parse ──► resolve ──► typecheck
//!                                              │
//!                         (stop here if any error was reported)
//!                                              ▼
//!                               lower ──► generate ──► Artifact
//! ```
//!
//! Front-end stages always run to completion so a single compilation
//! reports as many problems as possible. Lowering and code generation
//! only see programs with no errors; a failure there is an internal error
//! (`E9001`) and produces no artifact.
//!
//! Units are independent: [`compile_batch`] compiles many in parallel and
//! nothing is shared between them.

pub mod commands;
mod pipeline;
mod tracing_setup;

pub use pipeline::{check, class_name_for, compile, compile_batch};
pub use quill_jvm::TargetVersion;
pub use tracing_setup::init_tracing;

use quill_diagnostic::{Diagnostic, Severity};

/// One source file handed to the compiler.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SourceUnit {
    /// Logical file name, used in diagnostics and for the default class name.
    pub name: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        SourceUnit {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CompileOptions {
    /// Emit `LineNumberTable` and `SourceFile` attributes.
    pub emit_debug_info: bool,
    pub target_version: TargetVersion,
    /// Overrides the class name derived from the unit name.
    pub class_name: Option<String>,
    /// Worker threads for [`compile_batch`]; `None` uses rayon's default.
    pub jobs: Option<usize>,
}

/// The class files generated for one unit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    pub class_name: String,
    pub bytes: Vec<u8>,
    /// One class per record, in declaration order.
    pub record_classes: Vec<RecordClass>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordClass {
    pub class_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// `(internal name, bytes)` of the main class, then of each record.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &[u8])> {
        std::iter::once((self.class_name.as_str(), self.bytes.as_slice())).chain(
            self.record_classes
                .iter()
                .map(|r| (r.class_name.as_str(), r.bytes.as_slice())),
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct CompileOutput {
    /// Present only when no error was reported.
    pub artifact: Option<Artifact>,
    /// Every diagnostic, in emission order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn succeeded(&self) -> bool {
        self.artifact.is_some() && !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}
