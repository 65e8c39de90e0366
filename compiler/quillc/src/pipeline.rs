//! The compilation pipeline.

use std::path::Path;

use quill_diagnostic::span_utils::LineOffsetTable;
use quill_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode, ErrorGuaranteed, Stage};
use quill_ir::{Module, StringInterner};
use quill_jvm::CodegenConfig;
use quill_resolve::Resolution;
use quill_types::TypeCheckResult;
use rayon::prelude::*;

use crate::{Artifact, CompileOptions, CompileOutput, RecordClass, SourceUnit};

/// Front-end results for one unit.
struct FrontEnd {
    module: Module,
    resolution: Resolution,
    types: TypeCheckResult,
}

/// Lex, parse, resolve and type check, recording every diagnostic.
fn front_end(source: &str, interner: &StringInterner, queue: &mut DiagnosticQueue) -> FrontEnd {
    let lexed = quill_lexer::lex(source, interner);
    queue.extend(lexed.errors.iter().map(|e| e.to_diagnostic()));

    let parsed = quill_parse::parse(&lexed.tokens, interner);
    queue.extend(parsed.errors.iter().map(|e| e.to_diagnostic()));

    let resolution = quill_resolve::resolve(&parsed.module, interner);
    queue.extend(resolution.errors.iter().map(|e| e.to_diagnostic()));

    let types = quill_types::typecheck(&parsed.module, &resolution, interner);
    queue.extend(types.errors.iter().map(|e| e.to_diagnostic()));
    queue.extend(types.warnings.iter().map(|w| w.to_diagnostic()));

    FrontEnd {
        module: parsed.module,
        resolution,
        types,
    }
}

/// Run the front end only. The output never carries an artifact.
#[tracing::instrument(level = "debug", skip_all, fields(unit = %unit.name))]
pub fn check(unit: &SourceUnit) -> CompileOutput {
    let interner = StringInterner::new();
    let mut queue = DiagnosticQueue::new();
    front_end(&unit.text, &interner, &mut queue);
    CompileOutput {
        artifact: None,
        diagnostics: queue.take(),
    }
}

/// Compile one unit to a class file.
#[tracing::instrument(level = "debug", skip_all, fields(unit = %unit.name))]
pub fn compile(unit: &SourceUnit, options: &CompileOptions) -> CompileOutput {
    let interner = StringInterner::new();
    let mut queue = DiagnosticQueue::new();
    let front = front_end(&unit.text, &interner, &mut queue);

    if queue.has_errors() {
        tracing::debug!(
            errors = queue.error_count(),
            warnings = queue.warning_count(),
            "front end reported errors; skipping code generation"
        );
        return CompileOutput {
            artifact: None,
            diagnostics: queue.take(),
        };
    }

    let artifact = back_end(unit, options, &front, &interner, &mut queue);
    CompileOutput {
        artifact: artifact.ok(),
        diagnostics: queue.take(),
    }
}

fn back_end(
    unit: &SourceUnit,
    options: &CompileOptions,
    front: &FrontEnd,
    interner: &StringInterner,
    queue: &mut DiagnosticQueue,
) -> Result<Artifact, ErrorGuaranteed> {
    let config = CodegenConfig {
        class_name: options
            .class_name
            .clone()
            .unwrap_or_else(|| class_name_for(&unit.name)),
        target: options.target_version,
        emit_debug_info: options.emit_debug_info,
        source_file: options.emit_debug_info.then(|| source_file_name(&unit.name)),
    };
    check_class_names(&front.module, &config.class_name, interner, queue)?;

    let ir = match quill_lower::lower(&front.module, &front.resolution, &front.types, interner) {
        Ok(ir) => ir,
        Err(err) => {
            tracing::error!(%err, "lowering failed");
            return Err(queue.emit_error(err.to_diagnostic()));
        }
    };

    let lines = LineOffsetTable::build(&unit.text);
    let generated = quill_jvm::generate(&ir, &config, interner, &lines).and_then(|class| {
        let records = quill_jvm::generate_records(&ir, &config, interner)?;
        Ok((class, records))
    });
    match generated {
        Ok((class, records)) => Ok(Artifact {
            class_name: config.class_name,
            bytes: class.to_bytes(),
            record_classes: records
                .iter()
                .map(|record| RecordClass {
                    class_name: record.name.clone(),
                    bytes: record.to_bytes(),
                })
                .collect(),
        }),
        Err(err) => {
            tracing::error!(%err, "code generation failed");
            Err(queue.emit_error(err.to_diagnostic()))
        }
    }
}

/// Each record becomes a class named after it, so no record may share the
/// name of the unit's class.
fn check_class_names(
    module: &Module,
    class_name: &str,
    interner: &StringInterner,
    queue: &mut DiagnosticQueue,
) -> Result<(), ErrorGuaranteed> {
    let Some(record) = module
        .records()
        .find(|record| interner.lookup(record.name) == class_name)
    else {
        return Ok(());
    };
    let diagnostic = Diagnostic::error(ErrorCode::E2001)
        .at_stage(Stage::Resolve)
        .with_message(format!(
            "record `{class_name}` has the same name as the class generated for this file"
        ))
        .with_label(record.name_span, "declared here")
        .with_note("rename the record, or choose another class name for the file");
    Err(queue.emit_error(diagnostic))
}

/// Compile independent units in parallel. Results are in input order.
#[tracing::instrument(level = "debug", skip_all, fields(units = units.len()))]
pub fn compile_batch(units: &[SourceUnit], options: &CompileOptions) -> Vec<CompileOutput> {
    let run = || {
        units
            .par_iter()
            .map(|unit| compile(unit, options))
            .collect::<Vec<_>>()
    };
    let Some(jobs) = options.jobs else {
        return run();
    };
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(run),
        Err(err) => {
            tracing::warn!(%err, jobs, "could not build thread pool; using the global pool");
            run()
        }
    }
}

/// Class name derived from a unit name: the file stem with every character
/// that cannot appear in a Java identifier replaced by `_`.
pub fn class_name_for(unit_name: &str) -> String {
    let stem = Path::new(unit_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let mut name: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        return "Main".to_owned();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

fn source_file_name(unit_name: &str) -> String {
    Path::new(unit_name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(unit_name)
        .to_owned()
}
