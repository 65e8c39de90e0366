//! JVM back end for Quill.
//!
//! Turns an [`IrModule`] into one main class plus one class per record.
//! Each Quill function becomes a `public static` method of the main class,
//! globals become static fields, and the global initializers run in
//! `<clinit>`. Record classes are named after the record and carry public
//! fields, a constructor and `toString`.
//!
//! Code generation targets class file versions 49 (Java 5) and 50
//! (Java 6), which verify without `StackMapTable` frames.
//!
//! # Passes
//!
//! 1. Per method, the reachable blocks are laid out in order while the
//!    [`Assembler`](assembler::Assembler) records label offsets and
//!    placeholder jumps, tracking operand-stack depth as it goes.
//! 2. [`Assembler::finish`](assembler::Assembler::finish) patches each jump
//!    with its relative offset.
//!
//! Any failure is a [`CodegenError`] and no class is produced.
//!
//! # Tracing
//!
//! - `RUST_LOG=quill_jvm=debug`: one event per method with its size and
//!   `max_stack`.
//! - `RUST_LOG=quill_jvm=trace`: every constant pool entry and built-in
//!   call.

#![allow(clippy::cast_possible_truncation)]

pub mod assembler;
pub mod class_file;
mod codegen;
pub mod constant_pool;
pub mod descriptor;
mod error;
pub mod opcodes;

pub use class_file::ClassFile;
pub use error::{CodegenError, CodegenResult};

use quill_diagnostic::span_utils::LineOffsetTable;
use quill_ir::StringInterner;
use quill_lower::IrModule;

/// Class file major version.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum TargetVersion {
    /// 49
    #[default]
    Java5,
    /// 50
    Java6,
}

impl TargetVersion {
    pub const fn major(self) -> u16 {
        match self {
            TargetVersion::Java5 => 49,
            TargetVersion::Java6 => 50,
        }
    }

    pub const fn from_major(major: u16) -> Option<Self> {
        match major {
            49 => Some(TargetVersion::Java5),
            50 => Some(TargetVersion::Java6),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CodegenConfig {
    /// Internal class name, e.g. `Main` or `demo/Main`.
    pub class_name: String,
    pub target: TargetVersion,
    /// Emit `LineNumberTable` and, with `source_file`, `SourceFile`.
    pub emit_debug_info: bool,
    pub source_file: Option<String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            class_name: "Main".to_owned(),
            target: TargetVersion::default(),
            emit_debug_info: false,
            source_file: None,
        }
    }
}

/// Generate the class for `ir`.
///
/// `lines` maps spans of `ir` to source lines for debug info.
#[tracing::instrument(level = "debug", skip_all, fields(class = %config.class_name))]
pub fn generate(
    ir: &IrModule,
    config: &CodegenConfig,
    interner: &StringInterner,
    lines: &LineOffsetTable,
) -> CodegenResult<ClassFile> {
    let class = codegen::ClassGenerator::new(ir, config, interner, lines).run()?;
    tracing::debug!(
        constants = class.pool.len(),
        fields = class.fields.len(),
        methods = class.methods.len(),
        "generated class"
    );
    Ok(class)
}

/// Generate one class per record of `ir`, in declaration order.
#[tracing::instrument(level = "debug", skip_all, fields(records = ir.records.len()))]
pub fn generate_records(
    ir: &IrModule,
    config: &CodegenConfig,
    interner: &StringInterner,
) -> CodegenResult<Vec<ClassFile>> {
    ir.records
        .iter()
        .map(|record| codegen::record_class(record, config, interner))
        .collect()
}
