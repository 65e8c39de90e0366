//! Lowering from the checked AST to a basic-block IR.
//!
//! Control flow that is implicit in the tree (`if`, loops, short-circuit
//! `&&`/`||`) becomes explicit jumps between blocks, and implicit
//! int-to-float conversions become [`Instr::Widen`]. Lowering assumes the
//! front end reported no errors; meeting an error node or an `Error` type
//! here is an internal error.

mod builder;
mod graph;
pub mod ir;
mod lower;

pub use builder::IrBuilder;
pub use graph::reachable_blocks;
pub use ir::{
    BlockId, Callee, FunctionId, GlobalId, Instr, IrBlock, IrConst, IrField, IrFunction,
    IrGlobal, IrModule, IrRecord, LocalId, Operand, RecordId, Terminator,
};

use quill_diagnostic::{Diagnostic, Stage};
use quill_ir::{Module, Span, StringInterner};
use quill_resolve::Resolution;
use quill_types::TypeCheckResult;

/// Internal error raised while lowering.
///
/// Every variant means an earlier stage let something invalid through.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum LowerError {
    #[error("error node reached lowering")]
    ErrorNode { span: Span },
    #[error("{message}")]
    Invariant { message: String, span: Span },
}

impl LowerError {
    pub(crate) fn invariant(message: impl Into<String>, span: Span) -> Self {
        LowerError::Invariant {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            LowerError::ErrorNode { span } | LowerError::Invariant { span, .. } => *span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        quill_diagnostic::internal_error(Stage::Lower, self.to_string())
            .with_label(self.span(), "while lowering this")
    }
}

pub type LowerResult<T> = Result<T, LowerError>;

/// Lower a resolved, type-checked module.
#[tracing::instrument(level = "debug", skip_all)]
pub fn lower(
    module: &Module,
    resolution: &Resolution,
    types: &TypeCheckResult,
    interner: &StringInterner,
) -> LowerResult<IrModule> {
    if module.is_error_root() {
        return Err(LowerError::ErrorNode { span: Span::DUMMY });
    }
    let ir = lower::ModuleLowerer::new(module, resolution, types, interner).run()?;
    tracing::debug!(
        functions = ir.functions.len(),
        globals = ir.globals.len(),
        records = ir.records.len(),
        static_init = ir.static_init.is_some(),
        blocks = ir.functions.iter().map(|f| f.blocks.len()).sum::<usize>(),
        "lowered"
    );
    Ok(ir)
}
