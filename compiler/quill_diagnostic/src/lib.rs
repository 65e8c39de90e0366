//! Diagnostics for the Quill compiler.
//!
//! - [`Diagnostic`]: error or warning with code, stage, labels, notes
//! - [`DiagnosticQueue`]: per-compilation collector every stage appends to
//! - [`ErrorGuaranteed`]: proof that an error was reported
//! - [`span_utils::LineOffsetTable`]: byte offset to line/column mapping
//! - [`emitter`]: terminal rendering

mod diagnostic;
pub mod emitter;
mod error_code;
mod guarantee;
pub mod queue;
pub mod span_utils;

pub use diagnostic::{
    internal_error, type_mismatch, unexpected_token, Diagnostic, Label, Severity, Stage,
};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
