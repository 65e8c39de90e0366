//! Command handlers for the `quill` CLI.
//!
//! Each submodule implements one subcommand. Shared helpers for reading
//! sources and rendering diagnostics live here.

use std::io::{ErrorKind, IsTerminal};
use std::path::{Path, PathBuf};

use quill_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};

use crate::{CompileOutput, SourceUnit};

mod build;
mod check;
mod debug;
mod explain;

pub use build::{build_files, BuildOptions};
pub use check::check_files;
pub use debug::{lex_file, parse_file};
pub use explain::explain_error;

/// Failures of the driver itself, as opposed to diagnostics in the program.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("cannot find file '{}'", path.display())]
    NotFound { path: PathBuf },
    #[error("permission denied reading '{}'", path.display())]
    PermissionDenied { path: PathBuf },
    #[error("'{}' contains invalid UTF-8 data", path.display())]
    InvalidUtf8 { path: PathBuf },
    #[error("error reading '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unknown error code: {0}")]
    UnknownCode(String),
}

/// Whether a command found problems in the program.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn from_errors(has_errors: bool) -> Self {
        if has_errors {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }
}

/// Read a source file into a [`SourceUnit`] named by its path.
pub fn read_source(path: &Path) -> Result<SourceUnit, DriverError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(SourceUnit::new(path.display().to_string(), text)),
        Err(err) => {
            let path = path.to_path_buf();
            Err(match err.kind() {
                ErrorKind::NotFound => DriverError::NotFound { path },
                ErrorKind::PermissionDenied => DriverError::PermissionDenied { path },
                ErrorKind::InvalidData => DriverError::InvalidUtf8 { path },
                _ => DriverError::Read { path, source: err },
            })
        }
    }
}

/// Render every diagnostic of `output` to stderr, followed by a summary.
pub(crate) fn report(unit: &SourceUnit, output: &CompileOutput, color: ColorMode) {
    if output.diagnostics.is_empty() {
        return;
    }
    let is_tty = std::io::stderr().is_terminal();
    let mut emitter = TerminalEmitter::with_color_mode(std::io::stderr().lock(), color, is_tty)
        .with_source(&unit.text)
        .with_file_path(unit.name.as_str());
    emitter.emit_all(&output.diagnostics);
    emitter.emit_summary(output.error_count(), output.warning_count());
    emitter.flush();
}
