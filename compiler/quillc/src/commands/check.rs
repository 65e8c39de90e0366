//! The `check` command: run the front end and report diagnostics.

use std::path::PathBuf;

use quill_diagnostic::emitter::ColorMode;

use super::{read_source, report, DriverError, Outcome};
use crate::check;

pub fn check_files(paths: &[PathBuf], color: ColorMode) -> Result<Outcome, DriverError> {
    let mut failed = false;
    for path in paths {
        let unit = read_source(path)?;
        let output = check(&unit);
        report(&unit, &output, color);
        if output.has_errors() {
            failed = true;
        } else {
            println!("OK: {}", unit.name);
        }
    }
    Ok(Outcome::from_errors(failed))
}
