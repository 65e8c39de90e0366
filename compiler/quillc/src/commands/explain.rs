//! The `explain` command: describe a diagnostic code.

use quill_diagnostic::ErrorCode;

use super::DriverError;

/// Print the long-form description of `code`, e.g. `E3001`.
pub fn explain_error(code: &str) -> Result<(), DriverError> {
    let code: ErrorCode = code
        .parse()
        .map_err(|_| DriverError::UnknownCode(code.to_owned()))?;
    println!("{code}: {}", code.kind());
    println!();
    println!("{}", code.description());
    Ok(())
}
