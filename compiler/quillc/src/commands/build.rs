//! The `build` command: compile source files and write class files.

use std::path::{Path, PathBuf};

use quill_diagnostic::emitter::ColorMode;

use super::{read_source, report, DriverError, Outcome};
use crate::{compile_batch, CompileOptions, SourceUnit};

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub compile: CompileOptions,
    /// Directory for the generated `.class` files; the working directory
    /// when unset.
    pub output_dir: Option<PathBuf>,
    pub color: ColorMode,
}

/// Compile every file and write the class files of each successful unit:
/// its main class plus one per record.
///
/// All files are read before any is compiled, so an unreadable path fails
/// the whole build without partial output.
pub fn build_files(paths: &[PathBuf], options: &BuildOptions) -> Result<Outcome, DriverError> {
    let units = paths
        .iter()
        .map(|path| read_source(path))
        .collect::<Result<Vec<SourceUnit>, _>>()?;

    let outputs = compile_batch(&units, &options.compile);

    let out_dir = options.output_dir.as_deref().unwrap_or(Path::new("."));
    let mut failed = false;
    for (unit, output) in units.iter().zip(&outputs) {
        report(unit, output, options.color);
        let Some(artifact) = &output.artifact else {
            failed = true;
            continue;
        };
        for (class_name, bytes) in artifact.classes() {
            let path = class_file_path(out_dir, class_name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| DriverError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, bytes).map_err(|source| DriverError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::info!(
                unit = %unit.name,
                path = %path.display(),
                bytes = bytes.len(),
                "wrote class file"
            );
        }
    }
    Ok(Outcome::from_errors(failed))
}

/// `out_dir/<ClassName>.class`; package segments of `demo/Main` become
/// directories.
fn class_file_path(out_dir: &Path, class_name: &str) -> PathBuf {
    let mut path = out_dir.to_path_buf();
    path.extend(class_name.split('/'));
    path.set_extension("class");
    path
}
