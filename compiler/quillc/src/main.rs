//! `quill`: command-line interface of the Quill compiler.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use quill_diagnostic::emitter::ColorMode;
use quillc::commands::{
    build_files, check_files, explain_error, lex_file, parse_file, BuildOptions, DriverError,
    Outcome,
};
use quillc::{init_tracing, CompileOptions, TargetVersion};

/// Compile Quill programs to JVM class files.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// When to color diagnostics
    #[arg(long, global = true, value_enum, default_value_t = Color::Auto)]
    color: Color,

    /// Print tracing spans as a tree (requires RUST_LOG)
    #[arg(long, global = true)]
    trace_tree: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile source files to class files
    #[command(alias = "b")]
    Build(BuildArgs),

    /// Report diagnostics without generating code
    #[command(alias = "c")]
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the token stream of a file
    Lex { file: PathBuf },

    /// Print an outline of the parsed file
    Parse { file: PathBuf },

    /// Explain a diagnostic code such as E3001
    Explain { code: String },
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory for class files
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Emit line number and source file debug info
    #[arg(short = 'g', long = "debug")]
    debug_info: bool,

    /// Class file major version
    #[arg(long, default_value_t = 49, value_parser = parse_target)]
    target: u16,

    /// Number of files compiled in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Class name, when compiling a single file
    #[arg(long, value_name = "NAME")]
    class_name: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

impl From<Color> for ColorMode {
    fn from(color: Color) -> Self {
        match color {
            Color::Auto => ColorMode::Auto,
            Color::Always => ColorMode::Always,
            Color::Never => ColorMode::Never,
        }
    }
}

fn parse_target(value: &str) -> Result<u16, String> {
    let major: u16 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a class file version"))?;
    match TargetVersion::from_major(major) {
        Some(_) => Ok(major),
        None => Err(format!("unsupported class file version {major} (expected 49 or 50)")),
    }
}

fn run(cli: Cli) -> Result<Outcome, DriverError> {
    let color = ColorMode::from(cli.color);
    match cli.command {
        Command::Build(args) => {
            let options = BuildOptions {
                compile: CompileOptions {
                    emit_debug_info: args.debug_info,
                    target_version: TargetVersion::from_major(args.target).unwrap_or_default(),
                    class_name: args.class_name,
                    jobs: args.jobs,
                },
                output_dir: args.output,
                color,
            };
            build_files(&args.files, &options)
        }
        Command::Check { files } => check_files(&files, color),
        Command::Lex { file } => lex_file(&file, color),
        Command::Parse { file } => parse_file(&file, color),
        Command::Explain { code } => explain_error(&code).map(|()| Outcome::Success),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.trace_tree);
    match run(cli) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Failure) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
