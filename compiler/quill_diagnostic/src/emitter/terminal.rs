//! Human-readable diagnostic output with optional ANSI colors.

use std::io::Write;

use crate::span_utils::LineOffsetTable;
use crate::{Diagnostic, Label, Severity};

use super::DiagnosticEmitter;

mod colors {
    pub const ERROR: &str = "\x1b[1;31m";
    pub const WARNING: &str = "\x1b[1;33m";
    pub const NOTE: &str = "\x1b[1;36m";
    pub const HELP: &str = "\x1b[1;32m";
    pub const BOLD: &str = "\x1b[1m";
    pub const SECONDARY: &str = "\x1b[1;34m";
    pub const RESET: &str = "\x1b[0m";
}

#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Colors when the output is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Source text plus its line table, for snippet rendering.
struct SourceContext<'s> {
    text: &'s str,
    lines: LineOffsetTable,
}

/// Terminal emitter.
///
/// Without a source attached, labels print as raw byte spans. With
/// [`with_source`](Self::with_source), labels print as `file:line:col`
/// followed by the offending line and a caret underline.
pub struct TerminalEmitter<'s, W: Write> {
    writer: W,
    colors: bool,
    source: Option<SourceContext<'s>>,
    file_path: Option<String>,
}

impl<'s, W: Write> TerminalEmitter<'s, W> {
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
            source: None,
            file_path: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, text: &'s str) -> Self {
        self.source = Some(SourceContext {
            text,
            lines: LineOffsetTable::build(text),
        });
        self
    }

    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Recover the writer, e.g. to inspect buffered output.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn paint(&mut self, text: &str, color: &str) {
        if self.colors {
            let _ = write!(self.writer, "{color}{text}{}", colors::RESET);
        } else {
            let _ = write!(self.writer, "{text}");
        }
    }

    fn write_label(&mut self, label: &Label) {
        let color = if label.is_primary {
            colors::ERROR
        } else {
            colors::SECONDARY
        };
        let Some(ctx) = &self.source else {
            let marker = if label.is_primary { "-->" } else { "   " };
            let _ = write!(self.writer, "  {marker} {:?}: ", label.span);
            self.paint(&label.message, color);
            let _ = writeln!(self.writer);
            return;
        };

        let (line, col) = ctx.lines.offset_to_line_col(ctx.text, label.span.start);
        let line_text = ctx.lines.line_text(ctx.text, line).unwrap_or("").to_owned();
        let path = self.file_path.as_deref().unwrap_or("<input>");
        let gutter = " ".repeat(line.to_string().len());

        let marker = if label.is_primary { "-->" } else { ":::" };
        let _ = writeln!(self.writer, "{gutter}{marker} {path}:{line}:{col}");
        let _ = writeln!(self.writer, "{gutter} |");
        let _ = writeln!(self.writer, "{line} | {line_text}");

        // Underline up to the end of the span or the end of the line,
        // whichever comes first
        let line_chars = line_text.chars().count();
        let start_col = (col as usize).saturating_sub(1).min(line_chars);
        let (end_line, end_col) = ctx.lines.offset_to_line_col(ctx.text, label.span.end);
        let end_col = if end_line == line {
            (end_col as usize).saturating_sub(1)
        } else {
            line_chars
        };
        let width = end_col.saturating_sub(start_col).max(1);
        let mark = if label.is_primary { "^" } else { "-" };
        let _ = write!(self.writer, "{gutter} | {}", " ".repeat(start_col));
        self.paint(&mark.repeat(width), color);
        if !label.message.is_empty() {
            let _ = write!(self.writer, " ");
            self.paint(&label.message, color);
        }
        let _ = writeln!(self.writer);
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<'_, W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        let color = match diagnostic.severity {
            Severity::Error => colors::ERROR,
            Severity::Warning => colors::WARNING,
            Severity::Note => colors::NOTE,
        };
        self.paint(&diagnostic.severity.to_string(), color);
        self.paint(&format!("[{}]", diagnostic.code), colors::BOLD);
        let _ = writeln!(self.writer, ": {}", diagnostic.message);

        for label in &diagnostic.labels {
            self.write_label(label);
        }

        for note in &diagnostic.notes {
            let _ = write!(self.writer, "  = ");
            self.paint("note", colors::BOLD);
            let _ = writeln!(self.writer, ": {note}");
        }

        for suggestion in &diagnostic.suggestions {
            let _ = write!(self.writer, "  = ");
            self.paint("help", colors::HELP);
            let _ = writeln!(self.writer, ": {suggestion}");
        }

        let _ = writeln!(self.writer);
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count > 0 {
            self.paint("error", colors::ERROR);
            let error_part = if error_count == 1 {
                "previous error".to_string()
            } else {
                format!("{error_count} previous errors")
            };
            if warning_count > 0 {
                let _ = writeln!(
                    self.writer,
                    ": aborting due to {error_part}; {warning_count} warning{} emitted",
                    plural_s(warning_count)
                );
            } else {
                let _ = writeln!(self.writer, ": aborting due to {error_part}");
            }
        } else if warning_count > 0 {
            self.paint("warning", colors::WARNING);
            let _ = writeln!(
                self.writer,
                ": {warning_count} warning{} emitted",
                plural_s(warning_count)
            );
        }
    }
}
