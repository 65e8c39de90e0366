//! Per-compilation diagnostic collector.
//!
//! One queue exists per compilation unit and every stage appends to it in
//! pipeline order. Diagnostics keep emission order; [`DiagnosticQueue::sorted`]
//! orders them by source position when a caller wants that.

use crate::{Diagnostic, ErrorGuaranteed, Severity};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Stop recording errors after this many (0 = unlimited). Warnings past
    /// the limit are dropped too.
    pub error_limit: usize,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig { error_limit: 0 }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    /// Diagnostics dropped because the error limit was reached.
    suppressed: usize,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            config,
            ..Self::default()
        }
    }

    /// Record a diagnostic.
    ///
    /// Returns `false` if it was dropped because the error limit was reached.
    pub fn push(&mut self, diag: Diagnostic) -> bool {
        if self.limit_reached() {
            self.suppressed += 1;
            return false;
        }
        match diag.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diag);
        true
    }

    /// Record an error and get proof that it was reported.
    pub fn emit_error(&mut self, diag: Diagnostic) -> ErrorGuaranteed {
        debug_assert!(diag.is_error(), "emit_error called with a non-error");
        self.push(diag);
        ErrorGuaranteed::new()
    }

    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.push(diag);
        }
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Proof that errors were reported, if any were.
    pub fn error_guaranteed(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics ordered by primary span start, then severity. Stable, so
    /// diagnostics at the same position keep emission order.
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut sorted = self.diagnostics.clone();
        sorted.sort_by_key(|d| (d.primary_span().map_or(u32::MAX, |s| s.start), d.severity));
        sorted
    }

    /// Take all diagnostics out in emission order, leaving the queue empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        self.warning_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}
