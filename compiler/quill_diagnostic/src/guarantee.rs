//! Proof that an error was reported.

/// Zero-sized proof that at least one error diagnostic was recorded.
///
/// Only [`DiagnosticQueue`](crate::queue::DiagnosticQueue) hands these out,
/// so a function returning `Err(ErrorGuaranteed)` cannot fail silently.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    pub(crate) fn new() -> Self {
        ErrorGuaranteed(())
    }

    /// Proof from an error count, if any errors were counted.
    pub fn from_error_count(count: usize) -> Option<Self> {
        (count > 0).then(Self::new)
    }
}
