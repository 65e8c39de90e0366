//! Code generation errors.
//!
//! Every variant is an internal error: the IR handed to the generator was
//! well-formed as far as the front end could tell, so a failure here means
//! a compiler bug or a program that exceeds a class file limit.

use quill_diagnostic::{Diagnostic, Stage};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CodegenError {
    #[error("label L{label} in `{method}` was jumped to but never bound")]
    UnresolvedLabel { method: String, label: u32 },
    #[error("branch at offset {at} in `{method}` spans {offset} bytes, beyond the 16-bit range")]
    BranchOutOfRange { method: String, at: u32, offset: i64 },
    #[error("operand stack underflow at offset {at} in `{method}`")]
    StackUnderflow { method: String, at: u32 },
    #[error("`{method}` has {len} bytes of code, over the 65535 byte limit")]
    CodeTooLarge { method: String, len: usize },
    #[error("`{method}` needs {count} local slots, over the 65535 slot limit")]
    TooManyLocals { method: String, count: usize },
    #[error("constant pool has more than 65535 entries")]
    ConstantPoolOverflow,
    #[error("string constant of {len} bytes exceeds the 65535 byte limit")]
    StringTooLong { len: usize },
    #[error("{message}")]
    Invariant { message: String },
}

impl CodegenError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        CodegenError::Invariant {
            message: message.into(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        quill_diagnostic::internal_error(Stage::Codegen, self.to_string())
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
