//! Type checker for Quill.
//!
//! Bottom-up: every expression's type is computed from its children's.
//! `Type::Error` absorbs everything, so one root cause gives one
//! diagnostic.

mod check;
mod error;
mod returns;

pub use error::{Expected, TypeError, TypeErrorKind, UnreachableCode};
pub use returns::always_returns;

use quill_ir::{ExprId, Module, StringInterner, Type};
use quill_resolve::Resolution;
use rustc_hash::FxHashSet;

/// Output of [`typecheck`].
#[derive(Clone, Debug, Default)]
pub struct TypeCheckResult {
    /// Type of each expression, indexed by `ExprId`.
    pub expr_types: Vec<Type>,
    /// Expressions of type `int` used where `float` is expected.
    pub widened: FxHashSet<ExprId>,
    pub errors: Vec<TypeError>,
    pub warnings: Vec<UnreachableCode>,
}

impl TypeCheckResult {
    /// Type of an expression; `Error` for ids the checker never reached.
    pub fn ty(&self, expr: ExprId) -> &Type {
        static ERROR: Type = Type::Error;
        self.expr_types.get(expr.index()).unwrap_or(&ERROR)
    }

    pub fn is_widened(&self, expr: ExprId) -> bool {
        self.widened.contains(&expr)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Type check a resolved module.
#[tracing::instrument(level = "debug", skip_all)]
pub fn typecheck(
    module: &Module,
    resolution: &Resolution,
    interner: &StringInterner,
) -> TypeCheckResult {
    let result = check::Checker::new(module, resolution, interner).run();
    tracing::debug!(
        exprs = result.expr_types.len(),
        widened = result.widened.len(),
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "type checked"
    );
    result
}
