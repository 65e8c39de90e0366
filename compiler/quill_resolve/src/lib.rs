//! Scope resolution for Quill.
//!
//! Binds every identifier expression to a [`Symbol`] and every binding site
//! to the symbol it declares, building a [`ScopeTree`] along the way.
//! Declaration-order slot indices assigned here are the local-variable
//! layout later used by lowering and code generation.

mod error;
mod resolver;
mod scope;
mod symbol;

pub use error::{edit_distance, ResolveError, ResolveErrorKind, MAX_SUGGESTION_DISTANCE};
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbol::{Builtin, Symbol, SymbolId, SymbolKind};

use quill_ir::{BindingId, ExprId, Module, StringInterner};
use rustc_hash::FxHashMap;

/// Output of [`resolve`].
#[derive(Clone, Debug)]
pub struct Resolution {
    pub scopes: ScopeTree,
    /// All symbols; index 0 is the shared error symbol.
    pub symbols: Vec<Symbol>,
    /// Symbol each identifier expression refers to.
    pub expr_symbols: FxHashMap<ExprId, SymbolId>,
    /// Symbol each binding site declares.
    pub binding_symbols: FxHashMap<BindingId, SymbolId>,
    /// Scope holding each function's parameters, keyed by the function's
    /// binding.
    pub function_scopes: FxHashMap<BindingId, ScopeId>,
    /// Slots used by each function's parameters and locals.
    pub frame_sizes: FxHashMap<BindingId, u32>,
    /// Globals and constants in declaration order.
    pub globals: Vec<SymbolId>,
    pub errors: Vec<ResolveError>,
}

impl Resolution {
    #[inline]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Symbol an identifier expression resolved to.
    pub fn expr_symbol(&self, expr: ExprId) -> Option<SymbolId> {
        self.expr_symbols.get(&expr).copied()
    }

    pub fn binding_symbol(&self, binding: BindingId) -> Option<SymbolId> {
        self.binding_symbols.get(&binding).copied()
    }

    pub fn frame_size(&self, function: BindingId) -> u32 {
        self.frame_sizes.get(&function).copied().unwrap_or(0)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Resolve every name in `module`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve(module: &Module, interner: &StringInterner) -> Resolution {
    let resolution = resolver::Resolver::new(module, interner).run();
    tracing::debug!(
        symbols = resolution.symbols.len(),
        scopes = resolution.scopes.len(),
        errors = resolution.errors.len(),
        "resolved"
    );
    resolution
}
