//! AST walk that declares and binds names.

use quill_ir::{
    Block, ExprId, ExprKind, Function, Item, Module, Name, RecordDecl, Span, StmtKind,
    StringInterner, Type, VarDecl,
};
use quill_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use crate::{
    edit_distance, Builtin, Resolution, ResolveError, ResolveErrorKind, ScopeId, ScopeKind,
    ScopeTree, Symbol, SymbolId, SymbolKind, MAX_SUGGESTION_DISTANCE,
};

pub(crate) struct Resolver<'a> {
    module: &'a Module,
    interner: &'a StringInterner,
    out: Resolution,
    current: ScopeId,
    /// Next slot in the function being walked.
    next_slot: u32,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(module: &'a Module, interner: &'a StringInterner) -> Self {
        let error_symbol = Symbol {
            name: Name::EMPTY,
            ty: Type::Error,
            kind: SymbolKind::Error,
            slot: 0,
            is_const: false,
            binding: None,
            span: Span::DUMMY,
        };
        Resolver {
            module,
            interner,
            out: Resolution {
                scopes: ScopeTree::new(),
                symbols: vec![error_symbol],
                expr_symbols: FxHashMap::default(),
                binding_symbols: FxHashMap::default(),
                function_scopes: FxHashMap::default(),
                frame_sizes: FxHashMap::default(),
                globals: Vec::new(),
                errors: Vec::new(),
            },
            current: ScopeId::MODULE,
            next_slot: 0,
        }
    }

    pub(crate) fn run(mut self) -> Resolution {
        self.declare_prelude();
        let module = self.module;

        // Every module-level name is visible to every body, so calls and
        // global reads may refer forward.
        let mut function_index = 0;
        let mut global_index = 0;
        let mut record_index = 0;
        for item in module.items() {
            match item {
                Item::Record(record) => {
                    self.declare(Symbol {
                        name: record.name,
                        ty: record.constructor(),
                        kind: SymbolKind::Record,
                        slot: record_index,
                        is_const: false,
                        binding: Some(record.binding),
                        span: record.name_span,
                    });
                    record_index += 1;
                }
                Item::Function(f) => {
                    self.declare(Symbol {
                        name: f.name,
                        ty: f.signature(),
                        kind: SymbolKind::Function,
                        slot: function_index,
                        is_const: false,
                        binding: Some(f.binding),
                        span: f.name_span,
                    });
                    function_index += 1;
                }
                Item::Global(decl) => {
                    let kind = if decl.is_const {
                        SymbolKind::Constant
                    } else {
                        SymbolKind::Global
                    };
                    if let Some(id) = self.declare_var(decl, kind, global_index) {
                        self.out.globals.push(id);
                        global_index += 1;
                    }
                }
            }
        }

        for item in module.items() {
            match item {
                Item::Function(f) => self.resolve_function(f),
                Item::Global(decl) => {
                    self.check_type(&decl.ty, decl.ty_span);
                    if let Some(init) = decl.init {
                        self.resolve_expr(init);
                    }
                }
                Item::Record(record) => self.resolve_record(record),
            }
        }
        self.out
    }

    /// Field names must be distinct and field types must exist.
    fn resolve_record(&mut self, record: &RecordDecl) {
        let mut seen: FxHashMap<Name, Span> = FxHashMap::default();
        for field in &record.fields {
            self.check_type(&field.ty, field.ty_span);
            if let Some(&first) = seen.get(&field.name) {
                self.out.errors.push(ResolveError {
                    kind: ResolveErrorKind::Duplicate {
                        name: self.interner.lookup(field.name).to_string(),
                        first,
                    },
                    span: field.name_span,
                });
            } else {
                seen.insert(field.name, field.name_span);
            }
        }
    }

    /// Report record types that no `record` item declares.
    fn check_type(&mut self, ty: &Type, span: Span) {
        let Some(name) = ty.innermost().record_name() else {
            return;
        };
        let interned = self.interner.intern(name);
        let declared = self
            .out
            .scopes
            .get(ScopeId::MODULE)
            .get(interned)
            .is_some_and(|id| self.out.symbol(id).kind == SymbolKind::Record);
        if declared {
            return;
        }
        let suggestion = self.closest_record(name);
        tracing::trace!(name, ?suggestion, "unknown type");
        self.out.errors.push(ResolveError {
            kind: ResolveErrorKind::UnknownType {
                name: name.to_string(),
                suggestion,
            },
            span,
        });
    }

    fn closest_record(&self, target: &str) -> Option<String> {
        self.module
            .records()
            .map(|record| self.interner.lookup(record.name))
            .map(|candidate| (candidate, edit_distance(target, candidate)))
            .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(_, distance)| *distance)
            .map(|(name, _)| name.to_string())
    }

    fn declare_prelude(&mut self) {
        for builtin in Builtin::ALL {
            let id = self.push_symbol(Symbol {
                name: self.interner.intern(builtin.name()),
                ty: builtin.signature(),
                kind: SymbolKind::Builtin(builtin),
                slot: 0,
                is_const: false,
                binding: None,
                span: Span::DUMMY,
            });
            let name = self.out.symbols[id.index()].name;
            // Built-in names are distinct, so this cannot collide.
            let _ = self.out.scopes.declare(ScopeId::PRELUDE, name, id);
        }
    }

    fn push_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::new(u32::try_from(self.out.symbols.len()).unwrap_or(u32::MAX));
        if let Some(binding) = symbol.binding {
            self.out.binding_symbols.insert(binding, id);
        }
        self.out.symbols.push(symbol);
        id
    }

    /// Declare a symbol in the current scope. A same-scope duplicate is
    /// reported and the new symbol stays unreachable by name.
    fn declare(&mut self, symbol: Symbol) -> Option<SymbolId> {
        let name = symbol.name;
        let span = symbol.span;
        let id = self.push_symbol(symbol);
        match self.out.scopes.declare(self.current, name, id) {
            Ok(()) => Some(id),
            Err(existing) => {
                let first = self.out.symbol(existing).span;
                self.out.errors.push(ResolveError {
                    kind: ResolveErrorKind::Duplicate {
                        name: self.interner.lookup(name).to_string(),
                        first,
                    },
                    span,
                });
                None
            }
        }
    }

    fn declare_var(&mut self, decl: &VarDecl, kind: SymbolKind, slot: u32) -> Option<SymbolId> {
        self.declare(Symbol {
            name: decl.name,
            ty: decl.ty.clone(),
            kind,
            slot,
            is_const: decl.is_const,
            binding: Some(decl.binding),
            span: decl.name_span,
        })
    }

    fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let scope = self.out.scopes.add_child(self.current, kind);
        self.current = scope;
        scope
    }

    fn exit_scope(&mut self) {
        if let Some(parent) = self.out.scopes.get(self.current).parent {
            self.current = parent;
        }
    }

    fn resolve_function(&mut self, f: &Function) {
        debug_assert_eq!(self.current, ScopeId::MODULE);
        let scope = self.enter_scope(ScopeKind::Function);
        self.out.function_scopes.insert(f.binding, scope);
        self.next_slot = 0;

        self.check_type(&f.ret, f.ret_span);
        for param in &f.params {
            self.check_type(&param.ty, param.span);
            let slot = self.next_slot;
            self.next_slot += 1;
            self.declare(Symbol {
                name: param.name,
                ty: param.ty.clone(),
                kind: SymbolKind::Parameter,
                slot,
                is_const: false,
                binding: Some(param.binding),
                span: param.span,
            });
        }
        // Parameters and top-level body declarations share one scope.
        self.resolve_stmts(&f.body);

        self.out.frame_sizes.insert(f.binding, self.next_slot);
        self.exit_scope();
    }

    fn resolve_block(&mut self, block: &Block) {
        self.enter_scope(ScopeKind::Block);
        self.resolve_stmts(block);
        self.exit_scope();
    }

    fn resolve_stmts(&mut self, block: &Block) {
        for stmt in &block.stmts {
            ensure_sufficient_stack(|| self.resolve_stmt(&stmt.kind));
        }
    }

    fn resolve_stmt(&mut self, stmt: &StmtKind) {
        match stmt {
            StmtKind::Var(decl) => {
                self.check_type(&decl.ty, decl.ty_span);
                // The initializer cannot see the name it initializes.
                if let Some(init) = decl.init {
                    self.resolve_expr(init);
                }
                let slot = self.next_slot;
                self.next_slot += 1;
                self.declare_var(decl, SymbolKind::Local, slot);
            }
            StmtKind::Expr(expr) => self.resolve_expr(*expr),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.resolve_expr(*cond);
                self.resolve_block(then_block);
                if let Some(else_block) = else_block {
                    self.resolve_block(else_block);
                }
            }
            StmtKind::While { cond, body } => {
                self.resolve_expr(*cond);
                self.resolve_block(body);
            }
            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                for expr in [*var, *start, *end, *step] {
                    self.resolve_expr(expr);
                }
                self.resolve_block(body);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.resolve_expr(*value);
                }
            }
            StmtKind::Block(block) => self.resolve_block(block),
            StmtKind::Error => {}
        }
    }

    fn resolve_expr(&mut self, id: ExprId) {
        ensure_sufficient_stack(|| self.resolve_expr_inner(id));
    }

    fn resolve_expr_inner(&mut self, id: ExprId) {
        let module = self.module;
        let arena = &module.arena;
        match arena.kind(id) {
            ExprKind::Ident(name) => {
                let symbol = match self.out.scopes.lookup(self.current, *name) {
                    Some(symbol) => symbol,
                    None => {
                        self.report_undeclared(*name, arena.span(id));
                        SymbolId::ERROR
                    }
                };
                self.out.expr_symbols.insert(id, symbol);
            }
            ExprKind::Binary { left, right, .. } => {
                self.resolve_expr(*left);
                self.resolve_expr(*right);
            }
            ExprKind::Unary { operand, .. } => self.resolve_expr(*operand),
            ExprKind::Call { callee, args } => {
                self.resolve_expr(*callee);
                for arg in args {
                    self.resolve_expr(*arg);
                }
            }
            ExprKind::Index { array, index } => {
                self.resolve_expr(*array);
                self.resolve_expr(*index);
            }
            ExprKind::NewArray { elem, len } => {
                self.check_type(elem, arena.span(id));
                self.resolve_expr(*len);
            }
            // Field names are checked against the record type later.
            ExprKind::Field { base, .. } => self.resolve_expr(*base),
            ExprKind::Assign { target, value } => {
                self.resolve_expr(*target);
                self.resolve_expr(*value);
            }
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Str(_)
            | ExprKind::Error => {}
        }
    }

    fn report_undeclared(&mut self, name: Name, span: Span) {
        let text = self.interner.lookup(name);
        let suggestion = self.closest_visible(text);
        tracing::trace!(name = text, ?suggestion, "undeclared identifier");
        self.out.errors.push(ResolveError {
            kind: ResolveErrorKind::Undeclared {
                name: text.to_string(),
                suggestion,
            },
            span,
        });
    }

    /// Nearest visible name within `MAX_SUGGESTION_DISTANCE`, innermost
    /// scope first on ties.
    fn closest_visible(&self, target: &str) -> Option<String> {
        let mut best: Option<(&str, usize)> = None;
        for name in self.out.scopes.visible_names(self.current) {
            let candidate = self.interner.lookup(name);
            if candidate.len().abs_diff(target.len()) > MAX_SUGGESTION_DISTANCE {
                continue;
            }
            let distance = edit_distance(target, candidate);
            if distance <= MAX_SUGGESTION_DISTANCE
                && best.map_or(true, |(_, d)| distance < d)
            {
                best = Some((candidate, distance));
            }
        }
        best.map(|(name, _)| name.to_string())
    }
}
