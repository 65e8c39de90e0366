//! Checker state, items and statements.

mod expr;

use quill_ir::{
    Block, ExprId, Function, Item, Module, Span, Stmt, StmtKind, StringInterner, Type, VarDecl,
};
use quill_resolve::{Resolution, SymbolKind};
use quill_stack::ensure_sufficient_stack;
use rustc_hash::FxHashSet;

use crate::error::{Expected, TypeError, TypeErrorKind, UnreachableCode};
use crate::returns::{always_returns, stmt_always_returns};
use crate::TypeCheckResult;

pub(crate) struct Checker<'a> {
    module: &'a Module,
    res: &'a Resolution,
    interner: &'a StringInterner,
    expr_types: Vec<Type>,
    widened: FxHashSet<ExprId>,
    errors: Vec<TypeError>,
    warnings: Vec<UnreachableCode>,
    /// Return type of the function being checked.
    ret: Type,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(
        module: &'a Module,
        res: &'a Resolution,
        interner: &'a StringInterner,
    ) -> Self {
        Checker {
            module,
            res,
            interner,
            expr_types: vec![Type::Error; module.arena.len()],
            widened: FxHashSet::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
            ret: Type::Void,
        }
    }

    pub(crate) fn run(mut self) -> TypeCheckResult {
        let module = self.module;
        for item in module.items() {
            match item {
                Item::Global(decl) => self.check_var_decl(decl),
                Item::Function(f) => self.check_function(f),
                Item::Record(record) => {
                    for field in &record.fields {
                        self.check_storable(&field.ty, field.ty_span);
                    }
                }
            }
        }
        TypeCheckResult {
            expr_types: self.expr_types,
            widened: self.widened,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    fn error(&mut self, kind: TypeErrorKind, span: Span) {
        self.errors.push(TypeError { kind, span });
    }

    fn mismatch(&mut self, expected: Expected, found: Type, span: Span) {
        self.error(TypeErrorKind::Mismatch { expected, found }, span);
    }

    /// Check that `expr` (already typed `found`) can be stored where
    /// `expected` is required, recording int-to-float widening.
    fn expect_assignable(&mut self, expr: ExprId, found: &Type, expected: &Type) -> bool {
        if found.contains_error() || expected.contains_error() || found == expected {
            return true;
        }
        if *found == Type::INT && *expected == Type::FLOAT {
            self.widened.insert(expr);
            return true;
        }
        let span = self.module.arena.span(expr);
        self.mismatch(Expected::Type(expected.clone()), found.clone(), span);
        false
    }

    /// Require exactly `expected`; used where no conversion applies.
    fn expect_exact(&mut self, expr: ExprId, expected: &Type) {
        let found = self.check_expr(expr);
        if !found.contains_error() && found != *expected {
            let span = self.module.arena.span(expr);
            self.mismatch(Expected::Type(expected.clone()), found, span);
        }
    }

    /// Variables, parameters and array elements cannot be `void`.
    fn check_storable(&mut self, ty: &Type, span: Span) -> bool {
        if ty.is_void_like() {
            self.mismatch(Expected::Storable, ty.clone(), span);
            false
        } else {
            true
        }
    }

    fn check_function(&mut self, f: &Function) {
        for param in &f.params {
            self.check_storable(&param.ty, param.span);
        }
        if let Type::Array(_) = f.ret {
            self.check_storable(&f.ret, f.name_span);
        }
        self.ret = f.ret.clone();
        self.check_block(&f.body);

        if f.ret != Type::Void && !always_returns(&f.body.stmts) {
            self.error(
                TypeErrorKind::MissingReturn {
                    function: self.interner.lookup(f.name).to_string(),
                    ret: f.ret.clone(),
                },
                f.name_span,
            );
        }
    }

    fn check_var_decl(&mut self, decl: &VarDecl) {
        let storable = self.check_storable(&decl.ty, decl.ty_span);
        if let Some(init) = decl.init {
            let found = self.check_expr(init);
            if storable {
                self.expect_assignable(init, &found, &decl.ty);
            }
        }
    }

    fn check_block(&mut self, block: &Block) {
        let mut returned = false;
        let mut unreachable: Option<Span> = None;
        for stmt in &block.stmts {
            if returned {
                unreachable = Some(unreachable.map_or(stmt.span, |s| s.merge(stmt.span)));
            }
            ensure_sufficient_stack(|| self.check_stmt(stmt));
            returned |= stmt_always_returns(stmt);
        }
        if let Some(span) = unreachable {
            self.warnings.push(UnreachableCode { span });
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Var(decl) => self.check_var_decl(decl),
            StmtKind::Expr(expr) => {
                self.check_expr(*expr);
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.expect_exact(*cond, &Type::BOOL);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }
            StmtKind::While { cond, body } => {
                self.expect_exact(*cond, &Type::BOOL);
                self.check_block(body);
            }
            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                let var_ty = self.check_for_variable(*var);
                for bound in [*start, *end, *step] {
                    let found = self.check_expr(bound);
                    if var_ty.is_numeric() {
                        self.expect_assignable(bound, &found, &var_ty);
                    }
                }
                self.check_block(body);
            }
            StmtKind::Return(value) => self.check_return(*value, stmt.span),
            StmtKind::Block(block) => self.check_block(block),
            StmtKind::Error => {}
        }
    }

    /// The loop variable must be a mutable `int` or `float` variable.
    /// Returns its type, or `Error` when it cannot drive the loop.
    fn check_for_variable(&mut self, var: ExprId) -> Type {
        let found = self.check_place(var);
        let span = self.module.arena.span(var);
        let res = self.res;
        let Some(symbol) = res.expr_symbol(var).map(|id| res.symbol(id)) else {
            return Type::Error;
        };
        match symbol.kind {
            SymbolKind::Error => Type::Error,
            SymbolKind::Function | SymbolKind::Builtin(_) | SymbolKind::Record => {
                self.mismatch(Expected::Assignable, found, span);
                Type::Error
            }
            _ if symbol.is_const => {
                let kind = TypeErrorKind::AssignToConstant {
                    name: self.interner.lookup(symbol.name).to_string(),
                    declared: symbol.span,
                };
                self.error(kind, span);
                Type::Error
            }
            _ if found.is_numeric() => found,
            _ => {
                self.mismatch(Expected::Numeric, found, span);
                Type::Error
            }
        }
    }

    fn check_return(&mut self, value: Option<ExprId>, span: Span) {
        let ret = self.ret.clone();
        match value {
            None if ret != Type::Void => {
                self.mismatch(Expected::Type(ret), Type::Void, span);
            }
            None => {}
            Some(value) => {
                let found = self.check_expr(value);
                if ret == Type::Void {
                    if !found.contains_error() {
                        let span = self.module.arena.span(value);
                        self.mismatch(Expected::Type(Type::Void), found, span);
                    }
                } else {
                    self.expect_assignable(value, &found, &ret);
                }
            }
        }
    }
}
