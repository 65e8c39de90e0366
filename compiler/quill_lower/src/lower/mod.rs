//! AST to IR lowering.
//!
//! - [`ModuleLowerer`] walks items, producing one [`IrFunction`] per Quill
//!   function plus the static initializer, and one [`IrRecord`] per record.
//! - [`FnLowerer`] lowers one body: statements here, expressions in
//!   `expr.rs`.

mod expr;

use quill_ir::{
    BinaryOp, BindingId, Block, ExprId, Function, Module, Name, Span, Stmt, StmtKind,
    StringInterner, Type, VarDecl,
};
use quill_resolve::{Resolution, Symbol, SymbolKind};
use quill_stack::ensure_sufficient_stack;
use quill_types::TypeCheckResult;
use rustc_hash::FxHashMap;

use crate::builder::IrBuilder;
use crate::ir::{
    BlockId, GlobalId, IrConst, IrField, IrFunction, IrGlobal, IrModule, IrRecord, LocalId,
    Operand, RecordId,
};
use crate::{LowerError, LowerResult};

pub(crate) struct ModuleLowerer<'a> {
    module: &'a Module,
    res: &'a Resolution,
    types: &'a TypeCheckResult,
    interner: &'a StringInterner,
}

impl<'a> ModuleLowerer<'a> {
    pub(crate) fn new(
        module: &'a Module,
        res: &'a Resolution,
        types: &'a TypeCheckResult,
        interner: &'a StringInterner,
    ) -> Self {
        ModuleLowerer {
            module,
            res,
            types,
            interner,
        }
    }

    pub(crate) fn run(self) -> LowerResult<IrModule> {
        let globals = self
            .res
            .globals
            .iter()
            .map(|&id| {
                let symbol = self.res.symbol(id);
                IrGlobal {
                    name: symbol.name,
                    ty: symbol.ty.clone(),
                    is_const: symbol.is_const,
                    span: symbol.span,
                }
            })
            .collect();

        let records = self
            .module
            .records()
            .map(|record| IrRecord {
                name: record.name,
                ty: record.ty.clone(),
                fields: record
                    .fields
                    .iter()
                    .map(|f| IrField {
                        name: f.name,
                        ty: f.ty.clone(),
                    })
                    .collect(),
                span: record.span,
            })
            .collect();

        let functions = self
            .module
            .functions()
            .map(|f| self.lower_function(f))
            .collect::<LowerResult<Vec<_>>>()?;

        Ok(IrModule {
            functions,
            globals,
            records,
            static_init: self.lower_static_init()?,
        })
    }

    /// Record id and field index of `base.field`, where `base` has type
    /// `base_ty`.
    fn field_of(&self, base_ty: &Type, field: Name, span: Span) -> LowerResult<(RecordId, u32)> {
        let found = self
            .module
            .records()
            .enumerate()
            .find(|(_, record)| record.ty == *base_ty)
            .and_then(|(index, record)| Some((index, record.field(field)?.0)));
        let Some((record, field)) = found else {
            return Err(LowerError::invariant(
                format!("no field `{}` on `{base_ty}`", self.interner.lookup(field)),
                span,
            ));
        };
        let record = u32::try_from(record)
            .map_err(|_| LowerError::invariant("too many records", span))?;
        let field =
            u32::try_from(field).map_err(|_| LowerError::invariant("too many fields", span))?;
        Ok((RecordId::new(record), field))
    }

    fn lower_function(&self, f: &Function) -> LowerResult<IrFunction> {
        let frame = self.res.frame_size(f.binding) as usize;
        let mut fixed = vec![Type::Error; frame];
        for param in &f.params {
            self.place_local(&mut fixed, param.binding, param.span)?;
        }
        self.collect_block_locals(&f.body, &mut fixed)?;
        if let Some(slot) = fixed.iter().position(Type::contains_error) {
            return Err(LowerError::invariant(
                format!("local slot {slot} of `{}` has no type", self.interner.lookup(f.name)),
                f.span,
            ));
        }

        let mut lowerer = FnLowerer::new(self, fixed, frame);
        lowerer.lower_block(&f.body)?;
        if !lowerer.builder.is_terminated() {
            let end = Span::point(f.body.span.end.saturating_sub(1));
            if f.ret == Type::Void {
                lowerer.builder.terminate_return(None, end);
            } else {
                lowerer.builder.terminate_unreachable(end);
            }
        }

        let params = f.params.iter().map(|p| p.ty.clone()).collect();
        let func = lowerer.builder.finish(f.name, params, f.ret.clone(), f.span);
        tracing::debug!(
            function = self.interner.lookup(f.name),
            blocks = func.blocks.len(),
            locals = func.local_count(),
            instrs = func.instr_count(),
            "lowered function"
        );
        Ok(func)
    }

    /// Record the type of the local declared at `binding`.
    fn place_local(
        &self,
        fixed: &mut [Type],
        binding: BindingId,
        span: Span,
    ) -> LowerResult<()> {
        let symbol = self
            .res
            .binding_symbol(binding)
            .map(|id| self.res.symbol(id))
            .ok_or_else(|| LowerError::invariant("binding without a symbol", span))?;
        let slot = fixed
            .get_mut(symbol.slot as usize)
            .ok_or_else(|| LowerError::invariant("local slot outside the frame", span))?;
        *slot = symbol.ty.clone();
        Ok(())
    }

    fn collect_block_locals(&self, block: &Block, fixed: &mut [Type]) -> LowerResult<()> {
        for stmt in &block.stmts {
            match &stmt.kind {
                StmtKind::Var(decl) => self.place_local(fixed, decl.binding, decl.span)?,
                StmtKind::If {
                    then_block,
                    else_block,
                    ..
                } => {
                    self.collect_block_locals(then_block, fixed)?;
                    if let Some(else_block) = else_block {
                        self.collect_block_locals(else_block, fixed)?;
                    }
                }
                StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                    self.collect_block_locals(body, fixed)?;
                }
                StmtKind::Block(inner) => self.collect_block_locals(inner, fixed)?,
                StmtKind::Expr(_) | StmtKind::Return(_) => {}
                StmtKind::Error => return Err(LowerError::ErrorNode { span: stmt.span }),
            }
        }
        Ok(())
    }

    /// `<clinit>` body: every global initializer in declaration order.
    fn lower_static_init(&self) -> LowerResult<Option<IrFunction>> {
        let inits: Vec<&VarDecl> = self.module.globals().filter(|d| d.init.is_some()).collect();
        let (Some(first), Some(last)) = (inits.first(), inits.last()) else {
            return Ok(None);
        };
        let span = first.span.merge(last.span);

        let mut lowerer = FnLowerer::new(self, Vec::new(), 0);
        for decl in inits {
            let mark = lowerer.live_temps.len();
            if let Some(init) = decl.init {
                let value = lowerer.lower_value(init)?;
                let global = lowerer.global_of(decl.binding, decl.span)?;
                lowerer.builder.emit_store_global(global, value, decl.span);
            }
            lowerer.release_temps(mark);
        }
        lowerer.builder.terminate_return(None, span);
        let name = self.interner.intern("<clinit>");
        Ok(Some(lowerer.builder.finish(name, Vec::new(), Type::Void, span)))
    }
}

/// Lowers one function body.
pub(crate) struct FnLowerer<'m, 'a> {
    cx: &'m ModuleLowerer<'a>,
    builder: IrBuilder,
    /// Locals below this are parameters and declared variables.
    frame: usize,
    /// Released temporaries, by type.
    free_temps: FxHashMap<Type, Vec<LocalId>>,
    /// Temporaries held by the statements currently being lowered.
    live_temps: Vec<LocalId>,
}

impl<'m, 'a> FnLowerer<'m, 'a> {
    fn new(cx: &'m ModuleLowerer<'a>, fixed: Vec<Type>, frame: usize) -> Self {
        FnLowerer {
            cx,
            builder: IrBuilder::new(fixed),
            frame,
            free_temps: FxHashMap::default(),
            live_temps: Vec::new(),
        }
    }

    /// A temporary of type `ty`, reusing a released one when possible.
    fn temp(&mut self, ty: &Type) -> LocalId {
        let local = self
            .free_temps
            .get_mut(ty)
            .and_then(Vec::pop)
            .unwrap_or_else(|| self.builder.fresh_local(ty.clone()));
        self.live_temps.push(local);
        local
    }

    /// Return temporaries acquired since `mark` to the free lists.
    fn release_temps(&mut self, mark: usize) {
        for local in self.live_temps.drain(mark..) {
            let ty = self.builder.local_type(local).clone();
            self.free_temps.entry(ty).or_default().push(local);
        }
    }

    fn is_temp(&self, local: LocalId) -> bool {
        local.index() >= self.frame
    }

    fn symbol_of(&self, expr: ExprId) -> LowerResult<&'a Symbol> {
        let res = self.cx.res;
        let span = self.cx.module.arena.span(expr);
        let symbol = res
            .expr_symbol(expr)
            .map(|id| res.symbol(id))
            .ok_or_else(|| LowerError::invariant("identifier was never resolved", span))?;
        if symbol.kind == SymbolKind::Error {
            return Err(LowerError::ErrorNode { span });
        }
        Ok(symbol)
    }

    fn global_of(&self, binding: BindingId, span: Span) -> LowerResult<GlobalId> {
        let res = self.cx.res;
        res.binding_symbol(binding)
            .map(|id| GlobalId::new(res.symbol(id).slot))
            .ok_or_else(|| LowerError::invariant("global without a symbol", span))
    }

    // Statements

    fn lower_block(&mut self, block: &Block) -> LowerResult<()> {
        for stmt in &block.stmts {
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> LowerResult<()> {
        // Code after a `return` goes to a block nothing jumps to.
        if self.builder.is_terminated() {
            let dead = self.builder.new_block();
            self.builder.position_at(dead);
        }
        let mark = self.live_temps.len();
        ensure_sufficient_stack(|| self.lower_stmt_kind(stmt))?;
        self.release_temps(mark);
        Ok(())
    }

    fn lower_stmt_kind(&mut self, stmt: &Stmt) -> LowerResult<()> {
        match &stmt.kind {
            StmtKind::Var(decl) => self.lower_local_decl(decl),
            StmtKind::Expr(expr) => self.lower_effect(*expr),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => self.lower_if(*cond, then_block, else_block.as_ref(), stmt.span),
            StmtKind::While { cond, body } => self.lower_while(*cond, body, stmt.span),
            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            } => self.lower_for(*var, [*start, *end, *step], body, stmt.span),
            StmtKind::Return(value) => {
                let value = value.map(|v| self.lower_value(v)).transpose()?;
                self.builder.terminate_return(value, stmt.span);
                Ok(())
            }
            StmtKind::Block(block) => self.lower_block(block),
            StmtKind::Error => Err(LowerError::ErrorNode { span: stmt.span }),
        }
    }

    fn lower_local_decl(&mut self, decl: &VarDecl) -> LowerResult<()> {
        let res = self.cx.res;
        let symbol = res
            .binding_symbol(decl.binding)
            .map(|id| res.symbol(id))
            .ok_or_else(|| LowerError::invariant("local without a symbol", decl.span))?;
        let slot = LocalId::new(symbol.slot);
        let value = match decl.init {
            Some(init) => self.lower_value(init)?,
            None => Operand::Const(IrConst::default_for(&decl.ty)),
        };
        self.builder.emit_copy(slot, value, decl.span);
        Ok(())
    }

    fn lower_if(
        &mut self,
        cond: ExprId,
        then_body: &Block,
        else_body: Option<&Block>,
        span: Span,
    ) -> LowerResult<()> {
        let cond = self.lower_value(cond)?;
        let then_block = self.builder.new_block();
        let else_block = else_body.map(|_| self.builder.new_block());
        let merge = self.builder.new_block();
        self.builder
            .terminate_branch(cond, then_block, else_block.unwrap_or(merge), span);

        self.builder.position_at(then_block);
        self.lower_block(then_body)?;
        self.jump_if_open(merge, then_body.span);

        if let (Some(block), Some(body)) = (else_block, else_body) {
            self.builder.position_at(block);
            self.lower_block(body)?;
            self.jump_if_open(merge, body.span);
        }
        self.builder.position_at(merge);
        Ok(())
    }

    fn lower_while(&mut self, cond: ExprId, body: &Block, span: Span) -> LowerResult<()> {
        let header = self.builder.new_block();
        let body_block = self.builder.new_block();
        let exit = self.builder.new_block();
        self.builder.terminate_jump(header, span);

        self.builder.position_at(header);
        let cond = self.lower_value(cond)?;
        self.builder.terminate_branch(cond, body_block, exit, span);

        self.builder.position_at(body_block);
        self.lower_block(body)?;
        self.jump_if_open(header, body.span);

        self.builder.position_at(exit);
        Ok(())
    }

    /// `for (v, start, end, step) body` runs as
    /// `v = start; while (v < end) { body; v = v + step; }`.
    fn lower_for(
        &mut self,
        var: ExprId,
        [start, end, step]: [ExprId; 3],
        body: &Block,
        span: Span,
    ) -> LowerResult<()> {
        let var_span = self.cx.module.arena.span(var);
        let var_ty = self.cx.types.ty(var).clone();
        if !var_ty.is_numeric() {
            return Err(LowerError::invariant(
                format!("`for` variable of type `{var_ty}` reached lowering"),
                var_span,
            ));
        }
        let init = self.lower_value(start)?;
        self.write_variable(var, init, var_span)?;

        let header = self.builder.new_block();
        let body_block = self.builder.new_block();
        let step_block = self.builder.new_block();
        let exit = self.builder.new_block();
        self.builder.terminate_jump(header, span);

        self.builder.position_at(header);
        let current = self.read_variable(var)?;
        let current = self.stabilize(current, &[end], var_span);
        let bound = self.lower_value(end)?;
        let cond = self.temp(&Type::BOOL);
        self.builder.emit_binary(
            cond,
            BinaryOp::Lt,
            var_ty.clone(),
            current,
            bound,
            var_span,
        );
        self.builder
            .terminate_branch(Operand::Local(cond), body_block, exit, span);

        self.builder.position_at(body_block);
        self.lower_block(body)?;
        self.jump_if_open(step_block, body.span);

        self.builder.position_at(step_block);
        let step_span = self.cx.module.arena.span(step);
        let current = self.read_variable(var)?;
        let current = self.stabilize(current, &[step], var_span);
        let increment = self.lower_value(step)?;
        let next = self.temp(&var_ty);
        self.builder.emit_binary(
            next,
            BinaryOp::Add,
            var_ty,
            current,
            increment,
            step_span,
        );
        self.write_variable(var, Operand::Local(next), step_span)?;
        self.builder.terminate_jump(header, span);

        self.builder.position_at(exit);
        Ok(())
    }

    fn jump_if_open(&mut self, target: BlockId, span: Span) {
        if !self.builder.is_terminated() {
            self.builder.terminate_jump(target, span);
        }
    }
}
