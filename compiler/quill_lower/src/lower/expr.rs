//! Expression lowering.

use quill_ir::{BinaryOp, ExprId, ExprKind, Span, Type, UnaryOp};
use quill_resolve::SymbolKind;
use quill_stack::ensure_sufficient_stack;
use smallvec::SmallVec;

use super::FnLowerer;
use crate::ir::{Callee, FunctionId, GlobalId, IrConst, LocalId, Operand, RecordId};
use crate::{LowerError, LowerResult};

impl FnLowerer<'_, '_> {
    /// Lower `id` to an operand, applying the int-to-float widening the
    /// type checker recorded for it.
    pub(super) fn lower_value(&mut self, id: ExprId) -> LowerResult<Operand> {
        let operand = ensure_sufficient_stack(|| self.lower_expr(id))?;
        if !self.cx.types.is_widened(id) {
            return Ok(operand);
        }
        let dst = self.temp(&Type::FLOAT);
        self.builder
            .emit_widen(dst, operand, self.cx.module.arena.span(id));
        Ok(Operand::Local(dst))
    }

    /// Lower an expression statement, discarding its value.
    pub(super) fn lower_effect(&mut self, id: ExprId) -> LowerResult<()> {
        let module = self.cx.module;
        let expr = module.arena.get(id);
        match &expr.kind {
            ExprKind::Call { callee, args } => {
                self.check_typed(id)?;
                self.lower_call(id, *callee, args, expr.span)?;
            }
            ExprKind::Assign { target, value } => {
                self.check_typed(id)?;
                self.lower_assign(*target, *value, expr.span)?;
            }
            _ => {
                self.lower_value(id)?;
            }
        }
        Ok(())
    }

    fn check_typed(&self, id: ExprId) -> LowerResult<Type> {
        let ty = self.cx.types.ty(id);
        if ty.contains_error() {
            return Err(LowerError::ErrorNode {
                span: self.cx.module.arena.span(id),
            });
        }
        Ok(ty.clone())
    }

    fn lower_expr(&mut self, id: ExprId) -> LowerResult<Operand> {
        let ty = self.check_typed(id)?;
        let module = self.cx.module;
        let expr = module.arena.get(id);
        let span = expr.span;
        match &expr.kind {
            ExprKind::Int(value) => Ok(Operand::Const(IrConst::Int(*value))),
            #[allow(clippy::cast_possible_truncation)]
            ExprKind::Float(bits) => Ok(Operand::Const(IrConst::float(
                f64::from_bits(*bits) as f32,
            ))),
            ExprKind::Bool(value) => Ok(Operand::Const(IrConst::Bool(*value))),
            ExprKind::Str(name) => Ok(Operand::Const(IrConst::Str(*name))),
            ExprKind::Ident(_) => self.read_variable(id),
            ExprKind::Binary { op, left, right } if op.is_logical() => {
                self.lower_short_circuit(*op, *left, *right, span)
            }
            ExprKind::Binary { op, left, right } => {
                self.lower_binary(*op, *left, *right, &ty, span)
            }
            ExprKind::Unary { op, operand } => self.lower_unary(*op, *operand, &ty, span),
            ExprKind::Call { callee, args } => self
                .lower_call(id, *callee, args, span)?
                .map(Operand::Local)
                .ok_or_else(|| LowerError::invariant("`void` call used as a value", span)),
            ExprKind::Index { array, index } => {
                let array = self.lower_value(*array)?;
                let array = self.stabilize(array, &[*index], span);
                let index = self.lower_value(*index)?;
                let dst = self.temp(&ty);
                self.builder.emit_load_index(dst, array, index, span);
                Ok(Operand::Local(dst))
            }
            ExprKind::NewArray { elem, len } => {
                let len = self.lower_value(*len)?;
                let dst = self.temp(&ty);
                self.builder.emit_new_array(dst, elem.clone(), len, span);
                Ok(Operand::Local(dst))
            }
            ExprKind::Field { base, field, .. } => {
                let base_ty = self.check_typed(*base)?;
                let (record, field) = self.cx.field_of(&base_ty, *field, span)?;
                let object = self.lower_value(*base)?;
                let dst = self.temp(&ty);
                self.builder
                    .emit_load_field(dst, object, record, field, span);
                Ok(Operand::Local(dst))
            }
            ExprKind::Assign { target, value } => self.lower_assign(*target, *value, span),
            ExprKind::Error => Err(LowerError::ErrorNode { span }),
        }
    }

    /// Type an operand has after widening.
    fn operand_type(&self, id: ExprId) -> Type {
        if self.cx.types.is_widened(id) {
            Type::FLOAT
        } else {
            self.cx.types.ty(id).clone()
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        ty: &Type,
        span: Span,
    ) -> LowerResult<Operand> {
        let operand_ty = self.operand_type(left);
        if operand_ty != self.operand_type(right) {
            return Err(LowerError::invariant(
                format!("`{}` operands disagree after widening", op.as_symbol()),
                span,
            ));
        }
        let lhs = self.lower_value(left)?;
        let lhs = self.stabilize(lhs, &[right], span);
        let rhs = self.lower_value(right)?;
        let dst = self.temp(ty);
        self.builder.emit_binary(dst, op, operand_ty, lhs, rhs, span);
        Ok(Operand::Local(dst))
    }

    /// `a && b` / `a || b`: `b` only runs when `a` does not decide the
    /// result.
    fn lower_short_circuit(
        &mut self,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        span: Span,
    ) -> LowerResult<Operand> {
        let result = self.temp(&Type::BOOL);
        let lhs = self.lower_value(left)?;
        let rhs_block = self.builder.new_block();
        let short_block = self.builder.new_block();
        let merge = self.builder.new_block();
        if op == BinaryOp::And {
            self.builder
                .terminate_branch(lhs, rhs_block, short_block, span);
        } else {
            self.builder
                .terminate_branch(lhs, short_block, rhs_block, span);
        }

        self.builder.position_at(short_block);
        let decided = IrConst::Bool(op == BinaryOp::Or);
        self.builder
            .emit_copy(result, Operand::Const(decided), span);
        self.builder.terminate_jump(merge, span);

        self.builder.position_at(rhs_block);
        let rhs = self.lower_value(right)?;
        self.builder.emit_copy(result, rhs, span);
        self.builder.terminate_jump(merge, span);

        self.builder.position_at(merge);
        Ok(Operand::Local(result))
    }

    fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: ExprId,
        ty: &Type,
        span: Span,
    ) -> LowerResult<Operand> {
        let value = self.lower_value(operand)?;
        let dst = self.temp(ty);
        self.builder.emit_unary(dst, op, ty.clone(), value, span);
        Ok(Operand::Local(dst))
    }

    /// Returns the local holding the result, `None` for `void` calls.
    fn lower_call(
        &mut self,
        id: ExprId,
        callee: ExprId,
        args: &[ExprId],
        span: Span,
    ) -> LowerResult<Option<LocalId>> {
        let callee_span = self.cx.module.arena.span(callee);
        if !matches!(self.cx.module.arena.kind(callee), ExprKind::Ident(_)) {
            return Err(LowerError::invariant(
                "only named functions can be called",
                callee_span,
            ));
        }
        let symbol = self.symbol_of(callee)?;
        let target = match symbol.kind {
            SymbolKind::Function => Some(Callee::Function(FunctionId::new(symbol.slot))),
            SymbolKind::Builtin(builtin) => Some(Callee::Builtin(builtin)),
            SymbolKind::Record => None,
            _ => {
                return Err(LowerError::invariant(
                    "call of a variable reached lowering",
                    callee_span,
                ))
            }
        };

        let mut operands: SmallVec<[Operand; 4]> = SmallVec::with_capacity(args.len());
        for (i, &arg) in args.iter().enumerate() {
            let value = self.lower_value(arg)?;
            operands.push(self.stabilize(value, &args[i + 1..], span));
        }

        let ret = self.check_typed(id)?;
        let Some(target) = target else {
            let dst = self.temp(&ret);
            let record = RecordId::new(symbol.slot);
            self.builder
                .emit_new_record(dst, record, operands.into_vec(), span);
            return Ok(Some(dst));
        };
        let dst = (ret != Type::Void).then(|| self.temp(&ret));
        self.builder
            .emit_call(dst, target, operands.into_vec(), span);
        Ok(dst)
    }

    fn lower_assign(
        &mut self,
        target: ExprId,
        value: ExprId,
        span: Span,
    ) -> LowerResult<Operand> {
        let module = self.cx.module;
        match module.arena.kind(target) {
            ExprKind::Ident(_) => {
                let value = self.lower_value(value)?;
                self.write_variable(target, value, span)?;
                Ok(value)
            }
            ExprKind::Index { array, index } => {
                let array = self.lower_value(*array)?;
                let array = self.stabilize(array, &[*index, value], span);
                let index = self.lower_value(*index)?;
                let index = self.stabilize(index, &[value], span);
                let value = self.lower_value(value)?;
                self.builder.emit_store_index(array, index, value, span);
                Ok(value)
            }
            ExprKind::Field { base, field, .. } => {
                let base_ty = self.check_typed(*base)?;
                let (record, field) = self.cx.field_of(&base_ty, *field, span)?;
                let object = self.lower_value(*base)?;
                let object = self.stabilize(object, &[value], span);
                let value = self.lower_value(value)?;
                self.builder
                    .emit_store_field(object, record, field, value, span);
                Ok(value)
            }
            _ => Err(LowerError::invariant(
                "invalid assignment target reached lowering",
                module.arena.span(target),
            )),
        }
    }

    // Variables

    /// Operand holding the current value of the variable `id` names.
    ///
    /// Locals are used in place; globals are loaded into a temporary.
    pub(super) fn read_variable(&mut self, id: ExprId) -> LowerResult<Operand> {
        let symbol = self.symbol_of(id)?;
        let span = self.cx.module.arena.span(id);
        match symbol.kind {
            SymbolKind::Parameter | SymbolKind::Local => {
                Ok(Operand::Local(LocalId::new(symbol.slot)))
            }
            SymbolKind::Global | SymbolKind::Constant => {
                let dst = self.temp(&symbol.ty);
                self.builder
                    .emit_load_global(dst, GlobalId::new(symbol.slot), span);
                Ok(Operand::Local(dst))
            }
            SymbolKind::Function | SymbolKind::Builtin(_) | SymbolKind::Record => {
                Err(LowerError::invariant(
                    "function used as a value reached lowering",
                    span,
                ))
            }
            SymbolKind::Error => Err(LowerError::ErrorNode { span }),
        }
    }

    pub(super) fn write_variable(
        &mut self,
        id: ExprId,
        value: Operand,
        span: Span,
    ) -> LowerResult<()> {
        let symbol = self.symbol_of(id)?;
        match symbol.kind {
            SymbolKind::Parameter | SymbolKind::Local => {
                self.builder
                    .emit_copy(LocalId::new(symbol.slot), value, span);
                Ok(())
            }
            SymbolKind::Global | SymbolKind::Constant => {
                self.builder
                    .emit_store_global(GlobalId::new(symbol.slot), value, span);
                Ok(())
            }
            _ => Err(LowerError::invariant(
                "assignment to a non-variable reached lowering",
                span,
            )),
        }
    }

    /// Snapshot `operand` if it names a variable that one of `later` may
    /// assign before the operand is consumed.
    pub(super) fn stabilize(&mut self, operand: Operand, later: &[ExprId], span: Span) -> Operand {
        let Operand::Local(local) = operand else {
            return operand;
        };
        if self.is_temp(local) || !later.iter().any(|&e| self.contains_assignment(e)) {
            return operand;
        }
        let ty = self.builder.local_type(local).clone();
        let copy = self.temp(&ty);
        self.builder.emit_copy(copy, operand, span);
        Operand::Local(copy)
    }

    fn contains_assignment(&self, id: ExprId) -> bool {
        let arena = &self.cx.module.arena;
        ensure_sufficient_stack(|| match arena.kind(id) {
            ExprKind::Assign { .. } => true,
            ExprKind::Binary { left, right, .. } => {
                self.contains_assignment(*left) || self.contains_assignment(*right)
            }
            ExprKind::Unary { operand, .. } => self.contains_assignment(*operand),
            ExprKind::Call { args, .. } => args.iter().any(|&a| self.contains_assignment(a)),
            ExprKind::Index { array, index } => {
                self.contains_assignment(*array) || self.contains_assignment(*index)
            }
            ExprKind::NewArray { len, .. } => self.contains_assignment(*len),
            ExprKind::Field { base, .. } => self.contains_assignment(*base),
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Str(_)
            | ExprKind::Ident(_)
            | ExprKind::Error => false,
        })
    }
}
