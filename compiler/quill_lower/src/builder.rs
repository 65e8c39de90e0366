//! Incremental construction of an [`IrFunction`].

use quill_ir::{BinaryOp, Name, Span, Type, UnaryOp};

use crate::ir::{
    BlockId, Callee, GlobalId, Instr, IrBlock, IrFunction, LocalId, Operand, RecordId, Terminator,
};

/// Block under construction.
struct BlockBuilder {
    id: BlockId,
    instrs: Vec<Instr>,
    spans: Vec<Span>,
    terminator: Option<(Terminator, Span)>,
}

impl BlockBuilder {
    fn new(id: BlockId) -> Self {
        BlockBuilder {
            id,
            instrs: Vec::new(),
            spans: Vec::new(),
            terminator: None,
        }
    }
}

/// Builder for one function body.
///
/// Position at a block, emit instructions, terminate. Each block is
/// terminated at most once; emitting into a terminated block is a bug in
/// the caller.
pub struct IrBuilder {
    blocks: Vec<BlockBuilder>,
    current: BlockId,
    local_types: Vec<Type>,
}

impl IrBuilder {
    /// Create a builder whose first locals have the given types
    /// (parameters, then declared variables). The entry block is allocated.
    pub fn new(fixed_locals: Vec<Type>) -> Self {
        IrBuilder {
            blocks: vec![BlockBuilder::new(BlockId::new(0))],
            current: BlockId::new(0),
            local_types: fixed_locals,
        }
    }

    #[inline]
    pub fn entry_block(&self) -> BlockId {
        BlockId::new(0)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(BlockBuilder::new(id));
        id
    }

    pub fn position_at(&mut self, block: BlockId) {
        debug_assert!(
            block.index() < self.blocks.len(),
            "{block:?} out of bounds (have {} blocks)",
            self.blocks.len()
        );
        self.current = block;
    }

    #[inline]
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.blocks[self.current.index()].terminator.is_some()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn fresh_local(&mut self, ty: Type) -> LocalId {
        let id = LocalId::new(self.local_types.len() as u32);
        self.local_types.push(ty);
        id
    }

    pub fn local_type(&self, local: LocalId) -> &Type {
        &self.local_types[local.index()]
    }

    fn push(&mut self, instr: Instr, span: Span) {
        let current = self.current;
        let block = &mut self.blocks[current.index()];
        debug_assert!(
            block.terminator.is_none(),
            "emitting into terminated block {current:?}"
        );
        tracing::trace!(block = ?current, ?instr, "emit");
        block.instrs.push(instr);
        block.spans.push(span);
    }

    // Instructions

    pub fn emit_copy(&mut self, dst: LocalId, src: Operand, span: Span) {
        self.push(Instr::Copy { dst, src }, span);
    }

    pub fn emit_binary(
        &mut self,
        dst: LocalId,
        op: BinaryOp,
        operand_ty: Type,
        left: Operand,
        right: Operand,
        span: Span,
    ) {
        debug_assert!(!op.is_logical(), "`{}` must be lowered to branches", op.as_symbol());
        self.push(
            Instr::Binary {
                dst,
                op,
                operand_ty,
                left,
                right,
            },
            span,
        );
    }

    pub fn emit_unary(
        &mut self,
        dst: LocalId,
        op: UnaryOp,
        operand_ty: Type,
        operand: Operand,
        span: Span,
    ) {
        self.push(
            Instr::Unary {
                dst,
                op,
                operand_ty,
                operand,
            },
            span,
        );
    }

    pub fn emit_widen(&mut self, dst: LocalId, src: Operand, span: Span) {
        self.push(Instr::Widen { dst, src }, span);
    }

    pub fn emit_call(
        &mut self,
        dst: Option<LocalId>,
        callee: Callee,
        args: Vec<Operand>,
        span: Span,
    ) {
        self.push(Instr::Call { dst, callee, args }, span);
    }

    pub fn emit_load_global(&mut self, dst: LocalId, global: GlobalId, span: Span) {
        self.push(Instr::LoadGlobal { dst, global }, span);
    }

    pub fn emit_store_global(&mut self, global: GlobalId, value: Operand, span: Span) {
        self.push(Instr::StoreGlobal { global, value }, span);
    }

    pub fn emit_new_array(&mut self, dst: LocalId, elem: Type, len: Operand, span: Span) {
        self.push(Instr::NewArray { dst, elem, len }, span);
    }

    pub fn emit_load_index(&mut self, dst: LocalId, array: Operand, index: Operand, span: Span) {
        self.push(Instr::LoadIndex { dst, array, index }, span);
    }

    pub fn emit_store_index(&mut self, array: Operand, index: Operand, value: Operand, span: Span) {
        self.push(
            Instr::StoreIndex {
                array,
                index,
                value,
            },
            span,
        );
    }

    pub fn emit_new_record(
        &mut self,
        dst: LocalId,
        record: RecordId,
        args: Vec<Operand>,
        span: Span,
    ) {
        self.push(Instr::NewRecord { dst, record, args }, span);
    }

    pub fn emit_load_field(
        &mut self,
        dst: LocalId,
        object: Operand,
        record: RecordId,
        field: u32,
        span: Span,
    ) {
        self.push(
            Instr::LoadField {
                dst,
                object,
                record,
                field,
            },
            span,
        );
    }

    pub fn emit_store_field(
        &mut self,
        object: Operand,
        record: RecordId,
        field: u32,
        value: Operand,
        span: Span,
    ) {
        self.push(
            Instr::StoreField {
                object,
                record,
                field,
                value,
            },
            span,
        );
    }

    // Terminators

    fn terminate(&mut self, terminator: Terminator, span: Span) {
        let current = self.current;
        let block = &mut self.blocks[current.index()];
        debug_assert!(
            block.terminator.is_none(),
            "block {current:?} already terminated"
        );
        tracing::trace!(block = ?current, ?terminator, "terminate");
        block.terminator = Some((terminator, span));
    }

    pub fn terminate_return(&mut self, value: Option<Operand>, span: Span) {
        self.terminate(Terminator::Return(value), span);
    }

    pub fn terminate_jump(&mut self, target: BlockId, span: Span) {
        self.terminate(Terminator::Jump(target), span);
    }

    pub fn terminate_branch(
        &mut self,
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
        span: Span,
    ) {
        self.terminate(
            Terminator::Branch {
                cond,
                then_block,
                else_block,
            },
            span,
        );
    }

    pub fn terminate_unreachable(&mut self, span: Span) {
        self.terminate(Terminator::Unreachable, span);
    }

    /// Consume the builder.
    ///
    /// Blocks that were never terminated (dead blocks lowering opened and
    /// left empty) get `Unreachable`.
    pub fn finish(self, name: Name, params: Vec<Type>, ret: Type, span: Span) -> IrFunction {
        let blocks = self
            .blocks
            .into_iter()
            .map(|bb| {
                let (terminator, terminator_span) =
                    bb.terminator.unwrap_or((Terminator::Unreachable, span));
                IrBlock {
                    id: bb.id,
                    instrs: bb.instrs,
                    spans: bb.spans,
                    terminator,
                    terminator_span,
                }
            })
            .collect();
        IrFunction {
            name,
            params,
            ret,
            local_types: self.local_types,
            blocks,
            entry: BlockId::new(0),
            span,
        }
    }
}
