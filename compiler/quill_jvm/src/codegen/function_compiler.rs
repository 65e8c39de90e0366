//! Compilation of one [`IrFunction`] into a method body.
//!
//! IR locals map one-to-one onto JVM local slots, so every instruction is
//! "load operands, operate, store result". Blocks are laid out in block
//! order, skipping the ones the entry cannot reach; a jump to the block
//! laid out next is omitted.

use quill_ir::{Span, Type, UnaryOp};
use quill_lower::{
    reachable_blocks, BlockId, Callee, Instr, IrConst, IrFunction, LocalId, Operand, RecordId,
    Terminator,
};

use super::ClassContext;
use crate::assembler::{Assembler, Code, Label, SlotKind};
use crate::constant_pool::ConstantPool;
use crate::descriptor::{array_ops, reference_class_name, return_opcode, slot_kind};
use crate::error::{CodegenError, CodegenResult};
use crate::opcodes as op;

pub(crate) struct MethodCompiler<'g, 'a> {
    pub(super) cx: &'g mut ClassContext<'a>,
    pub(super) func: &'a IrFunction,
    pub(super) asm: Assembler,
    pub(super) name: &'static str,
    labels: Vec<Option<Label>>,
}

impl<'g, 'a> MethodCompiler<'g, 'a> {
    pub fn new(cx: &'g mut ClassContext<'a>, func: &'a IrFunction) -> Self {
        let name = cx.interner.lookup(func.name);
        MethodCompiler {
            cx,
            func,
            asm: Assembler::new(name),
            name,
            labels: vec![None; func.blocks.len()],
        }
    }

    /// Emit code that runs before the function body.
    pub fn with_prologue(
        &mut self,
        prologue: impl FnOnce(&mut Assembler, &mut ConstantPool) -> CodegenResult<()>,
    ) -> CodegenResult<()> {
        prologue(&mut self.asm, &mut self.cx.pool)
    }

    pub fn compile(mut self) -> CodegenResult<Code> {
        let func = self.func;
        let layout = reachable_blocks(func);
        for &id in &layout {
            self.labels[id.index()] = Some(self.asm.new_label());
        }
        for (i, &id) in layout.iter().enumerate() {
            let next = layout.get(i + 1).copied();
            let label = self.label(id)?;
            self.asm.bind(label);
            let block = func.block(id);
            for (instr, span) in block.instrs.iter().zip(&block.spans) {
                self.mark_span(*span);
                self.instr(instr)?;
            }
            self.mark_span(block.terminator_span);
            self.terminator(&block.terminator, next)?;
        }
        self.asm.finish()
    }

    fn label(&self, block: BlockId) -> CodegenResult<Label> {
        self.labels[block.index()].ok_or_else(|| {
            CodegenError::invariant(format!(
                "jump to unreachable block {block:?} in `{}`",
                self.name
            ))
        })
    }

    fn mark_span(&mut self, span: Span) {
        if self.cx.config.emit_debug_info && span != Span::DUMMY {
            let line = self.cx.lines.line_from_offset(span.start);
            self.asm.mark_line(line);
        }
    }

    // Operands

    fn slot(&self, local: LocalId) -> CodegenResult<u16> {
        u16::try_from(local.raw()).map_err(|_| CodegenError::TooManyLocals {
            method: self.name.to_owned(),
            count: local.index() + 1,
        })
    }

    pub(super) fn load(&mut self, operand: Operand) -> CodegenResult<()> {
        match operand {
            Operand::Local(local) => {
                let kind = slot_kind(self.func.local_type(local))?;
                let slot = self.slot(local)?;
                self.asm.load(kind, slot);
            }
            Operand::Const(constant) => self.push_const(constant)?,
        }
        Ok(())
    }

    fn push_const(&mut self, constant: IrConst) -> CodegenResult<()> {
        match constant {
            IrConst::Int(value) => self.asm.push_int(value, &mut self.cx.pool)?,
            IrConst::Float(bits) => self.asm.push_float(bits, &mut self.cx.pool)?,
            IrConst::Bool(value) => {
                let opcode = if value { op::ICONST_1 } else { op::ICONST_0 };
                self.asm.insn(opcode, 0, 1);
            }
            IrConst::Str(name) => {
                let text = self.cx.interner.lookup(name);
                self.asm.push_string(text, &mut self.cx.pool)?;
            }
            IrConst::Null => self.asm.insn(op::ACONST_NULL, 0, 1),
        }
        Ok(())
    }

    pub(super) fn store(&mut self, local: LocalId) -> CodegenResult<()> {
        let kind = slot_kind(self.func.local_type(local))?;
        let slot = self.slot(local)?;
        self.asm.store(kind, slot);
        Ok(())
    }

    /// Consume the value a call left on the stack, if any.
    pub(super) fn finish_call(&mut self, produces: bool, dst: Option<LocalId>) -> CodegenResult<()> {
        match (produces, dst) {
            (true, Some(dst)) => self.store(dst),
            (true, None) => {
                self.asm.insn(op::POP, 1, 0);
                Ok(())
            }
            (false, None) => Ok(()),
            (false, Some(dst)) => Err(CodegenError::invariant(format!(
                "`void` call stores into {dst:?} in `{}`",
                self.name
            ))),
        }
    }

    fn array_element(&self, array: Operand) -> CodegenResult<Type> {
        match self.func.operand_type(array) {
            Some(Type::Array(elem)) => Ok(*elem),
            other => Err(CodegenError::invariant(format!(
                "indexing a non-array operand of type {other:?} in `{}`",
                self.name
            ))),
        }
    }

    fn field_ref(&self, record: RecordId, field: u32) -> CodegenResult<u16> {
        self.cx
            .records
            .get(record.index())
            .and_then(|r| r.field_refs.get(field as usize))
            .copied()
            .ok_or_else(|| {
                CodegenError::invariant(format!(
                    "field {field} of {record:?} is not declared in `{}`",
                    self.name
                ))
            })
    }

    // Instructions

    fn instr(&mut self, instr: &Instr) -> CodegenResult<()> {
        match instr {
            Instr::Copy { dst, src } => {
                self.load(*src)?;
                self.store(*dst)
            }
            Instr::Binary {
                dst,
                op: binary,
                operand_ty,
                left,
                right,
            } => {
                self.binary(*binary, operand_ty, *left, *right)?;
                self.store(*dst)
            }
            Instr::Unary {
                dst,
                op: unary,
                operand_ty,
                operand,
            } => {
                self.load(*operand)?;
                match (unary, slot_kind(operand_ty)?) {
                    (UnaryOp::Neg, SlotKind::Float) => self.asm.insn(op::FNEG, 1, 1),
                    (UnaryOp::Neg, _) => self.asm.insn(op::INEG, 1, 1),
                    (UnaryOp::Not, _) => {
                        self.asm.insn(op::ICONST_1, 0, 1);
                        self.asm.insn(op::IXOR, 2, 1);
                    }
                }
                self.store(*dst)
            }
            Instr::Widen { dst, src } => {
                self.load(*src)?;
                self.asm.insn(op::I2F, 1, 1);
                self.store(*dst)
            }
            Instr::Call { dst, callee, args } => match callee {
                Callee::Function(id) => {
                    for &arg in args {
                        self.load(arg)?;
                    }
                    let target = self.cx.functions[id.index()];
                    self.asm.invoke(
                        op::INVOKESTATIC,
                        target.method_ref,
                        target.arg_slots,
                        u16::from(target.returns_value),
                    );
                    self.finish_call(target.returns_value, *dst)
                }
                Callee::Builtin(builtin) => self.builtin(*builtin, args, *dst),
            },
            Instr::LoadGlobal { dst, global } => {
                let field = self.cx.global_refs[global.index()];
                self.asm.static_field(op::GETSTATIC, field);
                self.store(*dst)
            }
            Instr::StoreGlobal { global, value } => {
                self.load(*value)?;
                let field = self.cx.global_refs[global.index()];
                self.asm.static_field(op::PUTSTATIC, field);
                Ok(())
            }
            Instr::NewArray { dst, elem, len } => {
                self.load(*len)?;
                match array_ops(elem)?.atype {
                    Some(atype) => self.asm.new_primitive_array(atype),
                    None => {
                        let class = self.cx.pool.class(&reference_class_name(elem)?)?;
                        self.asm.new_reference_array(class);
                    }
                }
                self.store(*dst)
            }
            Instr::LoadIndex { dst, array, index } => {
                let ops = array_ops(&self.array_element(*array)?)?;
                self.load(*array)?;
                self.load(*index)?;
                self.asm.insn(ops.load, 2, 1);
                self.store(*dst)
            }
            Instr::StoreIndex {
                array,
                index,
                value,
            } => {
                let ops = array_ops(&self.array_element(*array)?)?;
                self.load(*array)?;
                self.load(*index)?;
                self.load(*value)?;
                self.asm.insn(ops.store, 3, 0);
                Ok(())
            }
            Instr::NewRecord { dst, record, args } => {
                let Some(target) = self.cx.records.get(record.index()) else {
                    return Err(CodegenError::invariant(format!(
                        "{record:?} is not declared in `{}`",
                        self.name
                    )));
                };
                let (class, init, arg_slots) = (target.class, target.init_ref, target.arg_slots);
                self.asm.new_object(class);
                self.asm.insn(op::DUP, 1, 2);
                for &arg in args {
                    self.load(arg)?;
                }
                self.asm.invoke(op::INVOKESPECIAL, init, arg_slots, 0);
                self.store(*dst)
            }
            Instr::LoadField {
                dst,
                object,
                record,
                field,
            } => {
                let field_ref = self.field_ref(*record, *field)?;
                self.load(*object)?;
                self.asm.instance_field(op::GETFIELD, field_ref);
                self.store(*dst)
            }
            Instr::StoreField {
                object,
                record,
                field,
                value,
            } => {
                let field_ref = self.field_ref(*record, *field)?;
                self.load(*object)?;
                self.load(*value)?;
                self.asm.instance_field(op::PUTFIELD, field_ref);
                Ok(())
            }
        }
    }

    // Terminators

    fn terminator(&mut self, terminator: &Terminator, next: Option<BlockId>) -> CodegenResult<()> {
        match terminator {
            Terminator::Return(None) => {
                self.asm.terminal(op::RETURN, 0);
            }
            Terminator::Return(Some(value)) => {
                self.load(*value)?;
                let opcode = return_opcode(&self.func.ret)?;
                self.asm.terminal(opcode, 1);
            }
            Terminator::Jump(target) => {
                if next != Some(*target) {
                    let label = self.label(*target)?;
                    self.asm.branch(op::GOTO, label);
                }
            }
            Terminator::Branch {
                cond,
                then_block,
                else_block,
            } => {
                self.load(*cond)?;
                let then_label = self.label(*then_block)?;
                let else_label = self.label(*else_block)?;
                if next == Some(*then_block) {
                    self.asm.branch(op::IFEQ, else_label);
                } else {
                    self.asm.branch(op::IFNE, then_label);
                    if next != Some(*else_block) {
                        self.asm.branch(op::GOTO, else_label);
                    }
                }
            }
            Terminator::Unreachable => {
                self.asm.insn(op::ACONST_NULL, 0, 1);
                self.asm.terminal(op::ATHROW, 1);
            }
        }
        Ok(())
    }
}
