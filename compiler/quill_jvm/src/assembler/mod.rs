//! Bytecode assembler for one method body.
//!
//! Emission is the first pass: jumps are written with a placeholder offset
//! and remembered as fixups while labels record their byte offset when
//! bound. [`Assembler::finish`] is the second pass that patches every jump.
//!
//! The assembler also tracks operand-stack depth. Each opcode declares how
//! many slots it pops and pushes; a jump records the depth at its target so
//! code after an unconditional transfer resumes at the right depth when the
//! target label is bound.

use crate::constant_pool::ConstantPool;
use crate::error::{CodegenError, CodegenResult};
use crate::opcodes::{self as op, branch_pops, is_conditional_branch};

/// Jump target inside one method.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label(u32);

impl Label {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Local-slot class: which load/store family to use.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SlotKind {
    /// `int` and `bool`.
    Int,
    Float,
    /// Strings and arrays.
    Ref,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line: u16,
}

/// Assembled method body.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Code {
    pub bytes: Vec<u8>,
    pub max_stack: u16,
    pub line_numbers: Vec<LineNumber>,
}

struct Fixup {
    /// Offset of the branch opcode; the JVM measures from here.
    at: u32,
    label: Label,
}

pub struct Assembler {
    method: String,
    code: Vec<u8>,
    labels: Vec<Option<u32>>,
    label_depths: Vec<Option<u16>>,
    fixups: Vec<Fixup>,
    depth: u16,
    max_stack: u16,
    /// False after `goto`, a return or `athrow` until the next label.
    reachable: bool,
    lines: Vec<(u32, u32)>,
    /// First error; reported by `finish`.
    error: Option<CodegenError>,
}

impl Assembler {
    pub fn new(method: impl Into<String>) -> Self {
        Assembler {
            method: method.into(),
            code: Vec::new(),
            labels: Vec::new(),
            label_depths: Vec::new(),
            fixups: Vec::new(),
            depth: 0,
            max_stack: 0,
            reachable: true,
            lines: Vec::new(),
            error: None,
        }
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pc(&self) -> u32 {
        self.code.len() as u32
    }

    #[inline]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        self.label_depths.push(None);
        label
    }

    pub fn bind(&mut self, label: Label) {
        if self.labels[label.index()].is_some() {
            self.fail(CodegenError::invariant(format!(
                "label L{} bound twice in `{}`",
                label.0, self.method
            )));
            return;
        }
        self.labels[label.index()] = Some(self.pc());
        match self.label_depths[label.index()] {
            Some(depth) => {
                if self.reachable && depth != self.depth {
                    self.inconsistent_depth(label, depth);
                }
                self.depth = depth;
            }
            None if !self.reachable => self.depth = 0,
            None => self.label_depths[label.index()] = Some(self.depth),
        }
        self.reachable = true;
    }

    /// Attribute the code emitted from here on to source `line`.
    pub fn mark_line(&mut self, line: u32) {
        let pc = self.pc();
        if let Some(last) = self.lines.last_mut() {
            if last.1 == line {
                return;
            }
            if last.0 == pc {
                last.1 = line;
                return;
            }
        }
        self.lines.push((pc, line));
    }

    fn fail(&mut self, error: CodegenError) {
        if self.error.is_none() {
            tracing::debug!(%error, "assembler error");
            self.error = Some(error);
        }
    }

    fn inconsistent_depth(&mut self, label: Label, recorded: u16) {
        let message = format!(
            "stack depth at L{} in `{}` is {} on one path and {} on another",
            label.0, self.method, recorded, self.depth
        );
        self.fail(CodegenError::invariant(message));
    }

    fn effect(&mut self, pops: u16, pushes: u16) {
        if self.depth < pops {
            let at = self.pc();
            let method = self.method.clone();
            self.fail(CodegenError::StackUnderflow { method, at });
            self.depth = 0;
        } else {
            self.depth -= pops;
        }
        self.depth = self.depth.saturating_add(pushes);
        self.max_stack = self.max_stack.max(self.depth);
    }

    /// Emit an opcode without operands.
    pub fn insn(&mut self, opcode: u8, pops: u16, pushes: u16) {
        self.effect(pops, pushes);
        self.code.push(opcode);
    }

    fn insn_u8(&mut self, opcode: u8, operand: u8, pops: u16, pushes: u16) {
        self.effect(pops, pushes);
        self.code.push(opcode);
        self.code.push(operand);
    }

    fn insn_u16(&mut self, opcode: u8, operand: u16, pops: u16, pushes: u16) {
        self.effect(pops, pushes);
        self.code.push(opcode);
        self.code.extend_from_slice(&operand.to_be_bytes());
    }

    // Constants

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn push_int(&mut self, value: i32, pool: &mut ConstantPool) -> CodegenResult<()> {
        match value {
            -1..=5 => self.insn((i32::from(op::ICONST_0) + value) as u8, 0, 1),
            -128..=127 => self.insn_u8(op::BIPUSH, value as i8 as u8, 0, 1),
            -32768..=32767 => self.insn_u16(op::SIPUSH, value as i16 as u16, 0, 1),
            _ => {
                let index = pool.integer(value)?;
                self.ldc(index);
            }
        }
        Ok(())
    }

    pub fn push_float(&mut self, bits: u32, pool: &mut ConstantPool) -> CodegenResult<()> {
        // Bit comparison keeps -0.0 out of `fconst_0`.
        if bits == 0.0f32.to_bits() {
            self.insn(op::FCONST_0, 0, 1);
        } else if bits == 1.0f32.to_bits() {
            self.insn(op::FCONST_1, 0, 1);
        } else if bits == 2.0f32.to_bits() {
            self.insn(op::FCONST_2, 0, 1);
        } else {
            let index = pool.float(bits)?;
            self.ldc(index);
        }
        Ok(())
    }

    pub fn push_string(&mut self, value: &str, pool: &mut ConstantPool) -> CodegenResult<()> {
        let index = pool.string(value)?;
        self.ldc(index);
        Ok(())
    }

    fn ldc(&mut self, index: u16) {
        match u8::try_from(index) {
            Ok(short) => self.insn_u8(op::LDC, short, 0, 1),
            Err(_) => self.insn_u16(op::LDC_W, index, 0, 1),
        }
    }

    // Locals

    pub fn load(&mut self, kind: SlotKind, slot: u16) {
        let (short, long) = match kind {
            SlotKind::Int => (op::ILOAD_0, op::ILOAD),
            SlotKind::Float => (op::FLOAD_0, op::FLOAD),
            SlotKind::Ref => (op::ALOAD_0, op::ALOAD),
        };
        self.local_insn(short, long, slot, 0, 1);
    }

    pub fn store(&mut self, kind: SlotKind, slot: u16) {
        let (short, long) = match kind {
            SlotKind::Int => (op::ISTORE_0, op::ISTORE),
            SlotKind::Float => (op::FSTORE_0, op::FSTORE),
            SlotKind::Ref => (op::ASTORE_0, op::ASTORE),
        };
        self.local_insn(short, long, slot, 1, 0);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn local_insn(&mut self, short: u8, long: u8, slot: u16, pops: u16, pushes: u16) {
        match slot {
            0..=3 => self.insn(short + slot as u8, pops, pushes),
            4..=255 => self.insn_u8(long, slot as u8, pops, pushes),
            _ => {
                self.effect(pops, pushes);
                self.code.push(op::WIDE);
                self.code.push(long);
                self.code.extend_from_slice(&slot.to_be_bytes());
            }
        }
    }

    // References into the constant pool

    /// `getstatic` / `putstatic` on a single-slot field.
    pub fn static_field(&mut self, opcode: u8, field_ref: u16) {
        let (pops, pushes) = if opcode == op::GETSTATIC { (0, 1) } else { (1, 0) };
        self.insn_u16(opcode, field_ref, pops, pushes);
    }

    /// `getfield` / `putfield` on a single-slot field.
    pub fn instance_field(&mut self, opcode: u8, field_ref: u16) {
        let (pops, pushes) = if opcode == op::GETFIELD { (1, 1) } else { (2, 0) };
        self.insn_u16(opcode, field_ref, pops, pushes);
    }

    /// `arg_slots` excludes the receiver of `invokevirtual`/`invokespecial`.
    pub fn invoke(&mut self, opcode: u8, method_ref: u16, arg_slots: u16, ret_slots: u16) {
        let receiver = u16::from(opcode != op::INVOKESTATIC);
        self.insn_u16(opcode, method_ref, arg_slots + receiver, ret_slots);
    }

    pub fn new_object(&mut self, class: u16) {
        self.insn_u16(op::NEW, class, 0, 1);
    }

    /// `newarray` for primitive elements.
    pub fn new_primitive_array(&mut self, atype: u8) {
        self.insn_u8(op::NEWARRAY, atype, 1, 1);
    }

    pub fn new_reference_array(&mut self, class: u16) {
        self.insn_u16(op::ANEWARRAY, class, 1, 1);
    }

    // Control flow

    /// Emit a conditional branch or `goto` to `label`.
    pub fn branch(&mut self, opcode: u8, label: Label) {
        let at = self.pc();
        let pops = if is_conditional_branch(opcode) {
            branch_pops(opcode)
        } else {
            0
        };
        self.insn_u16(opcode, 0, pops, 0);
        self.fixups.push(Fixup { at, label });
        match self.label_depths[label.index()] {
            Some(recorded) if recorded != self.depth => self.inconsistent_depth(label, recorded),
            Some(_) => {}
            None => self.label_depths[label.index()] = Some(self.depth),
        }
        if opcode == op::GOTO {
            self.reachable = false;
        }
    }

    /// Emit a return or `athrow`; nothing after it runs until a label.
    pub fn terminal(&mut self, opcode: u8, pops: u16) {
        self.insn(opcode, pops, 0);
        self.reachable = false;
    }

    /// Second pass: patch jump offsets and package the code.
    pub fn finish(mut self) -> CodegenResult<Code> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if self.code.len() > usize::from(u16::MAX) {
            return Err(CodegenError::CodeTooLarge {
                method: self.method,
                len: self.code.len(),
            });
        }
        for fixup in &self.fixups {
            let Some(target) = self.labels[fixup.label.index()] else {
                return Err(CodegenError::UnresolvedLabel {
                    method: self.method,
                    label: fixup.label.0,
                });
            };
            let offset = i64::from(target) - i64::from(fixup.at);
            let Ok(offset16) = i16::try_from(offset) else {
                return Err(CodegenError::BranchOutOfRange {
                    method: self.method,
                    at: fixup.at,
                    offset,
                });
            };
            let at = fixup.at as usize;
            self.code[at + 1..at + 3].copy_from_slice(&offset16.to_be_bytes());
        }
        // Code length was checked above, so every pc fits in u16.
        #[allow(clippy::cast_possible_truncation)]
        let line_numbers = self
            .lines
            .iter()
            .filter(|&&(pc, _)| (pc as usize) < self.code.len())
            .map(|&(pc, line)| LineNumber {
                start_pc: pc as u16,
                line: u16::try_from(line).unwrap_or(u16::MAX),
            })
            .collect();
        tracing::trace!(
            method = %self.method,
            len = self.code.len(),
            max_stack = self.max_stack,
            fixups = self.fixups.len(),
            "assembled"
        );
        Ok(Code {
            bytes: self.code,
            max_stack: self.max_stack,
            line_numbers,
        })
    }
}
