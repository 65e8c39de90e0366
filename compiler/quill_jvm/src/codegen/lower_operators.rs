//! Binary operators.
//!
//! Comparisons produce an `int` 0/1 through a branch diamond:
//!
//! ```text
//!     <compare>  L_true
//!     iconst_0
//!     goto       L_done
//! L_true:
//!     iconst_1
//! L_done:
//! ```
//!
//! Float comparisons go through `fcmpl`/`fcmpg`, picking the variant that
//! makes every comparison with NaN false (and `!=` true).

use quill_ir::{BinaryOp, PrimKind, Type};
use quill_lower::Operand;

use super::function_compiler::MethodCompiler;
use crate::descriptor::STRING_CLASS;
use crate::error::{CodegenError, CodegenResult};
use crate::opcodes as op;

const BUILDER_CLASS: &str = "java/lang/StringBuilder";

impl MethodCompiler<'_, '_> {
    /// Leave `left op right` on the stack.
    pub(super) fn binary(
        &mut self,
        operator: BinaryOp,
        operand_ty: &Type,
        left: Operand,
        right: Operand,
    ) -> CodegenResult<()> {
        if operator == BinaryOp::Add && *operand_ty == Type::STR {
            return self.concat(left, right);
        }
        if *operand_ty == Type::STR && operator.is_equality() {
            return self.string_equality(operator, left, right);
        }

        self.load(left)?;
        self.load(right)?;
        match operand_ty {
            Type::Primitive(PrimKind::Int) if operator.is_arithmetic() => {
                self.asm.insn(int_arithmetic(operator)?, 2, 1);
            }
            Type::Primitive(PrimKind::Float) if operator.is_arithmetic() => {
                self.asm.insn(float_arithmetic(operator)?, 2, 1);
            }
            Type::Primitive(PrimKind::Int) if operator.is_ordering() || operator.is_equality() => {
                self.materialize(int_compare(operator)?);
            }
            Type::Primitive(PrimKind::Bool) if operator.is_equality() => {
                self.materialize(int_compare(operator)?);
            }
            Type::Primitive(PrimKind::Float) if operator.is_ordering() || operator.is_equality() => {
                let (compare, branch) = float_compare(operator)?;
                self.asm.insn(compare, 2, 1);
                self.materialize(branch);
            }
            Type::Array(_) | Type::Record(_) if operator.is_equality() => {
                let branch = if operator == BinaryOp::Eq {
                    op::IF_ACMPEQ
                } else {
                    op::IF_ACMPNE
                };
                self.materialize(branch);
            }
            _ => {
                return Err(CodegenError::invariant(format!(
                    "no bytecode for `{}` on `{operand_ty}` in `{}`",
                    operator.as_symbol(),
                    self.name
                )))
            }
        }
        Ok(())
    }

    /// Turn the branch `opcode` (taken when the comparison holds) into a
    /// 0/1 value.
    fn materialize(&mut self, opcode: u8) {
        let is_true = self.asm.new_label();
        let done = self.asm.new_label();
        self.asm.branch(opcode, is_true);
        self.asm.insn(op::ICONST_0, 0, 1);
        self.asm.branch(op::GOTO, done);
        self.asm.bind(is_true);
        self.asm.insn(op::ICONST_1, 0, 1);
        self.asm.bind(done);
    }

    /// `new StringBuilder().append(left).append(right).toString()`
    fn concat(&mut self, left: Operand, right: Operand) -> CodegenResult<()> {
        let pool = &mut self.cx.pool;
        let class = pool.class(BUILDER_CLASS)?;
        let init = pool.method_ref(BUILDER_CLASS, "<init>", "()V")?;
        let append = pool.method_ref(
            BUILDER_CLASS,
            "append",
            "(Ljava/lang/String;)Ljava/lang/StringBuilder;",
        )?;
        let to_string = pool.method_ref(BUILDER_CLASS, "toString", "()Ljava/lang/String;")?;

        self.asm.new_object(class);
        self.asm.insn(op::DUP, 1, 2);
        self.asm.invoke(op::INVOKESPECIAL, init, 0, 0);
        self.load(left)?;
        self.asm.invoke(op::INVOKEVIRTUAL, append, 1, 1);
        self.load(right)?;
        self.asm.invoke(op::INVOKEVIRTUAL, append, 1, 1);
        self.asm.invoke(op::INVOKEVIRTUAL, to_string, 0, 1);
        Ok(())
    }

    /// `left.equals(right)`, negated for `!=`.
    fn string_equality(
        &mut self,
        operator: BinaryOp,
        left: Operand,
        right: Operand,
    ) -> CodegenResult<()> {
        let equals = self
            .cx
            .pool
            .method_ref(STRING_CLASS, "equals", "(Ljava/lang/Object;)Z")?;
        self.load(left)?;
        self.load(right)?;
        self.asm.invoke(op::INVOKEVIRTUAL, equals, 1, 1);
        if operator == BinaryOp::NotEq {
            self.asm.insn(op::ICONST_1, 0, 1);
            self.asm.insn(op::IXOR, 2, 1);
        }
        Ok(())
    }
}

fn unexpected(operator: BinaryOp) -> CodegenError {
    CodegenError::invariant(format!("unexpected operator `{}`", operator.as_symbol()))
}

fn int_arithmetic(operator: BinaryOp) -> CodegenResult<u8> {
    Ok(match operator {
        BinaryOp::Add => op::IADD,
        BinaryOp::Sub => op::ISUB,
        BinaryOp::Mul => op::IMUL,
        BinaryOp::Div => op::IDIV,
        BinaryOp::Mod => op::IREM,
        _ => return Err(unexpected(operator)),
    })
}

fn float_arithmetic(operator: BinaryOp) -> CodegenResult<u8> {
    Ok(match operator {
        BinaryOp::Add => op::FADD,
        BinaryOp::Sub => op::FSUB,
        BinaryOp::Mul => op::FMUL,
        BinaryOp::Div => op::FDIV,
        BinaryOp::Mod => op::FREM,
        _ => return Err(unexpected(operator)),
    })
}

/// Two-operand int branch taken when the comparison holds.
fn int_compare(operator: BinaryOp) -> CodegenResult<u8> {
    Ok(match operator {
        BinaryOp::Eq => op::IF_ICMPEQ,
        BinaryOp::NotEq => op::IF_ICMPNE,
        BinaryOp::Lt => op::IF_ICMPLT,
        BinaryOp::LtEq => op::IF_ICMPLE,
        BinaryOp::Gt => op::IF_ICMPGT,
        BinaryOp::GtEq => op::IF_ICMPGE,
        _ => return Err(unexpected(operator)),
    })
}

/// `fcmpg` yields 1 on NaN, `fcmpl` yields -1; each is paired with the
/// branch NaN cannot take.
fn float_compare(operator: BinaryOp) -> CodegenResult<(u8, u8)> {
    Ok(match operator {
        BinaryOp::Eq => (op::FCMPL, op::IFEQ),
        BinaryOp::NotEq => (op::FCMPL, op::IFNE),
        BinaryOp::Lt => (op::FCMPG, op::IFLT),
        BinaryOp::LtEq => (op::FCMPG, op::IFLE),
        BinaryOp::Gt => (op::FCMPL, op::IFGT),
        BinaryOp::GtEq => (op::FCMPL, op::IFGE),
        _ => return Err(unexpected(operator)),
    })
}
