//! Calls to built-in functions, mapped onto the Java library.

use quill_ir::{PrimKind, Type};
use quill_lower::{LocalId, Operand};
use quill_resolve::Builtin;

use super::function_compiler::MethodCompiler;
use crate::descriptor::STRING_CLASS;
use crate::error::{CodegenError, CodegenResult};
use crate::opcodes as op;

const PRINT_STREAM: &str = "java/io/PrintStream";

impl MethodCompiler<'_, '_> {
    pub(super) fn builtin(
        &mut self,
        builtin: Builtin,
        args: &[Operand],
        dst: Option<LocalId>,
    ) -> CodegenResult<()> {
        tracing::trace!(builtin = builtin.name(), args = args.len(), "builtin call");
        let produces = match builtin {
            Builtin::Write | Builtin::WriteInt | Builtin::WriteFloat => {
                self.print("print", args.first().copied())?;
                false
            }
            Builtin::WriteLn => {
                self.print("println", args.first().copied())?;
                false
            }
            Builtin::ReadInt => self.read("nextInt", "()I")?,
            Builtin::ReadFloat => self.read("nextFloat", "()F")?,
            Builtin::ReadString => self.read("next", "()Ljava/lang/String;")?,
            Builtin::Len => {
                let arg = self.single_arg(builtin, args)?;
                let ty = self.func.operand_type(arg);
                self.load(arg)?;
                match ty {
                    Some(Type::Primitive(PrimKind::Str)) => {
                        let length = self.cx.pool.method_ref(STRING_CLASS, "length", "()I")?;
                        self.asm.invoke(op::INVOKEVIRTUAL, length, 0, 1);
                    }
                    Some(Type::Array(_)) => self.asm.insn(op::ARRAYLENGTH, 1, 1),
                    other => {
                        return Err(CodegenError::invariant(format!(
                            "`len` of {other:?} in `{}`",
                            self.name
                        )))
                    }
                }
                true
            }
            Builtin::Chr => {
                let arg = self.single_arg(builtin, args)?;
                let value_of =
                    self.cx
                        .pool
                        .method_ref(STRING_CLASS, "valueOf", "(C)Ljava/lang/String;")?;
                self.load(arg)?;
                self.asm.insn(op::I2C, 1, 1);
                self.asm.invoke(op::INVOKESTATIC, value_of, 1, 1);
                true
            }
            Builtin::Floor => {
                // float -> double -> Math.floor -> int; doubles take two slots.
                let arg = self.single_arg(builtin, args)?;
                let floor = self.cx.pool.method_ref("java/lang/Math", "floor", "(D)D")?;
                self.load(arg)?;
                self.asm.insn(op::F2D, 1, 2);
                self.asm.invoke(op::INVOKESTATIC, floor, 2, 2);
                self.asm.insn(op::D2I, 2, 1);
                true
            }
        };
        self.finish_call(produces, dst)
    }

    fn single_arg(&self, builtin: Builtin, args: &[Operand]) -> CodegenResult<Operand> {
        match args {
            [arg] => Ok(*arg),
            _ => Err(CodegenError::invariant(format!(
                "`{}` called with {} arguments in `{}`",
                builtin.name(),
                args.len(),
                self.name
            ))),
        }
    }

    /// `System.out.print(arg)` / `println(arg)`, overloaded on the
    /// argument type.
    fn print(&mut self, method: &str, arg: Option<Operand>) -> CodegenResult<()> {
        let out = self
            .cx
            .pool
            .field_ref("java/lang/System", "out", "Ljava/io/PrintStream;")?;
        self.asm.static_field(op::GETSTATIC, out);
        let Some(arg) = arg else {
            let println = self.cx.pool.method_ref(PRINT_STREAM, method, "()V")?;
            self.asm.invoke(op::INVOKEVIRTUAL, println, 0, 0);
            return Ok(());
        };
        let descriptor = match self.func.operand_type(arg) {
            Some(Type::Primitive(PrimKind::Int)) => "(I)V",
            Some(Type::Primitive(PrimKind::Float)) => "(F)V",
            Some(Type::Primitive(PrimKind::Bool)) => "(Z)V",
            Some(Type::Primitive(PrimKind::Str)) => "(Ljava/lang/String;)V",
            _ => "(Ljava/lang/Object;)V",
        };
        let print = self.cx.pool.method_ref(PRINT_STREAM, method, descriptor)?;
        self.load(arg)?;
        self.asm.invoke(op::INVOKEVIRTUAL, print, 1, 0);
        Ok(())
    }

    /// `$scanner.<method>()`; returns true (a value is left).
    fn read(&mut self, method: &str, descriptor: &str) -> CodegenResult<bool> {
        let Some(scanner) = self.cx.scanner_ref else {
            return Err(CodegenError::invariant(format!(
                "input read in `{}` without a scanner field",
                self.name
            )));
        };
        let next = self
            .cx
            .pool
            .method_ref("java/util/Scanner", method, descriptor)?;
        self.asm.static_field(op::GETSTATIC, scanner);
        self.asm.invoke(op::INVOKEVIRTUAL, next, 0, 1);
        Ok(true)
    }
}
