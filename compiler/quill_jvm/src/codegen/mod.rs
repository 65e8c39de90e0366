//! Class assembly: fields, methods and the synthesized members around the
//! compiled functions.
//!
//! Layout of the generated class:
//!
//! - one `public static` field per global (`final` for constants)
//! - a private `$scanner` field when the program reads input
//! - `<init>`, then `<clinit>` when there is static state to set up
//! - one `public static` method per function
//! - the `main([Ljava/lang/String;)V` bridge when `function main()` exists
//!
//! Records live in classes of their own, built by [`record_class`].

mod function_compiler;
mod lower_builtins;
mod lower_operators;
mod record_class;

pub(crate) use record_class::record_class;

use quill_diagnostic::span_utils::LineOffsetTable;
use quill_ir::{StringInterner, Type};
use quill_lower::{Callee, Instr, IrFunction, IrModule};
use quill_resolve::Builtin;

use crate::assembler::{Assembler, Code};
use crate::class_file::{access, AttributeNames, ClassFile, FieldInfo, MethodInfo};
use crate::constant_pool::ConstantPool;
use crate::descriptor::{field_descriptor, method_descriptor};
use crate::error::{CodegenError, CodegenResult};
use crate::opcodes as op;
use crate::CodegenConfig;

use function_compiler::MethodCompiler;

const OBJECT_CLASS: &str = "java/lang/Object";
const SCANNER_CLASS: &str = "java/util/Scanner";
const SCANNER_FIELD: &str = "$scanner";
const SCANNER_DESCRIPTOR: &str = "Ljava/util/Scanner;";
const MAIN_BRIDGE_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

/// What a call site needs to know about a compiled function.
#[derive(Copy, Clone, Debug)]
pub(crate) struct MethodTarget {
    pub method_ref: u16,
    pub arg_slots: u16,
    pub returns_value: bool,
}

/// Constant pool handles for using one record class.
#[derive(Clone, Debug)]
pub(crate) struct RecordTarget {
    pub class: u16,
    pub init_ref: u16,
    pub arg_slots: u16,
    /// `Fieldref` per field, in declaration order.
    pub field_refs: Vec<u16>,
}

/// State shared by every method of the class.
pub(crate) struct ClassContext<'a> {
    pub config: &'a CodegenConfig,
    pub interner: &'a StringInterner,
    pub lines: &'a LineOffsetTable,
    pub pool: ConstantPool,
    /// Indexed by `FunctionId`.
    pub functions: Vec<MethodTarget>,
    /// `Fieldref` per global, indexed by `GlobalId`.
    pub global_refs: Vec<u16>,
    /// Indexed by `RecordId`.
    pub records: Vec<RecordTarget>,
    pub scanner_ref: Option<u16>,
}

pub(crate) struct ClassGenerator<'a> {
    ir: &'a IrModule,
    cx: ClassContext<'a>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
}

impl<'a> ClassGenerator<'a> {
    pub fn new(
        ir: &'a IrModule,
        config: &'a CodegenConfig,
        interner: &'a StringInterner,
        lines: &'a LineOffsetTable,
    ) -> Self {
        ClassGenerator {
            ir,
            cx: ClassContext {
                config,
                interner,
                lines,
                pool: ConstantPool::new(),
                functions: Vec::with_capacity(ir.functions.len()),
                global_refs: Vec::with_capacity(ir.globals.len()),
                records: Vec::with_capacity(ir.records.len()),
                scanner_ref: None,
            },
            fields: Vec::with_capacity(ir.globals.len() + 1),
            methods: Vec::with_capacity(ir.functions.len() + 3),
        }
    }

    pub fn run(mut self) -> CodegenResult<ClassFile> {
        let config = self.cx.config;
        let class_name = config.class_name.as_str();
        if !is_valid_class_name(class_name) {
            return Err(CodegenError::invariant(format!(
                "`{class_name}` is not a valid class name"
            )));
        }
        let this_class = self.cx.pool.class(class_name)?;
        let super_class = self.cx.pool.class(OBJECT_CLASS)?;
        let attribute_names = AttributeNames {
            code: self.cx.pool.utf8("Code")?,
            line_number_table: if config.emit_debug_info {
                Some(self.cx.pool.utf8("LineNumberTable")?)
            } else {
                None
            },
        };

        self.declare_records()?;
        self.declare_fields()?;
        self.declare_functions()?;

        self.emit_constructor()?;
        self.emit_static_init()?;
        let ir = self.ir;
        for func in &ir.functions {
            let code = MethodCompiler::new(&mut self.cx, func).compile()?;
            self.add_method(access::PUBLIC | access::STATIC, func, code)?;
        }
        self.emit_main_bridge()?;

        let source_file = match (&config.source_file, config.emit_debug_info) {
            (Some(file), true) => Some((
                self.cx.pool.utf8("SourceFile")?,
                self.cx.pool.utf8(file)?,
            )),
            _ => None,
        };

        Ok(ClassFile {
            name: class_name.to_owned(),
            major_version: config.target.major(),
            access: access::PUBLIC | access::SUPER,
            this_class,
            super_class,
            pool: self.cx.pool,
            fields: self.fields,
            methods: self.methods,
            attribute_names,
            source_file,
        })
    }

    fn declare_fields(&mut self) -> CodegenResult<()> {
        let config = self.cx.config;
        let class_name = config.class_name.as_str();
        for global in &self.ir.globals {
            let name = self.cx.interner.lookup(global.name);
            let descriptor = field_descriptor(&global.ty)?;
            let mut flags = access::PUBLIC | access::STATIC;
            if global.is_const {
                flags |= access::FINAL;
            }
            self.fields.push(FieldInfo {
                access: flags,
                name: self.cx.pool.utf8(name)?,
                descriptor: self.cx.pool.utf8(&descriptor)?,
            });
            let field_ref = self.cx.pool.field_ref(class_name, name, &descriptor)?;
            self.cx.global_refs.push(field_ref);
        }

        if self.reads_input() {
            self.fields.push(FieldInfo {
                access: access::PRIVATE | access::STATIC,
                name: self.cx.pool.utf8(SCANNER_FIELD)?,
                descriptor: self.cx.pool.utf8(SCANNER_DESCRIPTOR)?,
            });
            self.cx.scanner_ref =
                Some(
                    self.cx
                        .pool
                        .field_ref(class_name, SCANNER_FIELD, SCANNER_DESCRIPTOR)?,
                );
        }
        Ok(())
    }

    fn declare_functions(&mut self) -> CodegenResult<()> {
        let config = self.cx.config;
        let class_name = config.class_name.as_str();
        for func in &self.ir.functions {
            let name = self.cx.interner.lookup(func.name);
            let descriptor = method_descriptor(&func.params, &func.ret)?;
            let method_ref = self.cx.pool.method_ref(class_name, name, &descriptor)?;
            let arg_slots = arg_slots(name, func.params.len())?;
            self.cx.functions.push(MethodTarget {
                method_ref,
                arg_slots,
                returns_value: func.ret != Type::Void,
            });
        }
        Ok(())
    }

    fn declare_records(&mut self) -> CodegenResult<()> {
        let interner = self.cx.interner;
        for record in &self.ir.records {
            let name = interner.lookup(record.name);
            if name == self.cx.config.class_name {
                return Err(CodegenError::invariant(format!(
                    "record `{name}` clashes with the generated class"
                )));
            }
            let field_types: Vec<Type> = record.fields.iter().map(|f| f.ty.clone()).collect();
            let init_descriptor = method_descriptor(&field_types, &Type::Void)?;
            let mut field_refs = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let descriptor = field_descriptor(&field.ty)?;
                let field_ref =
                    self.cx
                        .pool
                        .field_ref(name, interner.lookup(field.name), &descriptor)?;
                field_refs.push(field_ref);
            }
            self.cx.records.push(RecordTarget {
                class: self.cx.pool.class(name)?,
                init_ref: self.cx.pool.method_ref(name, "<init>", &init_descriptor)?,
                // The receiver counts against the parameter limit.
                arg_slots: arg_slots(name, record.fields.len() + 1)? - 1,
                field_refs,
            });
        }
        Ok(())
    }

    fn reads_input(&self) -> bool {
        self.ir
            .functions
            .iter()
            .chain(&self.ir.static_init)
            .flat_map(|f| &f.blocks)
            .flat_map(|b| &b.instrs)
            .any(|instr| {
                matches!(
                    instr,
                    Instr::Call {
                        callee: Callee::Builtin(
                            Builtin::ReadInt | Builtin::ReadFloat | Builtin::ReadString
                        ),
                        ..
                    }
                )
            })
    }

    fn add_method(&mut self, flags: u16, func: &IrFunction, code: Code) -> CodegenResult<()> {
        let name = self.cx.interner.lookup(func.name);
        let descriptor = method_descriptor(&func.params, &func.ret)?;
        let max_locals = max_locals(name, func.local_count())?;
        self.push_method(flags, name, &descriptor, max_locals, code)
    }

    fn push_method(
        &mut self,
        flags: u16,
        name: &str,
        descriptor: &str,
        max_locals: u16,
        code: Code,
    ) -> CodegenResult<()> {
        tracing::debug!(
            name,
            descriptor,
            code_len = code.bytes.len(),
            max_stack = code.max_stack,
            max_locals,
            "method"
        );
        self.methods.push(MethodInfo {
            access: flags,
            name: self.cx.pool.utf8(name)?,
            descriptor: self.cx.pool.utf8(descriptor)?,
            max_locals,
            code,
        });
        Ok(())
    }

    /// `public <init>()V` calling `Object.<init>`.
    fn emit_constructor(&mut self) -> CodegenResult<()> {
        let object_init = self.cx.pool.method_ref(OBJECT_CLASS, "<init>", "()V")?;
        let mut asm = Assembler::new("<init>");
        asm.load(crate::assembler::SlotKind::Ref, 0);
        asm.invoke(op::INVOKESPECIAL, object_init, 0, 0);
        asm.terminal(op::RETURN, 0);
        let code = asm.finish()?;
        self.push_method(access::PUBLIC, "<init>", "()V", 1, code)
    }

    /// Creates the scanner, then runs the global initializers.
    fn emit_static_init(&mut self) -> CodegenResult<()> {
        let scanner = self.cx.scanner_ref;
        let ir = self.ir;
        match (&ir.static_init, scanner) {
            (None, None) => Ok(()),
            (None, Some(field)) => {
                let mut asm = Assembler::new("<clinit>");
                init_scanner(&mut asm, &mut self.cx.pool, field)?;
                asm.terminal(op::RETURN, 0);
                let code = asm.finish()?;
                self.push_method(access::STATIC, "<clinit>", "()V", 0, code)
            }
            (Some(init), _) => {
                let mut compiler = MethodCompiler::new(&mut self.cx, init);
                if let Some(field) = scanner {
                    compiler.with_prologue(|asm, pool| init_scanner(asm, pool, field))?;
                }
                let code = compiler.compile()?;
                self.add_method(access::STATIC, init, code)
            }
        }
    }

    fn emit_main_bridge(&mut self) -> CodegenResult<()> {
        let main = self.ir.functions.iter().position(|f| {
            self.cx.interner.lookup(f.name) == "main" && f.params.is_empty() && f.ret == Type::Void
        });
        let Some(index) = main else {
            return Ok(());
        };
        let mut asm = Assembler::new("main");
        asm.invoke(op::INVOKESTATIC, self.cx.functions[index].method_ref, 0, 0);
        asm.terminal(op::RETURN, 0);
        let code = asm.finish()?;
        self.push_method(
            access::PUBLIC | access::STATIC,
            "main",
            MAIN_BRIDGE_DESCRIPTOR,
            1,
            code,
        )
    }
}

/// `$scanner = new Scanner(System.in)`
fn init_scanner(asm: &mut Assembler, pool: &mut ConstantPool, field: u16) -> CodegenResult<()> {
    let class = pool.class(SCANNER_CLASS)?;
    let system_in = pool.field_ref("java/lang/System", "in", "Ljava/io/InputStream;")?;
    let init = pool.method_ref(SCANNER_CLASS, "<init>", "(Ljava/io/InputStream;)V")?;
    asm.new_object(class);
    asm.insn(op::DUP, 1, 2);
    asm.static_field(op::GETSTATIC, system_in);
    asm.invoke(op::INVOKESPECIAL, init, 1, 0);
    asm.static_field(op::PUTSTATIC, field);
    Ok(())
}

/// Argument slots of a call passing `count` single-slot values.
fn arg_slots(name: &str, count: usize) -> CodegenResult<u16> {
    u16::try_from(count)
        .ok()
        .filter(|&n| n <= 255)
        .ok_or_else(|| CodegenError::invariant(format!("`{name}` has more than 255 parameters")))
}

fn max_locals(method: &str, count: usize) -> CodegenResult<u16> {
    u16::try_from(count).map_err(|_| CodegenError::TooManyLocals {
        method: method.to_owned(),
        count,
    })
}

/// Internal names use `/` between packages and cannot contain `.`, `;`,
/// `[` or `<`.
fn is_valid_class_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('/')
            .all(|part| !part.is_empty() && !part.contains(['.', ';', '[', '<', '>']))
}
