//! Record classes.
//!
//! A record `Point { x: int; y: float; }` becomes the class `Point`:
//!
//! - one `public` instance field per record field
//! - `public <init>(IF)V` storing its arguments in declaration order
//! - `public toString()Ljava/lang/String;` rendering `Point {x= 1, y= 2.0}`
//!
//! Array fields render through `java.util.Arrays.toString`, nested records
//! through their own `toString`.

use quill_ir::{PrimKind, StringInterner, Type};
use quill_lower::{IrField, IrRecord};

use super::{arg_slots, is_valid_class_name, max_locals, OBJECT_CLASS};
use crate::assembler::{Assembler, Code, SlotKind};
use crate::class_file::{access, AttributeNames, ClassFile, FieldInfo, MethodInfo};
use crate::constant_pool::ConstantPool;
use crate::descriptor::{field_descriptor, method_descriptor, slot_kind, STRING_DESCRIPTOR};
use crate::error::{CodegenError, CodegenResult};
use crate::opcodes as op;
use crate::CodegenConfig;

const BUILDER_CLASS: &str = "java/lang/StringBuilder";
const ARRAYS_CLASS: &str = "java/util/Arrays";
const TO_STRING_DESCRIPTOR: &str = "()Ljava/lang/String;";

/// Build the class for `record`.
pub(crate) fn record_class(
    record: &IrRecord,
    config: &CodegenConfig,
    interner: &StringInterner,
) -> CodegenResult<ClassFile> {
    let name = interner.lookup(record.name);
    if !is_valid_class_name(name) || name == config.class_name {
        return Err(CodegenError::invariant(format!(
            "record `{name}` cannot be emitted as a class of its own"
        )));
    }

    let mut pool = ConstantPool::new();
    let this_class = pool.class(name)?;
    let super_class = pool.class(OBJECT_CLASS)?;
    let attribute_names = AttributeNames {
        code: pool.utf8("Code")?,
        line_number_table: None,
    };

    let mut fields = Vec::with_capacity(record.fields.len());
    let mut field_refs = Vec::with_capacity(record.fields.len());
    for field in &record.fields {
        let field_name = interner.lookup(field.name);
        let descriptor = field_descriptor(&field.ty)?;
        fields.push(FieldInfo {
            access: access::PUBLIC,
            name: pool.utf8(field_name)?,
            descriptor: pool.utf8(&descriptor)?,
        });
        field_refs.push(pool.field_ref(name, field_name, &descriptor)?);
    }

    let field_types: Vec<Type> = record.fields.iter().map(|f| f.ty.clone()).collect();
    let init_descriptor = method_descriptor(&field_types, &Type::Void)?;
    // The receiver counts against the parameter limit.
    arg_slots(name, record.fields.len() + 1)?;
    let init = constructor(&mut pool, &record.fields, &field_refs)?;
    let to_string = to_string(&mut pool, name, record, interner, &field_refs)?;

    let methods = vec![
        MethodInfo {
            access: access::PUBLIC,
            name: pool.utf8("<init>")?,
            descriptor: pool.utf8(&init_descriptor)?,
            max_locals: max_locals("<init>", record.fields.len() + 1)?,
            code: init,
        },
        MethodInfo {
            access: access::PUBLIC,
            name: pool.utf8("toString")?,
            descriptor: pool.utf8(TO_STRING_DESCRIPTOR)?,
            max_locals: 1,
            code: to_string,
        },
    ];

    let source_file = match (&config.source_file, config.emit_debug_info) {
        (Some(file), true) => Some((pool.utf8("SourceFile")?, pool.utf8(file)?)),
        _ => None,
    };

    tracing::debug!(record = name, fields = fields.len(), "record class");
    Ok(ClassFile {
        name: name.to_owned(),
        major_version: config.target.major(),
        access: access::PUBLIC | access::SUPER,
        this_class,
        super_class,
        pool,
        fields,
        methods,
        attribute_names,
        source_file,
    })
}

/// `super()`, then `this.f = f` for each field.
fn constructor(
    pool: &mut ConstantPool,
    fields: &[IrField],
    field_refs: &[u16],
) -> CodegenResult<Code> {
    let object_init = pool.method_ref(OBJECT_CLASS, "<init>", "()V")?;
    let mut asm = Assembler::new("<init>");
    asm.load(SlotKind::Ref, 0);
    asm.invoke(op::INVOKESPECIAL, object_init, 0, 0);
    for (slot, (field, &field_ref)) in (1u16..).zip(fields.iter().zip(field_refs)) {
        asm.load(SlotKind::Ref, 0);
        asm.load(slot_kind(&field.ty)?, slot);
        asm.instance_field(op::PUTFIELD, field_ref);
    }
    asm.terminal(op::RETURN, 0);
    asm.finish()
}

fn to_string(
    pool: &mut ConstantPool,
    name: &str,
    record: &IrRecord,
    interner: &StringInterner,
    field_refs: &[u16],
) -> CodegenResult<Code> {
    let class = pool.class(BUILDER_CLASS)?;
    let init = pool.method_ref(BUILDER_CLASS, "<init>", "(Ljava/lang/String;)V")?;
    let append_str = append(pool, STRING_DESCRIPTOR)?;
    let finish = pool.method_ref(BUILDER_CLASS, "toString", TO_STRING_DESCRIPTOR)?;

    let mut asm = Assembler::new("toString");
    asm.new_object(class);
    asm.insn(op::DUP, 1, 2);
    asm.push_string(&format!("{name} {{"), pool)?;
    asm.invoke(op::INVOKESPECIAL, init, 1, 0);
    for (i, (field, &field_ref)) in record.fields.iter().zip(field_refs).enumerate() {
        let separator = if i == 0 { "" } else { ", " };
        let label = format!("{separator}{}= ", interner.lookup(field.name));
        asm.push_string(&label, pool)?;
        asm.invoke(op::INVOKEVIRTUAL, append_str, 1, 1);
        asm.load(SlotKind::Ref, 0);
        asm.instance_field(op::GETFIELD, field_ref);
        append_value(&mut asm, pool, &field.ty)?;
    }
    asm.push_string("}", pool)?;
    asm.invoke(op::INVOKEVIRTUAL, append_str, 1, 1);
    asm.invoke(op::INVOKEVIRTUAL, finish, 0, 1);
    asm.terminal(op::ARETURN, 1);
    asm.finish()
}

fn append(pool: &mut ConstantPool, arg: &str) -> CodegenResult<u16> {
    pool.method_ref(
        BUILDER_CLASS,
        "append",
        &format!("({arg})Ljava/lang/StringBuilder;"),
    )
}

/// Append the value on top of the stack to the builder below it.
fn append_value(asm: &mut Assembler, pool: &mut ConstantPool, ty: &Type) -> CodegenResult<()> {
    let arg = match ty {
        Type::Primitive(PrimKind::Int) => "I",
        Type::Primitive(PrimKind::Float) => "F",
        Type::Primitive(PrimKind::Bool) => "Z",
        Type::Primitive(PrimKind::Str) => STRING_DESCRIPTOR,
        Type::Record(_) => "Ljava/lang/Object;",
        Type::Array(elem) => {
            let array = match **elem {
                Type::Primitive(PrimKind::Int) => "[I",
                Type::Primitive(PrimKind::Float) => "[F",
                Type::Primitive(PrimKind::Bool) => "[Z",
                _ => "[Ljava/lang/Object;",
            };
            let render =
                pool.method_ref(ARRAYS_CLASS, "toString", &format!("({array})Ljava/lang/String;"))?;
            asm.invoke(op::INVOKESTATIC, render, 1, 1);
            STRING_DESCRIPTOR
        }
        Type::Void | Type::Function(_) | Type::Error => {
            return Err(CodegenError::invariant(format!(
                "record field of type `{ty}`"
            )))
        }
    };
    let method = append(pool, arg)?;
    asm.invoke(op::INVOKEVIRTUAL, method, 1, 1);
    Ok(())
}
