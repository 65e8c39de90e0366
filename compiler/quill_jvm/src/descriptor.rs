//! Mapping from Quill types to JVM descriptors and opcode families.
//!
//! | Quill    | JVM                  |
//! |----------|----------------------|
//! | `int`    | `I`                  |
//! | `float`  | `F`                  |
//! | `bool`   | `Z`                  |
//! | `string` | `Ljava/lang/String;` |
//! | `T[]`    | `[T`                 |
//! | record `P` | `LP;`              |
//! | `void`   | `V`                  |

use quill_ir::{PrimKind, Type};

use crate::assembler::SlotKind;
use crate::error::{CodegenError, CodegenResult};
use crate::opcodes as op;

pub const STRING_CLASS: &str = "java/lang/String";
pub const STRING_DESCRIPTOR: &str = "Ljava/lang/String;";

fn unsupported(ty: &Type) -> CodegenError {
    CodegenError::invariant(format!("type `{ty}` has no JVM representation"))
}

fn push_descriptor(out: &mut String, ty: &Type) -> CodegenResult<()> {
    match ty {
        Type::Primitive(PrimKind::Int) => out.push('I'),
        Type::Primitive(PrimKind::Float) => out.push('F'),
        Type::Primitive(PrimKind::Bool) => out.push('Z'),
        Type::Primitive(PrimKind::Str) => out.push_str(STRING_DESCRIPTOR),
        Type::Array(elem) => {
            out.push('[');
            push_descriptor(out, elem)?;
        }
        Type::Record(name) => {
            out.push('L');
            out.push_str(name);
            out.push(';');
        }
        Type::Void | Type::Function(_) | Type::Error => return Err(unsupported(ty)),
    }
    Ok(())
}

/// Descriptor of a field or local of type `ty`.
pub fn field_descriptor(ty: &Type) -> CodegenResult<String> {
    let mut out = String::new();
    push_descriptor(&mut out, ty)?;
    Ok(out)
}

pub fn method_descriptor(params: &[Type], ret: &Type) -> CodegenResult<String> {
    let mut out = String::from("(");
    for param in params {
        push_descriptor(&mut out, param)?;
    }
    out.push(')');
    if *ret == Type::Void {
        out.push('V');
    } else {
        push_descriptor(&mut out, ret)?;
    }
    Ok(out)
}

/// Descriptor of a method returning `ret` and taking the given raw
/// descriptors; used for library calls.
pub fn raw_method_descriptor(params: &[&str], ret: &str) -> String {
    let mut out = String::from("(");
    for param in params {
        out.push_str(param);
    }
    out.push(')');
    out.push_str(ret);
    out
}

pub fn slot_kind(ty: &Type) -> CodegenResult<SlotKind> {
    match ty {
        Type::Primitive(PrimKind::Int | PrimKind::Bool) => Ok(SlotKind::Int),
        Type::Primitive(PrimKind::Float) => Ok(SlotKind::Float),
        Type::Primitive(PrimKind::Str) | Type::Array(_) | Type::Record(_) => Ok(SlotKind::Ref),
        Type::Void | Type::Function(_) | Type::Error => Err(unsupported(ty)),
    }
}

pub fn return_opcode(ret: &Type) -> CodegenResult<u8> {
    if *ret == Type::Void {
        return Ok(op::RETURN);
    }
    Ok(match slot_kind(ret)? {
        SlotKind::Int => op::IRETURN,
        SlotKind::Float => op::FRETURN,
        SlotKind::Ref => op::ARETURN,
    })
}

/// How arrays with elements of one type are created and accessed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ArrayOps {
    pub load: u8,
    pub store: u8,
    /// `newarray` type code; `None` means `anewarray`.
    pub atype: Option<u8>,
}

pub fn array_ops(elem: &Type) -> CodegenResult<ArrayOps> {
    let (load, store, atype) = match elem {
        Type::Primitive(PrimKind::Int) => (op::IALOAD, op::IASTORE, Some(op::T_INT)),
        Type::Primitive(PrimKind::Float) => (op::FALOAD, op::FASTORE, Some(op::T_FLOAT)),
        Type::Primitive(PrimKind::Bool) => (op::BALOAD, op::BASTORE, Some(op::T_BOOLEAN)),
        Type::Primitive(PrimKind::Str) | Type::Array(_) | Type::Record(_) => {
            (op::AALOAD, op::AASTORE, None)
        }
        Type::Void | Type::Function(_) | Type::Error => return Err(unsupported(elem)),
    };
    Ok(ArrayOps { load, store, atype })
}

/// Class operand of `anewarray` for reference elements: the internal name
/// for strings and records, the descriptor for nested arrays.
pub fn reference_class_name(elem: &Type) -> CodegenResult<String> {
    match elem {
        Type::Primitive(PrimKind::Str) => Ok(STRING_CLASS.to_owned()),
        Type::Record(name) => Ok(name.to_string()),
        Type::Array(_) => field_descriptor(elem),
        _ => Err(unsupported(elem)),
    }
}
