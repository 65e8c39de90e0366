//! Class file model and serialization.

use crate::assembler::Code;
use crate::constant_pool::{ConstantPool, Entry};

pub const MAGIC: u32 = 0xCAFE_BABE;

pub mod access {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    /// `ACC_SUPER` on classes.
    pub const SUPER: u16 = 0x0020;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldInfo {
    pub access: u16,
    pub name: u16,
    pub descriptor: u16,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodInfo {
    pub access: u16,
    pub name: u16,
    pub descriptor: u16,
    pub max_locals: u16,
    pub code: Code,
}

/// Constant pool indices of the attribute names in use.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AttributeNames {
    pub code: u16,
    /// Set when debug info is on.
    pub line_number_table: Option<u16>,
}

/// A complete class, ready to serialize. All names and descriptors are
/// already in the constant pool.
#[derive(Debug)]
pub struct ClassFile {
    /// Internal name, e.g. `Main`.
    pub name: String,
    pub major_version: u16,
    pub access: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub pool: ConstantPool,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attribute_names: AttributeNames,
    /// `SourceFile` attribute: (attribute name, file name) indices.
    pub source_file: Option<(u16, u16)>,
}

impl ClassFile {
    fn utf8(&self, index: u16) -> Option<&str> {
        match self.pool.get(index) {
            Some(Entry::Utf8(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            self.utf8(m.name) == Some(name) && self.utf8(m.descriptor) == Some(descriptor)
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| self.utf8(f.name) == Some(name))
    }

    /// Serialize in class file format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1024);
        put_u32(&mut out, MAGIC);
        put_u16(&mut out, 0);
        put_u16(&mut out, self.major_version);
        self.pool.write(&mut out);
        put_u16(&mut out, self.access);
        put_u16(&mut out, self.this_class);
        put_u16(&mut out, self.super_class);
        // interfaces
        put_u16(&mut out, 0);

        put_len(&mut out, self.fields.len());
        for field in &self.fields {
            put_u16(&mut out, field.access);
            put_u16(&mut out, field.name);
            put_u16(&mut out, field.descriptor);
            put_u16(&mut out, 0);
        }

        put_len(&mut out, self.methods.len());
        for method in &self.methods {
            put_u16(&mut out, method.access);
            put_u16(&mut out, method.name);
            put_u16(&mut out, method.descriptor);
            put_u16(&mut out, 1);
            self.write_code(&mut out, method);
        }

        match self.source_file {
            Some((attr_name, file)) => {
                put_u16(&mut out, 1);
                put_u16(&mut out, attr_name);
                put_u32(&mut out, 2);
                put_u16(&mut out, file);
            }
            None => put_u16(&mut out, 0),
        }
        out
    }

    fn write_code(&self, out: &mut Vec<u8>, method: &MethodInfo) {
        let code = &method.code;
        let line_table = self
            .attribute_names
            .line_number_table
            .filter(|_| !code.line_numbers.is_empty());
        let line_table_len = line_table.map_or(0, |_| 8 + 4 * code.line_numbers.len());
        // max_stack, max_locals, code_length, code, exception table,
        // attribute count, attributes.
        let attr_len = 2 + 2 + 4 + code.bytes.len() + 2 + 2 + line_table_len;

        put_u16(out, self.attribute_names.code);
        put_len32(out, attr_len);
        put_u16(out, code.max_stack);
        put_u16(out, method.max_locals);
        put_len32(out, code.bytes.len());
        out.extend_from_slice(&code.bytes);
        // exception_table_length
        put_u16(out, 0);
        match line_table {
            Some(name) => {
                put_u16(out, 1);
                put_u16(out, name);
                put_len32(out, 2 + 4 * code.line_numbers.len());
                put_len(out, code.line_numbers.len());
                for entry in &code.line_numbers {
                    put_u16(out, entry.start_pc);
                    put_u16(out, entry.line);
                }
            }
            None => put_u16(out, 0),
        }
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Counts are bounded by the generator (code length, pool size), so they
/// fit their fields.
#[allow(clippy::cast_possible_truncation)]
fn put_len(out: &mut Vec<u8>, len: usize) {
    put_u16(out, len as u16);
}

#[allow(clippy::cast_possible_truncation)]
fn put_len32(out: &mut Vec<u8>, len: usize) {
    put_u32(out, len as u32);
}
