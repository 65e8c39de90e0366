//! Deduplicating class file constant pool.

use rustc_hash::FxHashMap;

use crate::error::{CodegenError, CodegenResult};

/// One constant pool entry.
///
/// References to other entries are pool indices. Floats are stored as bits
/// so entries can be hashed.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Entry {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Class(u16),
    String(u16),
    Fieldref { class: u16, name_and_type: u16 },
    Methodref { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
}

impl Entry {
    fn tag(&self) -> u8 {
        match self {
            Entry::Utf8(_) => 1,
            Entry::Integer(_) => 3,
            Entry::Float(_) => 4,
            Entry::Class(_) => 7,
            Entry::String(_) => 8,
            Entry::Fieldref { .. } => 9,
            Entry::Methodref { .. } => 10,
            Entry::NameAndType { .. } => 12,
        }
    }
}

/// Constant pool under construction. Adding an entry that already exists
/// returns the existing index.
#[derive(Default, Debug)]
pub struct ConstantPool {
    entries: Vec<Entry>,
    indices: FxHashMap<Entry, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries; the serialized `constant_pool_count` is one more.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a 1-based pool index.
    pub fn get(&self, index: u16) -> Option<&Entry> {
        self.entries.get(usize::from(index).checked_sub(1)?)
    }

    fn add(&mut self, entry: Entry) -> CodegenResult<u16> {
        if let Some(&index) = self.indices.get(&entry) {
            return Ok(index);
        }
        // Index 0 is reserved, so the last usable index is u16::MAX - 1.
        let index = u16::try_from(self.entries.len() + 1)
            .ok()
            .filter(|&i| i < u16::MAX)
            .ok_or(CodegenError::ConstantPoolOverflow)?;
        tracing::trace!(index, ?entry, "constant");
        self.entries.push(entry.clone());
        self.indices.insert(entry, index);
        Ok(index)
    }

    pub fn utf8(&mut self, text: &str) -> CodegenResult<u16> {
        let len = modified_utf8_len(text);
        if len > usize::from(u16::MAX) {
            return Err(CodegenError::StringTooLong { len });
        }
        self.add(Entry::Utf8(text.to_owned()))
    }

    pub fn integer(&mut self, value: i32) -> CodegenResult<u16> {
        self.add(Entry::Integer(value))
    }

    pub fn float(&mut self, bits: u32) -> CodegenResult<u16> {
        self.add(Entry::Float(bits))
    }

    /// `internal_name` uses slashes: `java/lang/String`, or a descriptor for
    /// array classes.
    pub fn class(&mut self, internal_name: &str) -> CodegenResult<u16> {
        let name = self.utf8(internal_name)?;
        self.add(Entry::Class(name))
    }

    pub fn string(&mut self, value: &str) -> CodegenResult<u16> {
        let utf8 = self.utf8(value)?;
        self.add(Entry::String(utf8))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> CodegenResult<u16> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.add(Entry::NameAndType { name, descriptor })
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> CodegenResult<u16> {
        let class = self.class(class)?;
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.add(Entry::Fieldref {
            class,
            name_and_type,
        })
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> CodegenResult<u16> {
        let class = self.class(class)?;
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.add(Entry::Methodref {
            class,
            name_and_type,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        // `add` keeps the count below u16::MAX.
        #[allow(clippy::cast_possible_truncation)]
        let count = (self.entries.len() + 1) as u16;
        out.extend_from_slice(&count.to_be_bytes());
        for entry in &self.entries {
            out.push(entry.tag());
            match entry {
                Entry::Utf8(text) => {
                    let bytes = modified_utf8(text);
                    #[allow(clippy::cast_possible_truncation)]
                    let len = bytes.len() as u16;
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(&bytes);
                }
                Entry::Integer(value) => out.extend_from_slice(&value.to_be_bytes()),
                Entry::Float(bits) => out.extend_from_slice(&bits.to_be_bytes()),
                Entry::Class(index) | Entry::String(index) => {
                    out.extend_from_slice(&index.to_be_bytes());
                }
                Entry::Fieldref {
                    class,
                    name_and_type,
                }
                | Entry::Methodref {
                    class,
                    name_and_type,
                } => {
                    out.extend_from_slice(&class.to_be_bytes());
                    out.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Entry::NameAndType { name, descriptor } => {
                    out.extend_from_slice(&name.to_be_bytes());
                    out.extend_from_slice(&descriptor.to_be_bytes());
                }
            }
        }
    }
}

/// Encode `text` in the JVM's modified UTF-8: NUL takes two bytes and
/// supplementary characters are written as surrogate pairs.
pub fn modified_utf8(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let mut units = [0u16; 2];
        for &unit in c.encode_utf16(&mut units).iter() {
            push_modified_unit(&mut out, unit);
        }
    }
    out
}

#[allow(clippy::cast_possible_truncation)]
fn push_modified_unit(out: &mut Vec<u8>, unit: u16) {
    match unit {
        0x0001..=0x007f => out.push(unit as u8),
        0x0000 | 0x0080..=0x07ff => {
            out.push(0xc0 | (unit >> 6) as u8);
            out.push(0x80 | (unit & 0x3f) as u8);
        }
        _ => {
            out.push(0xe0 | (unit >> 12) as u8);
            out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
            out.push(0x80 | (unit & 0x3f) as u8);
        }
    }
}

fn modified_utf8_len(text: &str) -> usize {
    text.chars()
        .map(|c| match c as u32 {
            0x0001..=0x007f => 1,
            0x0000 | 0x0080..=0x07ff => 2,
            0x0800..=0xffff => 3,
            _ => 6,
        })
        .sum()
}
