//! Decoder for the class files the compiler writes.
//!
//! Reads back every structure the generator emits and rejects anything
//! else, so a malformed byte stream fails the test that produced it.

#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    /// Index 0, never referenced.
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Class(u16),
    String(u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
    NameAndType(u16, u16),
}

#[derive(Clone, Debug)]
pub struct Field {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
}

#[derive(Clone, Debug)]
pub struct Method {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    /// `(start_pc, line)` pairs.
    pub line_numbers: Vec<(u16, u16)>,
}

#[derive(Clone, Debug)]
pub struct Class {
    pub minor: u16,
    pub major: u16,
    pub access: u16,
    pub name: String,
    pub super_name: String,
    pub constants: Vec<Constant>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub source_file: Option<String>,
}

/// `(class, name, descriptor)` of a field or method reference.
pub type MemberRef<'c> = (&'c str, &'c str, &'c str);

struct Reader<'b> {
    bytes: &'b [u8],
    pos: usize,
}

impl<'b> Reader<'b> {
    fn take(&mut self, n: usize) -> Result<&'b [u8], String> {
        let end = self.pos + n;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| format!("truncated at byte {}", self.pos))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, String> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, String> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Decode modified UTF-8 into a `String`.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String, String> {
    let mut units = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == 0 {
            return Err("raw NUL in modified UTF-8".to_owned());
        }
        if b < 0x80 {
            units.push(u16::from(b));
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *bytes.get(i + 1).ok_or("truncated utf8")?;
            units.push((u16::from(b & 0x1F) << 6) | u16::from(b2 & 0x3F));
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *bytes.get(i + 1).ok_or("truncated utf8")?;
            let b3 = *bytes.get(i + 2).ok_or("truncated utf8")?;
            units.push(
                (u16::from(b & 0x0F) << 12) | (u16::from(b2 & 0x3F) << 6) | u16::from(b3 & 0x3F),
            );
            i += 3;
        } else {
            return Err(format!("invalid modified UTF-8 lead byte {b:#x}"));
        }
    }
    String::from_utf16(&units).map_err(|e| e.to_string())
}

impl Class {
    pub fn parse(bytes: &[u8]) -> Result<Class, String> {
        let mut r = Reader { bytes, pos: 0 };
        if r.u32()? != 0xCAFE_BABE {
            return Err("bad magic".to_owned());
        }
        let minor = r.u16()?;
        let major = r.u16()?;

        let count = r.u16()?;
        let mut constants = vec![Constant::Unusable];
        for _ in 1..count {
            let constant = match r.u8()? {
                1 => {
                    let len = usize::from(r.u16()?);
                    Constant::Utf8(decode_modified_utf8(r.take(len)?)?)
                }
                3 => Constant::Integer(i32::from_be_bytes(r.u32()?.to_be_bytes())),
                4 => Constant::Float(f32::from_bits(r.u32()?)),
                7 => Constant::Class(r.u16()?),
                8 => Constant::String(r.u16()?),
                9 => Constant::Fieldref(r.u16()?, r.u16()?),
                10 => Constant::Methodref(r.u16()?, r.u16()?),
                12 => Constant::NameAndType(r.u16()?, r.u16()?),
                tag => return Err(format!("unexpected constant tag {tag}")),
            };
            constants.push(constant);
        }

        let mut class = Class {
            minor,
            major,
            access: r.u16()?,
            name: String::new(),
            super_name: String::new(),
            constants,
            fields: Vec::new(),
            methods: Vec::new(),
            source_file: None,
        };
        let this_class = r.u16()?;
        let super_class = r.u16()?;
        class.name = class.class_name(this_class)?.to_owned();
        class.super_name = class.class_name(super_class)?.to_owned();

        if r.u16()? != 0 {
            return Err("unexpected interfaces".to_owned());
        }

        for _ in 0..r.u16()? {
            let access = r.u16()?;
            let name = class.utf8(r.u16()?)?.to_owned();
            let descriptor = class.utf8(r.u16()?)?.to_owned();
            if r.u16()? != 0 {
                return Err(format!("unexpected attributes on field {name}"));
            }
            class.fields.push(Field {
                access,
                name,
                descriptor,
            });
        }

        for _ in 0..r.u16()? {
            let method = class.read_method(&mut r)?;
            class.methods.push(method);
        }

        for _ in 0..r.u16()? {
            let name = class.utf8(r.u16()?)?.to_owned();
            let len = r.u32()? as usize;
            match name.as_str() {
                "SourceFile" if len == 2 => {
                    let file = class.utf8(r.u16()?)?.to_owned();
                    class.source_file = Some(file);
                }
                other => return Err(format!("unexpected class attribute {other}")),
            }
        }

        if r.pos != bytes.len() {
            return Err(format!("{} trailing bytes", bytes.len() - r.pos));
        }
        Ok(class)
    }

    fn read_method(&self, r: &mut Reader<'_>) -> Result<Method, String> {
        let access = r.u16()?;
        let name = self.utf8(r.u16()?)?.to_owned();
        let descriptor = self.utf8(r.u16()?)?.to_owned();
        if r.u16()? != 1 {
            return Err(format!("method {name} must have exactly one attribute"));
        }
        if self.utf8(r.u16()?)? != "Code" {
            return Err(format!("method {name} attribute is not Code"));
        }
        let attribute_len = r.u32()? as usize;
        let start = r.pos;
        let max_stack = r.u16()?;
        let max_locals = r.u16()?;
        let code_len = r.u32()? as usize;
        let code = r.take(code_len)?.to_vec();
        if r.u16()? != 0 {
            return Err(format!("method {name} has an exception table"));
        }
        let mut line_numbers = Vec::new();
        for _ in 0..r.u16()? {
            let attr = self.utf8(r.u16()?)?.to_owned();
            let len = r.u32()? as usize;
            if attr != "LineNumberTable" {
                return Err(format!("unexpected code attribute {attr}"));
            }
            let entries = usize::from(r.u16()?);
            if len != 2 + entries * 4 {
                return Err("LineNumberTable length mismatch".to_owned());
            }
            for _ in 0..entries {
                line_numbers.push((r.u16()?, r.u16()?));
            }
        }
        if r.pos - start != attribute_len {
            return Err(format!("Code attribute length mismatch in {name}"));
        }
        Ok(Method {
            access,
            name,
            descriptor,
            max_stack,
            max_locals,
            code,
            line_numbers,
        })
    }

    pub fn utf8(&self, index: u16) -> Result<&str, String> {
        match self.constants.get(usize::from(index)) {
            Some(Constant::Utf8(text)) => Ok(text.as_str()),
            other => Err(format!("constant {index} is not Utf8: {other:?}")),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<&str, String> {
        match self.constants.get(usize::from(index)) {
            Some(Constant::Class(name)) => self.utf8(*name),
            other => Err(format!("constant {index} is not a Class: {other:?}")),
        }
    }

    pub fn member_ref(&self, index: u16) -> Result<MemberRef<'_>, String> {
        let (class, nat) = match self.constants.get(usize::from(index)) {
            Some(Constant::Fieldref(c, n) | Constant::Methodref(c, n)) => (*c, *n),
            other => return Err(format!("constant {index} is not a member ref: {other:?}")),
        };
        let Some(Constant::NameAndType(name, descriptor)) = self.constants.get(usize::from(nat))
        else {
            return Err(format!("constant {nat} is not a NameAndType"));
        };
        Ok((self.class_name(class)?, self.utf8(*name)?, self.utf8(*descriptor)?))
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of constants matching `pred`.
    pub fn count_constants(&self, pred: impl Fn(&Constant) -> bool) -> usize {
        self.constants.iter().filter(|c| pred(c)).count()
    }
}
