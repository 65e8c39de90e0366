//! Symbols and built-in functions.

use quill_ir::{BindingId, Name, Span, Type};

/// Index into [`Resolution::symbols`](crate::Resolution).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct SymbolId(u32);

impl SymbolId {
    /// The shared symbol every unresolved reference binds to.
    pub const ERROR: SymbolId = SymbolId(0);

    pub(crate) const fn new(index: u32) -> Self {
        SymbolId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Built-in functions of the prelude scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Builtin {
    /// `write(x)`: print any primitive without a newline.
    Write,
    /// `writeln(x)` or `writeln()`.
    WriteLn,
    WriteInt,
    WriteFloat,
    ReadInt,
    ReadFloat,
    ReadString,
    /// `len(array | string): int`
    Len,
    /// `chr(int): string`
    Chr,
    /// `floor(float): int`
    Floor,
}

impl Builtin {
    pub const ALL: [Builtin; 10] = [
        Builtin::Write,
        Builtin::WriteLn,
        Builtin::WriteInt,
        Builtin::WriteFloat,
        Builtin::ReadInt,
        Builtin::ReadFloat,
        Builtin::ReadString,
        Builtin::Len,
        Builtin::Chr,
        Builtin::Floor,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Write => "write",
            Builtin::WriteLn => "writeln",
            Builtin::WriteInt => "writeInt",
            Builtin::WriteFloat => "writeFloat",
            Builtin::ReadInt => "readInt",
            Builtin::ReadFloat => "readFloat",
            Builtin::ReadString => "readString",
            Builtin::Len => "len",
            Builtin::Chr => "chr",
            Builtin::Floor => "floor",
        }
    }

    /// Declared signature.
    ///
    /// `write`, `writeln` and `len` accept more than this; the type checker
    /// applies their own rules and uses this only for display.
    pub fn signature(self) -> Type {
        match self {
            Builtin::Write | Builtin::WriteLn => Type::function(vec![Type::STR], Type::Void),
            Builtin::WriteInt => Type::function(vec![Type::INT], Type::Void),
            Builtin::WriteFloat => Type::function(vec![Type::FLOAT], Type::Void),
            Builtin::ReadInt => Type::function(vec![], Type::INT),
            Builtin::ReadFloat => Type::function(vec![], Type::FLOAT),
            Builtin::ReadString => Type::function(vec![], Type::STR),
            Builtin::Len => Type::function(vec![Type::STR], Type::INT),
            Builtin::Chr => Type::function(vec![Type::INT], Type::STR),
            Builtin::Floor => Type::function(vec![Type::FLOAT], Type::INT),
        }
    }

    /// Whether the type checker applies a custom rule instead of the
    /// declared signature.
    pub const fn has_custom_rule(self) -> bool {
        matches!(self, Builtin::Write | Builtin::WriteLn | Builtin::Len)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolKind {
    /// Module-level `var`.
    Global,
    /// Module-level `const`.
    Constant,
    Function,
    Parameter,
    /// Function-local `var` or `const`.
    Local,
    Builtin(Builtin),
    /// A `record` item; its type is the constructor signature.
    Record,
    /// Target of unresolved references.
    Error,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Symbol {
    pub name: Name,
    pub ty: Type,
    pub kind: SymbolKind,
    /// Declaration-order index.
    ///
    /// Parameters and locals: slot within their function, parameters first.
    /// Globals and constants: field index within the module. Functions:
    /// method index within the module. Records: declaration index within
    /// the module. Unused for built-ins.
    pub slot: u32,
    /// `const` declarations, module-level or local.
    pub is_const: bool,
    /// Binding site in the AST; `None` for built-ins and the error symbol.
    pub binding: Option<BindingId>,
    pub span: Span,
}

impl Symbol {
    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Function | SymbolKind::Builtin(_) | SymbolKind::Record
        )
    }

    /// Variables whose storage is a JVM local slot.
    pub fn is_local_storage(&self) -> bool {
        matches!(self.kind, SymbolKind::Parameter | SymbolKind::Local)
    }

    pub fn builtin(&self) -> Option<Builtin> {
        match self.kind {
            SymbolKind::Builtin(b) => Some(b),
            _ => None,
        }
    }
}
