//! Basic-block IR.
//!
//! A function is a list of blocks; each block holds straight-line
//! instructions and exactly one [`Terminator`]. Values live in numbered
//! locals rather than SSA variables: parameters and declared variables keep
//! the slot the resolver gave them, temporaries are numbered after them.
//! That numbering is also the JVM local-variable layout.

use std::fmt;

use quill_ir::{BinaryOp, Name, PrimKind, Span, Type, UnaryOp};
use quill_resolve::Builtin;

macro_rules! index_newtype {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

index_newtype!(
    /// Local variable slot within one function.
    LocalId,
    "%"
);
index_newtype!(
    /// Basic block within one function.
    BlockId,
    "bb"
);
index_newtype!(
    /// Static field of the module, in declaration order.
    GlobalId,
    "@g"
);
index_newtype!(
    /// Function of the module, in declaration order.
    FunctionId,
    "@f"
);
index_newtype!(
    /// Record of the module, in declaration order.
    RecordId,
    "@r"
);

/// Constant operand.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IrConst {
    Int(i32),
    /// JVM `float` bits.
    Float(u32),
    Bool(bool),
    Str(Name),
    /// Initial value of string, array and record variables declared
    /// without an initializer.
    Null,
}

impl IrConst {
    pub fn float(value: f32) -> Self {
        IrConst::Float(value.to_bits())
    }

    pub fn float_value(self) -> Option<f32> {
        match self {
            IrConst::Float(bits) => Some(f32::from_bits(bits)),
            _ => None,
        }
    }

    /// The zero value a variable of type `ty` starts with.
    pub fn default_for(ty: &Type) -> IrConst {
        match ty {
            Type::Primitive(PrimKind::Int) => IrConst::Int(0),
            Type::Primitive(PrimKind::Float) => IrConst::float(0.0),
            Type::Primitive(PrimKind::Bool) => IrConst::Bool(false),
            _ => IrConst::Null,
        }
    }

    /// Type of the constant; `None` for `Null`, which fits any reference.
    pub fn ty(self) -> Option<Type> {
        match self {
            IrConst::Int(_) => Some(Type::INT),
            IrConst::Float(_) => Some(Type::FLOAT),
            IrConst::Bool(_) => Some(Type::BOOL),
            IrConst::Str(_) => Some(Type::STR),
            IrConst::Null => None,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Operand {
    Const(IrConst),
    Local(LocalId),
}

impl Operand {
    pub fn as_local(self) -> Option<LocalId> {
        match self {
            Operand::Local(local) => Some(local),
            Operand::Const(_) => None,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Callee {
    Function(FunctionId),
    Builtin(Builtin),
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Instr {
    /// `dst = src`: a load when `src` is a constant, a move otherwise.
    Copy { dst: LocalId, src: Operand },
    /// `&&` and `||` never appear here; they are lowered to branches.
    ///
    /// `operand_ty` is the type both operands share after widening.
    Binary {
        dst: LocalId,
        op: BinaryOp,
        operand_ty: Type,
        left: Operand,
        right: Operand,
    },
    Unary {
        dst: LocalId,
        op: UnaryOp,
        operand_ty: Type,
        operand: Operand,
    },
    /// `int` to `float` conversion.
    Widen { dst: LocalId, src: Operand },
    /// `dst` is `None` for `void` callees.
    Call {
        dst: Option<LocalId>,
        callee: Callee,
        args: Vec<Operand>,
    },
    LoadGlobal { dst: LocalId, global: GlobalId },
    StoreGlobal { global: GlobalId, value: Operand },
    NewArray {
        dst: LocalId,
        elem: Type,
        len: Operand,
    },
    LoadIndex {
        dst: LocalId,
        array: Operand,
        index: Operand,
    },
    StoreIndex {
        array: Operand,
        index: Operand,
        value: Operand,
    },
    /// Allocate a record, with one argument per field in declaration order.
    NewRecord {
        dst: LocalId,
        record: RecordId,
        args: Vec<Operand>,
    },
    /// `field` is the declaration index within `record`.
    LoadField {
        dst: LocalId,
        object: Operand,
        record: RecordId,
        field: u32,
    },
    StoreField {
        object: Operand,
        record: RecordId,
        field: u32,
        value: Operand,
    },
}

impl Instr {
    /// Local written by this instruction.
    pub fn defined_local(&self) -> Option<LocalId> {
        match self {
            Instr::Copy { dst, .. }
            | Instr::Binary { dst, .. }
            | Instr::Unary { dst, .. }
            | Instr::Widen { dst, .. }
            | Instr::LoadGlobal { dst, .. }
            | Instr::NewArray { dst, .. }
            | Instr::LoadIndex { dst, .. }
            | Instr::NewRecord { dst, .. }
            | Instr::LoadField { dst, .. } => Some(*dst),
            Instr::Call { dst, .. } => *dst,
            Instr::StoreGlobal { .. } | Instr::StoreIndex { .. } | Instr::StoreField { .. } => {
                None
            }
        }
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Terminator {
    Return(Option<Operand>),
    Jump(BlockId),
    Branch {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Control never gets here.
    Unreachable,
}

impl Terminator {
    pub fn successors(&self) -> impl Iterator<Item = BlockId> {
        let (first, second) = match *self {
            Terminator::Jump(target) => (Some(target), None),
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => (Some(then_block), Some(else_block)),
            Terminator::Return(_) | Terminator::Unreachable => (None, None),
        };
        first.into_iter().chain(second)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct IrBlock {
    pub id: BlockId,
    pub instrs: Vec<Instr>,
    /// Source span of each instruction, parallel to `instrs`.
    pub spans: Vec<Span>,
    pub terminator: Terminator,
    pub terminator_span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct IrFunction {
    pub name: Name,
    pub params: Vec<Type>,
    pub ret: Type,
    /// Type of every local, indexed by `LocalId`. Parameters come first.
    pub local_types: Vec<Type>,
    /// `blocks[entry]` is where execution starts.
    pub blocks: Vec<IrBlock>,
    pub entry: BlockId,
    pub span: Span,
}

impl IrFunction {
    #[inline]
    pub fn block(&self, id: BlockId) -> &IrBlock {
        &self.blocks[id.index()]
    }

    pub fn local_count(&self) -> usize {
        self.local_types.len()
    }

    pub fn local_type(&self, local: LocalId) -> &Type {
        &self.local_types[local.index()]
    }

    /// Type of an operand; `None` for `Null`.
    pub fn operand_type(&self, operand: Operand) -> Option<Type> {
        match operand {
            Operand::Local(local) => Some(self.local_type(local).clone()),
            Operand::Const(c) => c.ty(),
        }
    }

    pub fn instr_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instrs.len()).sum()
    }
}

/// A module-level variable or constant.
#[derive(Clone, PartialEq, Debug)]
pub struct IrGlobal {
    pub name: Name,
    pub ty: Type,
    pub is_const: bool,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct IrField {
    pub name: Name,
    pub ty: Type,
}

/// A record type: a class of its own with one public field per member.
#[derive(Clone, PartialEq, Debug)]
pub struct IrRecord {
    pub name: Name,
    /// The `Type::Record` values of this record have.
    pub ty: Type,
    pub fields: Vec<IrField>,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct IrModule {
    /// Indexed by `FunctionId`.
    pub functions: Vec<IrFunction>,
    /// Indexed by `GlobalId`.
    pub globals: Vec<IrGlobal>,
    /// Indexed by `RecordId`.
    pub records: Vec<IrRecord>,
    /// Runs the global initializers in declaration order.
    pub static_init: Option<IrFunction>,
}

impl IrModule {
    #[inline]
    pub fn function(&self, id: FunctionId) -> &IrFunction {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn global(&self, id: GlobalId) -> &IrGlobal {
        &self.globals[id.index()]
    }

    #[inline]
    pub fn record(&self, id: RecordId) -> &IrRecord {
        &self.records[id.index()]
    }

    /// The record whose values have type `ty`.
    pub fn record_of(&self, ty: &Type) -> Option<RecordId> {
        self.records
            .iter()
            .position(|r| r.ty == *ty)
            .and_then(|i| u32::try_from(i).ok())
            .map(RecordId::new)
    }
}
