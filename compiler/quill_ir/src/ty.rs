//! Source-level types.
//!
//! Types are small trees (`int[][]`, function signatures) compared
//! structurally; records compare by name. `Type::Error` is the poison type: once an expression is
//! given `Error`, every consumer accepts it silently so one mistake yields
//! one diagnostic.

use std::fmt;
use std::sync::Arc;

/// Primitive value kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PrimKind {
    Int,
    Float,
    Bool,
    Str,
}

impl PrimKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            PrimKind::Int => "int",
            PrimKind::Float => "float",
            PrimKind::Bool => "bool",
            PrimKind::Str => "string",
        }
    }
}

/// A function signature.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FnType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    Primitive(PrimKind),
    Array(Box<Type>),
    /// A user-declared record, by name. The resolver rejects names that
    /// no `record` item declares.
    Record(Arc<str>),
    Function(FnType),
    Void,
    /// Sentinel for ill-typed expressions and unresolved names.
    Error,
}

impl Type {
    pub const INT: Type = Type::Primitive(PrimKind::Int);
    pub const FLOAT: Type = Type::Primitive(PrimKind::Float);
    pub const BOOL: Type = Type::Primitive(PrimKind::Bool);
    pub const STR: Type = Type::Primitive(PrimKind::Str);

    pub fn array_of(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn record(name: &str) -> Type {
        Type::Record(Arc::from(name))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(FnType {
            params,
            ret: Box::new(ret),
        })
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// `true` if `Error` appears anywhere inside this type.
    pub fn contains_error(&self) -> bool {
        match self {
            Type::Error => true,
            Type::Array(elem) => elem.contains_error(),
            Type::Function(sig) => {
                sig.ret.contains_error() || sig.params.iter().any(Type::contains_error)
            }
            Type::Primitive(_) | Type::Record(_) | Type::Void => false,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Primitive(PrimKind::Int | PrimKind::Float))
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Values the JVM holds by reference: strings, arrays and records.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Primitive(PrimKind::Str) | Type::Array(_) | Type::Record(_)
        )
    }

    /// `void`, or an array whose innermost element is `void`.
    pub fn is_void_like(&self) -> bool {
        match self {
            Type::Void => true,
            Type::Array(elem) => elem.is_void_like(),
            _ => false,
        }
    }

    /// Element type of an array.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Innermost element type: `Point` for `Point[][]`.
    pub fn innermost(&self) -> &Type {
        match self {
            Type::Array(elem) => elem.innermost(),
            other => other,
        }
    }

    pub fn record_name(&self) -> Option<&str> {
        match self {
            Type::Record(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FnType> {
        match self {
            Type::Function(sig) => Some(sig),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => f.write_str(kind.as_str()),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Record(name) => f.write_str(name),
            Type::Function(sig) => {
                f.write_str("function(")?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, "): {}", sig.ret)
            }
            Type::Void => f.write_str("void"),
            Type::Error => f.write_str("{error}"),
        }
    }
}
