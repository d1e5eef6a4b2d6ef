use std::fmt;

use serde::{Deserialize, Serialize};

/// Static type of an expression, as resolved by the checking pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Bool,
    String,
    /// Homogeneous list of the given element type.
    List(Box<Type>),
    /// Function pointer (closure) with the given signature.
    Fptr(Signature),
    /// No value: the return type of procedures, and the type of
    /// expressions whose type could not be determined.
    Void,
}

/// Argument and return types of a function pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub args: Vec<Type>,
    pub ret: Box<Type>,
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn fptr(args: Vec<Type>, ret: Type) -> Self {
        Type::Fptr(Signature {
            args,
            ret: Box::new(ret),
        })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// `true` for types whose values are unboxed to raw integers for
    /// arithmetic and comparison.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int | Type::Bool)
    }

    /// Element type of a list.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::List(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Bool => f.write_str("bool"),
            Type::String => f.write_str("string"),
            Type::List(element) => write!(f, "list({element})"),
            Type::Fptr(sig) => {
                f.write_str("fptr(")?;
                for (i, arg) in sig.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, " -> {})", sig.ret)
            }
            Type::Void => f.write_str("void"),
        }
    }
}
