//! The closed set of root values this crate recognizes and writes.

use crate::constants::PrimitiveType;
use crate::primitive::PrimitiveValue;

/// A recognized root value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Only valid as an element of an object list or a map value.
    Null,
    String(String),
    Primitive(PrimitiveValue),
    /// `System.IntPtr`, widened to 64 bits.
    NativeInt(i64),
    /// `System.UIntPtr`, widened to 64 bits.
    NativeUInt(u64),
    /// `List<T>` of one scalar kind.
    PrimitiveList(PrimitiveType, Vec<PrimitiveValue>),
    /// `List<string>`.
    StringList(Vec<Option<String>>),
    /// `T[]` of one scalar kind.
    PrimitiveArray(PrimitiveType, Vec<PrimitiveValue>),
    /// `string[]`.
    StringArray(Vec<Option<String>>),
    /// `ArrayList` of strings, scalars and nulls.
    ObjectList(Vec<Value>),
    /// `Hashtable` of string or scalar keys to string, scalar or null values,
    /// in wire order.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short name of the shape, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Primitive(_) => "primitive",
            Self::NativeInt(_) => "native int",
            Self::NativeUInt(_) => "native uint",
            Self::PrimitiveList(..) => "primitive list",
            Self::StringList(_) => "string list",
            Self::PrimitiveArray(..) => "primitive array",
            Self::StringArray(_) => "string array",
            Self::ObjectList(_) => "object list",
            Self::Map(_) => "map",
        }
    }

    /// `true` for values allowed as an element of an object list or a map.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Null | Self::String(_) | Self::Primitive(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<PrimitiveValue> for Value {
    fn from(v: PrimitiveValue) -> Self {
        Self::Primitive(v)
    }
}
