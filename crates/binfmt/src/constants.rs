//! Wire-level enumerations and canonical name tables.

/// Record tag: the leading byte of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    SerializedStreamHeader = 0,
    ClassWithId = 1,
    SystemClassWithMembers = 2,
    ClassWithMembers = 3,
    SystemClassWithMembersAndTypes = 4,
    ClassWithMembersAndTypes = 5,
    BinaryObjectString = 6,
    BinaryArray = 7,
    MemberPrimitiveTyped = 8,
    MemberReference = 9,
    ObjectNull = 10,
    MessageEnd = 11,
    BinaryLibrary = 12,
    ObjectNullMultiple256 = 13,
    ObjectNullMultiple = 14,
    ArraySinglePrimitive = 15,
    ArraySingleObject = 16,
    ArraySingleString = 17,
    MethodCall = 21,
    MethodReturn = 22,
}

impl RecordType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::SerializedStreamHeader,
            1 => Self::ClassWithId,
            2 => Self::SystemClassWithMembers,
            3 => Self::ClassWithMembers,
            4 => Self::SystemClassWithMembersAndTypes,
            5 => Self::ClassWithMembersAndTypes,
            6 => Self::BinaryObjectString,
            7 => Self::BinaryArray,
            8 => Self::MemberPrimitiveTyped,
            9 => Self::MemberReference,
            10 => Self::ObjectNull,
            11 => Self::MessageEnd,
            12 => Self::BinaryLibrary,
            13 => Self::ObjectNullMultiple256,
            14 => Self::ObjectNullMultiple,
            15 => Self::ArraySinglePrimitive,
            16 => Self::ArraySingleObject,
            17 => Self::ArraySingleString,
            21 => Self::MethodCall,
            22 => Self::MethodReturn,
            _ => return None,
        })
    }
}

/// Scalar kinds understood by the primitive codec.
///
/// `String` and `Null` appear on the wire as descriptors but are carried by
/// dedicated records, never as bare primitive values. Code 4 is unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrimitiveType {
    Boolean = 1,
    Byte = 2,
    Char = 3,
    Decimal = 5,
    Double = 6,
    Int16 = 7,
    Int32 = 8,
    Int64 = 9,
    SByte = 10,
    Single = 11,
    TimeSpan = 12,
    DateTime = 13,
    UInt16 = 14,
    UInt32 = 15,
    UInt64 = 16,
    Null = 17,
    String = 18,
}

impl PrimitiveType {
    pub fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Boolean,
            2 => Self::Byte,
            3 => Self::Char,
            5 => Self::Decimal,
            6 => Self::Double,
            7 => Self::Int16,
            8 => Self::Int32,
            9 => Self::Int64,
            10 => Self::SByte,
            11 => Self::Single,
            12 => Self::TimeSpan,
            13 => Self::DateTime,
            14 => Self::UInt16,
            15 => Self::UInt32,
            16 => Self::UInt64,
            17 => Self::Null,
            18 => Self::String,
            _ => return None,
        })
    }

    /// `true` for every kind the primitive codec can read or write.
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Null | Self::String)
    }

    /// Runtime type name of the kind, e.g. `System.Int32`.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Boolean => "System.Boolean",
            Self::Byte => "System.Byte",
            Self::Char => "System.Char",
            Self::Decimal => "System.Decimal",
            Self::Double => "System.Double",
            Self::Int16 => "System.Int16",
            Self::Int32 => "System.Int32",
            Self::Int64 => "System.Int64",
            Self::SByte => "System.SByte",
            Self::Single => "System.Single",
            Self::TimeSpan => "System.TimeSpan",
            Self::DateTime => "System.DateTime",
            Self::UInt16 => "System.UInt16",
            Self::UInt32 => "System.UInt32",
            Self::UInt64 => "System.UInt64",
            Self::Null => "System.DBNull",
            Self::String => "System.String",
        }
    }
}

/// Wire shape of one class member, as declared in member type metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BinaryType {
    Primitive = 0,
    String = 1,
    Object = 2,
    SystemClass = 3,
    Class = 4,
    ObjectArray = 5,
    StringArray = 6,
    PrimitiveArray = 7,
}

impl BinaryType {
    pub fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Primitive,
            1 => Self::String,
            2 => Self::Object,
            3 => Self::SystemClass,
            4 => Self::Class,
            5 => Self::ObjectArray,
            6 => Self::StringArray,
            7 => Self::PrimitiveArray,
            _ => return None,
        })
    }
}

/// Header version written and accepted.
pub const MAJOR_VERSION: i32 = 1;
pub const MINOR_VERSION: i32 = 0;

/// Root id and header id the canonical encoder writes into the header.
pub const ROOT_ID: i32 = 1;
pub const HEADER_ID: i32 = -1;

/// Containers sized from a wire length never reserve more than this many
/// elements up front.
pub const PREALLOCATION_CAP: usize = 1024;

/// Default bound on record nesting during decode.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default bound on the null slots all null runs of one stream expand to.
pub const DEFAULT_MAX_NULL_SLOTS: usize = 1 << 20;

pub const MSCORLIB_ASSEMBLY_NAME: &str =
    "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089";

pub const LIST_TYPE_PREFIX: &str = "System.Collections.Generic.List`1[[";
pub const ARRAY_LIST_TYPE_NAME: &str = "System.Collections.ArrayList";
pub const HASHTABLE_TYPE_NAME: &str = "System.Collections.Hashtable";
pub const INTPTR_TYPE_NAME: &str = "System.IntPtr";
pub const UINTPTR_TYPE_NAME: &str = "System.UIntPtr";
pub const ICOMPARER_TYPE_NAME: &str = "System.Collections.IComparer";
pub const IHASHCODEPROVIDER_TYPE_NAME: &str = "System.Collections.IHashCodeProvider";

pub const PRIMITIVE_MEMBER_NAMES: [&str; 1] = ["m_value"];
pub const NATIVE_INT_MEMBER_NAMES: [&str; 1] = ["value"];
pub const TIME_SPAN_MEMBER_NAMES: [&str; 1] = ["_ticks"];
pub const DATE_TIME_MEMBER_NAMES: [&str; 2] = ["ticks", "dateData"];
pub const DECIMAL_MEMBER_NAMES: [&str; 4] = ["flags", "hi", "lo", "mid"];
pub const LIST_MEMBER_NAMES: [&str; 3] = ["_items", "_size", "_version"];
pub const HASHTABLE_MEMBER_NAMES: [&str; 7] = [
    "LoadFactor",
    "Version",
    "Comparer",
    "HashCodeProvider",
    "HashSize",
    "Keys",
    "Values",
];

/// Scalar type names accepted by the `m_value` scalar root shape.
pub const SCALAR_ROOT_WHITELIST: [PrimitiveType; 12] = [
    PrimitiveType::Boolean,
    PrimitiveType::Char,
    PrimitiveType::SByte,
    PrimitiveType::Byte,
    PrimitiveType::Int16,
    PrimitiveType::UInt16,
    PrimitiveType::Int32,
    PrimitiveType::UInt32,
    PrimitiveType::Int64,
    PrimitiveType::UInt64,
    PrimitiveType::Single,
    PrimitiveType::Double,
];

/// Load factor a default-constructed hashtable reports.
pub const HASHTABLE_LOAD_FACTOR: f32 = 0.72;

/// Prime bucket counts a hashtable grows through.
pub(crate) const HASHTABLE_PRIMES: [i32; 72] = [
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293, 353, 431, 521, 631,
    761, 919, 1103, 1327, 1597, 1931, 2333, 2801, 3371, 4049, 4861, 5839, 7013, 8419, 10103,
    12143, 14591, 17519, 21023, 25229, 30293, 36353, 43627, 52361, 62851, 75431, 90523, 108631,
    130363, 156437, 187751, 225307, 270371, 324449, 389357, 467237, 560689, 672827, 807403,
    968897, 1162687, 1395263, 1674319, 2009191, 2411033, 2893249, 3471899, 4166287, 4999559,
    5999471, 7199369,
];

/// Assembly-qualified generic list name for a given element type name.
pub fn list_type_name(element_type_name: &str) -> String {
    format!("{LIST_TYPE_PREFIX}{element_type_name}, {MSCORLIB_ASSEMBLY_NAME}]]")
}
