//! The record model: one variant per wire tag.
//!
//! Records that carry an id live in the [`RecordMap`](crate::RecordMap) arena
//! and refer to their children by [`RecordIndex`]. Back-references stay as ids
//! until they are resolved, so forward references and cycles need no special
//! casing while parsing.

mod parse;
mod write;

use std::rc::Rc;

pub use parse::decode_next;

use crate::constants::{BinaryType, PrimitiveType, RecordType};
use crate::primitive::PrimitiveValue;

/// Identifier of a referenceable record. `0` means "not referenceable".
pub type Id = i32;

/// Position of a record in the [`RecordMap`](crate::RecordMap) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordIndex(pub(crate) usize);

impl RecordIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Object id, type name and ordered member names of a class record.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub object_id: Id,
    pub name: String,
    pub member_names: Vec<String>,
}

impl ClassInfo {
    pub fn new(object_id: Id, name: impl Into<String>, member_names: &[&str]) -> Self {
        Self {
            object_id,
            name: name.into(),
            member_names: member_names.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// `true` when the member names are exactly `names`, in order.
    pub fn has_members(&self, names: &[&str]) -> bool {
        self.member_names.len() == names.len()
            && self.member_names.iter().zip(names).all(|(a, b)| a == b)
    }
}

/// Declared wire shape of one class member together with its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberType {
    Primitive(PrimitiveType),
    String,
    Object,
    SystemClass(String),
    Class { type_name: String, library_id: Id },
    ObjectArray,
    StringArray,
    PrimitiveArray(PrimitiveType),
}

impl MemberType {
    pub fn binary_type(&self) -> BinaryType {
        match self {
            Self::Primitive(_) => BinaryType::Primitive,
            Self::String => BinaryType::String,
            Self::Object => BinaryType::Object,
            Self::SystemClass(_) => BinaryType::SystemClass,
            Self::Class { .. } => BinaryType::Class,
            Self::ObjectArray => BinaryType::ObjectArray,
            Self::StringArray => BinaryType::StringArray,
            Self::PrimitiveArray(_) => BinaryType::PrimitiveArray,
        }
    }
}

/// Member type metadata, one entry per member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberTypeInfo(pub Vec<MemberType>);

/// Layout shared by a class record and every `ClassWithId` that reuses it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    pub class_info: ClassInfo,
    /// `None` for the metadata-less shapes, whose members are all records.
    pub member_types: Option<MemberTypeInfo>,
    /// `None` for framework ("system") classes.
    pub library_id: Option<Id>,
    /// Tag of the record that defined this layout.
    pub record_type: RecordType,
}

/// One member or element slot of a class or array record.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberValue {
    Null,
    Primitive(PrimitiveValue),
    /// Unresolved back-reference to the record carrying this id.
    Reference(Id),
    /// Record nested inline at this position.
    Record(RecordIndex),
}

/// An instance of a class: its own id, shared layout, and member values.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
    pub object_id: Id,
    pub metadata: Rc<ClassMetadata>,
    pub members: Vec<MemberValue>,
}

impl ClassRecord {
    pub fn name(&self) -> &str {
        &self.metadata.class_info.name
    }

    /// Member value by name.
    pub fn member(&self, name: &str) -> Option<&MemberValue> {
        let position = self
            .metadata
            .class_info
            .member_names
            .iter()
            .position(|n| n == name)?;
        self.members.get(position)
    }

    /// Declared type of the member at `position`, if the layout carries types.
    pub fn member_type(&self, position: usize) -> Option<&MemberType> {
        self.metadata.member_types.as_ref()?.0.get(position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationHeader {
    pub root_id: Id,
    pub header_id: Id,
    pub major_version: i32,
    pub minor_version: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryObjectString {
    pub object_id: Id,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryLibrary {
    pub library_id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySinglePrimitive {
    pub object_id: Id,
    pub element_type: PrimitiveType,
    pub values: Vec<PrimitiveValue>,
}

/// Array of object or string elements; null runs are already expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySingle {
    pub object_id: Id,
    pub elements: Vec<MemberValue>,
}

/// A single wire record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Header(SerializationHeader),
    ClassWithId(ClassRecord),
    SystemClassWithMembers(ClassRecord),
    ClassWithMembers(ClassRecord),
    SystemClassWithMembersAndTypes(ClassRecord),
    ClassWithMembersAndTypes(ClassRecord),
    String(BinaryObjectString),
    MemberPrimitiveTyped(PrimitiveValue),
    MemberReference(Id),
    ObjectNull,
    MessageEnd,
    BinaryLibrary(BinaryLibrary),
    ObjectNullMultiple256(u8),
    ObjectNullMultiple(i32),
    ArraySinglePrimitive(ArraySinglePrimitive),
    ArraySingleObject(ArraySingle),
    ArraySingleString(ArraySingle),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Header(_) => RecordType::SerializedStreamHeader,
            Self::ClassWithId(_) => RecordType::ClassWithId,
            Self::SystemClassWithMembers(_) => RecordType::SystemClassWithMembers,
            Self::ClassWithMembers(_) => RecordType::ClassWithMembers,
            Self::SystemClassWithMembersAndTypes(_) => RecordType::SystemClassWithMembersAndTypes,
            Self::ClassWithMembersAndTypes(_) => RecordType::ClassWithMembersAndTypes,
            Self::String(_) => RecordType::BinaryObjectString,
            Self::MemberPrimitiveTyped(_) => RecordType::MemberPrimitiveTyped,
            Self::MemberReference(_) => RecordType::MemberReference,
            Self::ObjectNull => RecordType::ObjectNull,
            Self::MessageEnd => RecordType::MessageEnd,
            Self::BinaryLibrary(_) => RecordType::BinaryLibrary,
            Self::ObjectNullMultiple256(_) => RecordType::ObjectNullMultiple256,
            Self::ObjectNullMultiple(_) => RecordType::ObjectNullMultiple,
            Self::ArraySinglePrimitive(_) => RecordType::ArraySinglePrimitive,
            Self::ArraySingleObject(_) => RecordType::ArraySingleObject,
            Self::ArraySingleString(_) => RecordType::ArraySingleString,
        }
    }

    /// Id this record registers, or `None` for inline records.
    pub fn id(&self) -> Option<Id> {
        match self {
            Self::ClassWithId(c)
            | Self::SystemClassWithMembers(c)
            | Self::ClassWithMembers(c)
            | Self::SystemClassWithMembersAndTypes(c)
            | Self::ClassWithMembersAndTypes(c) => Some(c.object_id),
            Self::String(s) => Some(s.object_id),
            Self::BinaryLibrary(l) => Some(l.library_id),
            Self::ArraySinglePrimitive(a) => Some(a.object_id),
            Self::ArraySingleObject(a) | Self::ArraySingleString(a) => Some(a.object_id),
            Self::Header(_)
            | Self::MemberPrimitiveTyped(_)
            | Self::MemberReference(_)
            | Self::ObjectNull
            | Self::MessageEnd
            | Self::ObjectNullMultiple256(_)
            | Self::ObjectNullMultiple(_) => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassRecord> {
        match self {
            Self::ClassWithId(c)
            | Self::SystemClassWithMembers(c)
            | Self::ClassWithMembers(c)
            | Self::SystemClassWithMembersAndTypes(c)
            | Self::ClassWithMembersAndTypes(c) => Some(c),
            _ => None,
        }
    }

    /// Member or element slots holding nested records and back-references.
    pub(crate) fn slots(&self) -> &[MemberValue] {
        match self {
            Self::ArraySingleObject(a) | Self::ArraySingleString(a) => &a.elements,
            _ => self.as_class().map_or(&[], |c| &c.members),
        }
    }

    /// Number of null slots this record stands for, if it is a null record.
    pub fn null_count(&self) -> Option<i64> {
        match *self {
            Self::ObjectNull => Some(1),
            Self::ObjectNullMultiple256(count) => Some(count.into()),
            Self::ObjectNullMultiple(count) => Some(count.into()),
            _ => None,
        }
    }
}
