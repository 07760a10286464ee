//! Wire form of every record variant.

use binfmt_buffers::Writer;

use super::{ClassInfo, ClassRecord, MemberType, MemberTypeInfo, MemberValue, Record};
use crate::constants::RecordType;
use crate::error::EncodeError;
use crate::map::RecordMap;
use crate::nulls::NullCoalescer;
use crate::primitive::{write_primitive, write_string, PrimitiveValue};

fn write_length(writer: &mut Writer, length: usize) -> Result<(), EncodeError> {
    let length = i32::try_from(length).map_err(|_| EncodeError::TooLong(length))?;
    writer.i32(length);
    Ok(())
}

impl ClassInfo {
    pub fn write(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        writer.i32(self.object_id);
        write_string(writer, &self.name);
        write_length(writer, self.member_names.len())?;
        for name in &self.member_names {
            write_string(writer, name);
        }
        Ok(())
    }
}

impl MemberTypeInfo {
    /// All binary type bytes first, then each entry's descriptor.
    pub fn write(&self, writer: &mut Writer) {
        for entry in &self.0 {
            writer.u8(entry.binary_type() as u8);
        }
        for entry in &self.0 {
            match entry {
                MemberType::Primitive(ty) | MemberType::PrimitiveArray(ty) => writer.u8(*ty as u8),
                MemberType::SystemClass(name) => write_string(writer, name),
                MemberType::Class {
                    type_name,
                    library_id,
                } => {
                    write_string(writer, type_name);
                    writer.i32(*library_id);
                }
                MemberType::String
                | MemberType::Object
                | MemberType::ObjectArray
                | MemberType::StringArray => {}
            }
        }
    }
}

impl Record {
    /// Writes this record; nested records are looked up in `map`.
    pub fn write(&self, writer: &mut Writer, map: &RecordMap) -> Result<(), EncodeError> {
        writer.u8(self.record_type() as u8);
        match self {
            Self::Header(header) => {
                writer.i32(header.root_id);
                writer.i32(header.header_id);
                writer.i32(header.major_version);
                writer.i32(header.minor_version);
            }
            Self::ClassWithId(class) => {
                writer.i32(class.object_id);
                writer.i32(class.metadata.class_info.object_id);
                write_members(writer, map, class)?;
            }
            Self::SystemClassWithMembers(class)
            | Self::ClassWithMembers(class)
            | Self::SystemClassWithMembersAndTypes(class)
            | Self::ClassWithMembersAndTypes(class) => {
                let metadata = &class.metadata;
                metadata.class_info.write(writer)?;
                if let Some(types) = &metadata.member_types {
                    types.write(writer);
                }
                if let Some(library_id) = metadata.library_id {
                    writer.i32(library_id);
                }
                write_members(writer, map, class)?;
            }
            Self::String(s) => {
                writer.i32(s.object_id);
                write_string(writer, &s.value);
            }
            Self::MemberPrimitiveTyped(value) => write_primitive_typed(writer, value)?,
            Self::MemberReference(id) => writer.i32(*id),
            Self::ObjectNull | Self::MessageEnd => {}
            Self::BinaryLibrary(library) => {
                writer.i32(library.library_id);
                write_string(writer, &library.name);
            }
            Self::ObjectNullMultiple256(count) => writer.u8(*count),
            Self::ObjectNullMultiple(count) => writer.i32(*count),
            Self::ArraySinglePrimitive(array) => {
                writer.i32(array.object_id);
                write_length(writer, array.values.len())?;
                writer.u8(array.element_type as u8);
                for value in &array.values {
                    write_primitive(writer, value)?;
                }
            }
            Self::ArraySingleObject(array) | Self::ArraySingleString(array) => {
                writer.i32(array.object_id);
                write_length(writer, array.elements.len())?;
                let mut nulls = NullCoalescer::new();
                for element in &array.elements {
                    if *element == MemberValue::Null {
                        nulls.push_null();
                        continue;
                    }
                    nulls.flush(writer);
                    write_slot(writer, map, element)?;
                }
                nulls.flush(writer);
            }
        }
        Ok(())
    }
}

/// Class members: primitive members of a typed layout go inline, the rest
/// as records. Each null member gets its own `ObjectNull`.
fn write_members(
    writer: &mut Writer,
    map: &RecordMap,
    class: &ClassRecord,
) -> Result<(), EncodeError> {
    for (position, member) in class.members.iter().enumerate() {
        match (class.member_type(position), member) {
            (Some(MemberType::Primitive(_)), MemberValue::Primitive(value)) => {
                write_primitive(writer, value)?
            }
            (Some(MemberType::Primitive(_)), _) => {
                return Err(EncodeError::UnsupportedValue(
                    "non-primitive value in a primitive member",
                ))
            }
            _ => write_slot(writer, map, member)?,
        }
    }
    Ok(())
}

fn write_slot(writer: &mut Writer, map: &RecordMap, value: &MemberValue) -> Result<(), EncodeError> {
    match value {
        MemberValue::Null => writer.u8(RecordType::ObjectNull as u8),
        MemberValue::Primitive(value) => {
            writer.u8(RecordType::MemberPrimitiveTyped as u8);
            write_primitive_typed(writer, value)?;
        }
        MemberValue::Reference(id) => {
            writer.u8(RecordType::MemberReference as u8);
            writer.i32(*id);
        }
        MemberValue::Record(index) => map
            .record(*index)
            .ok_or(EncodeError::UnknownRecord(index.get()))?
            .write(writer, map)?,
    }
    Ok(())
}

fn write_primitive_typed(writer: &mut Writer, value: &PrimitiveValue) -> Result<(), EncodeError> {
    writer.u8(value.primitive_type() as u8);
    write_primitive(writer, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PrimitiveType;
    use crate::record::{ArraySingle, BinaryObjectString};
    use binfmt_buffers::print_octets;

    #[test]
    fn member_type_info_layout() {
        let info = MemberTypeInfo(vec![
            MemberType::Primitive(PrimitiveType::Int32),
            MemberType::String,
            MemberType::Class {
                type_name: "T".to_owned(),
                library_id: 2,
            },
        ]);
        let mut writer = Writer::new();
        info.write(&mut writer);
        assert_eq!(
            writer.flush(),
            vec![0, 1, 4, 8, 1, b'T', 2, 0, 0, 0]
        );
    }

    #[test]
    fn object_array_coalesces_nulls_and_inlines_children() {
        let mut map = RecordMap::new();
        let child = map
            .push(Record::String(BinaryObjectString {
                object_id: 2,
                value: "a".to_owned(),
            }))
            .unwrap();
        let array = Record::ArraySingleObject(ArraySingle {
            object_id: 1,
            elements: vec![
                MemberValue::Null,
                MemberValue::Null,
                MemberValue::Record(child),
                MemberValue::Reference(2),
                MemberValue::Null,
            ],
        });
        let mut writer = Writer::new();
        array.write(&mut writer, &map).unwrap();
        assert_eq!(
            print_octets(writer.as_slice(), 64),
            "10 01 00 00 00 05 00 00 00 0d 02 06 02 00 00 00 01 61 09 02 00 00 00 0a"
        );
    }

    #[test]
    fn dangling_child_index_is_an_error() {
        let map = RecordMap::new();
        let array = Record::ArraySingleString(ArraySingle {
            object_id: 1,
            elements: vec![MemberValue::Record(crate::record::RecordIndex(4))],
        });
        let mut writer = Writer::new();
        assert!(matches!(
            array.write(&mut writer, &map),
            Err(EncodeError::UnknownRecord(4))
        ));
    }
}
