//! Record dispatch and the per-variant parse routines.

use std::rc::Rc;

use binfmt_buffers::{print_window, Reader};

use super::{
    ArraySingle, ArraySinglePrimitive, BinaryLibrary, BinaryObjectString, ClassInfo,
    ClassMetadata, ClassRecord, Id, MemberType, MemberTypeInfo, MemberValue, Record,
    RecordIndex, SerializationHeader,
};
use crate::constants::{BinaryType, PrimitiveType, RecordType, PREALLOCATION_CAP};
use crate::error::DecodeError;
use crate::map::RecordMap;
use crate::nulls::expand_run;
use crate::primitive::{read_primitive, read_string};

/// Outcome of reading one record: referenceable records go to the arena,
/// inline ones are handed back to the caller.
enum Parsed {
    Stored(RecordIndex),
    Inline(Record),
}

/// Reads the next record and stores it in `map`, returning its slot.
///
/// Nested members and elements are read recursively; `depth` is the nesting
/// level of this record and is checked against the session's `max_depth`.
pub fn decode_next(
    reader: &mut Reader<'_>,
    map: &mut RecordMap,
    depth: usize,
) -> Result<RecordIndex, DecodeError> {
    match read_record(reader, map, depth)? {
        Parsed::Stored(index) => Ok(index),
        Parsed::Inline(record) => map.push(record),
    }
}

fn read_record(
    reader: &mut Reader<'_>,
    map: &mut RecordMap,
    depth: usize,
) -> Result<Parsed, DecodeError> {
    let max_depth = map.options().max_depth;
    if depth > max_depth {
        log::debug!("[binfmt] nesting depth {depth} exceeds limit {max_depth}");
        return Err(DecodeError::DepthLimitExceeded(max_depth));
    }
    let offset = reader.x;
    let tag = reader.u8()?;
    let Some(record_type) = RecordType::from_u8(tag) else {
        log::debug!(
            "[binfmt] unknown record tag 0x{tag:02x} at offset {offset}: {}",
            print_window(reader.uint8, offset)
        );
        return Err(DecodeError::UnknownRecordType { tag, offset });
    };
    log::trace!("[binfmt] {record_type:?} at offset {offset}, depth {depth}");
    let inline = match record_type {
        RecordType::SerializedStreamHeader => Record::Header(read_header(reader)?),
        RecordType::ClassWithId => return read_class_with_id(reader, map, depth),
        RecordType::SystemClassWithMembers
        | RecordType::ClassWithMembers
        | RecordType::SystemClassWithMembersAndTypes
        | RecordType::ClassWithMembersAndTypes => {
            return read_class(reader, map, depth, record_type)
        }
        RecordType::BinaryObjectString => {
            let object_id = reader.i32()?;
            let value = read_string(reader)?;
            let record = Record::String(BinaryObjectString { object_id, value });
            return map.push(record).map(Parsed::Stored);
        }
        RecordType::MemberPrimitiveTyped => {
            let ty = read_primitive_type(reader)?;
            Record::MemberPrimitiveTyped(read_primitive(reader, ty)?)
        }
        RecordType::MemberReference => Record::MemberReference(reader.i32()?),
        RecordType::ObjectNull => Record::ObjectNull,
        RecordType::MessageEnd => Record::MessageEnd,
        RecordType::BinaryLibrary => {
            let library_id = reader.i32()?;
            let name = read_string(reader)?;
            let record = Record::BinaryLibrary(BinaryLibrary { library_id, name });
            return map.push(record).map(Parsed::Stored);
        }
        RecordType::ObjectNullMultiple256 => Record::ObjectNullMultiple256(reader.u8()?),
        RecordType::ObjectNullMultiple => Record::ObjectNullMultiple(reader.i32()?),
        RecordType::ArraySinglePrimitive => return read_array_primitive(reader, map),
        RecordType::ArraySingleObject | RecordType::ArraySingleString => {
            return read_array_single(reader, map, depth, record_type)
        }
        RecordType::BinaryArray => {
            log::debug!("[binfmt] rejecting multi-dimensional array at offset {offset}");
            return Err(DecodeError::NotImplemented(record_type));
        }
        RecordType::MethodCall | RecordType::MethodReturn => {
            log::debug!("[binfmt] rejecting remote method record at offset {offset}");
            return Err(DecodeError::Unsupported(record_type));
        }
    };
    Ok(Parsed::Inline(inline))
}

fn read_header(reader: &mut Reader<'_>) -> Result<SerializationHeader, DecodeError> {
    Ok(SerializationHeader {
        root_id: reader.i32()?,
        header_id: reader.i32()?,
        major_version: reader.i32()?,
        minor_version: reader.i32()?,
    })
}

fn read_length(reader: &mut Reader<'_>) -> Result<usize, DecodeError> {
    let length = reader.i32()?;
    usize::try_from(length).map_err(|_| DecodeError::InvalidLength(length))
}

fn read_primitive_type(reader: &mut Reader<'_>) -> Result<PrimitiveType, DecodeError> {
    let code = reader.u8()?;
    PrimitiveType::from_u8(code).ok_or(DecodeError::InvalidPrimitiveType(code))
}

fn read_class_info(reader: &mut Reader<'_>) -> Result<ClassInfo, DecodeError> {
    let object_id = reader.i32()?;
    let name = read_string(reader)?;
    let count = read_length(reader)?;
    let mut member_names = Vec::with_capacity(count.min(PREALLOCATION_CAP));
    for _ in 0..count {
        member_names.push(read_string(reader)?);
    }
    Ok(ClassInfo {
        object_id,
        name,
        member_names,
    })
}

fn read_member_type_info(
    reader: &mut Reader<'_>,
    count: usize,
) -> Result<MemberTypeInfo, DecodeError> {
    let mut binary_types = Vec::with_capacity(count.min(PREALLOCATION_CAP));
    for _ in 0..count {
        let code = reader.u8()?;
        binary_types.push(BinaryType::from_u8(code).ok_or(DecodeError::InvalidBinaryType(code))?);
    }
    let mut entries = Vec::with_capacity(binary_types.len());
    for binary_type in binary_types {
        entries.push(match binary_type {
            BinaryType::Primitive => MemberType::Primitive(read_primitive_type(reader)?),
            BinaryType::String => MemberType::String,
            BinaryType::Object => MemberType::Object,
            BinaryType::SystemClass => MemberType::SystemClass(read_string(reader)?),
            BinaryType::Class => MemberType::Class {
                type_name: read_string(reader)?,
                library_id: reader.i32()?,
            },
            BinaryType::ObjectArray => MemberType::ObjectArray,
            BinaryType::StringArray => MemberType::StringArray,
            BinaryType::PrimitiveArray => MemberType::PrimitiveArray(read_primitive_type(reader)?),
        });
    }
    Ok(MemberTypeInfo(entries))
}

fn read_class(
    reader: &mut Reader<'_>,
    map: &mut RecordMap,
    depth: usize,
    record_type: RecordType,
) -> Result<Parsed, DecodeError> {
    let class_info = read_class_info(reader)?;
    let count = class_info.member_names.len();
    let member_types = match record_type {
        RecordType::SystemClassWithMembersAndTypes | RecordType::ClassWithMembersAndTypes => {
            Some(read_member_type_info(reader, count)?)
        }
        _ => None,
    };
    let library_id = match record_type {
        RecordType::ClassWithMembers | RecordType::ClassWithMembersAndTypes => {
            Some(reader.i32()?)
        }
        _ => None,
    };
    let object_id = class_info.object_id;
    let metadata = Rc::new(ClassMetadata {
        class_info,
        member_types,
        library_id,
        record_type,
    });
    let index = map.reserve(Some(object_id))?;
    map.register_class(object_id, Rc::clone(&metadata));
    let members = read_members(reader, map, depth, &metadata)?;
    let class = ClassRecord {
        object_id,
        metadata,
        members,
    };
    let record = match record_type {
        RecordType::SystemClassWithMembers => Record::SystemClassWithMembers(class),
        RecordType::ClassWithMembers => Record::ClassWithMembers(class),
        RecordType::SystemClassWithMembersAndTypes => Record::SystemClassWithMembersAndTypes(class),
        _ => Record::ClassWithMembersAndTypes(class),
    };
    map.fill(index, record);
    Ok(Parsed::Stored(index))
}

fn read_class_with_id(
    reader: &mut Reader<'_>,
    map: &mut RecordMap,
    depth: usize,
) -> Result<Parsed, DecodeError> {
    let object_id = reader.i32()?;
    let metadata_id = reader.i32()?;
    let metadata = map.class_metadata(metadata_id)?;
    let index = map.reserve(Some(object_id))?;
    let members = read_members(reader, map, depth, &metadata)?;
    map.fill(
        index,
        Record::ClassWithId(ClassRecord {
            object_id,
            metadata,
            members,
        }),
    );
    Ok(Parsed::Stored(index))
}

/// Reads the member values of a class, inline for primitive members when the
/// layout carries types and by recursive dispatch otherwise.
fn read_members(
    reader: &mut Reader<'_>,
    map: &mut RecordMap,
    depth: usize,
    metadata: &ClassMetadata,
) -> Result<Vec<MemberValue>, DecodeError> {
    let count = metadata.class_info.member_names.len();
    let types = metadata.member_types.as_ref().map(|t| t.0.as_slice());
    if types.is_some_and(|t| t.len() != count) {
        return Err(DecodeError::MemberCountMismatch(count));
    }
    let mut members = Vec::with_capacity(count.min(PREALLOCATION_CAP));
    while members.len() < count {
        let position = members.len();
        if let Some(MemberType::Primitive(ty)) = types.and_then(|t| t.get(position)) {
            members.push(MemberValue::Primitive(read_primitive(reader, *ty)?));
            continue;
        }
        // A null run stops short of the next inline primitive member.
        let bound = types
            .and_then(|t| {
                t.get(position..)?
                    .iter()
                    .position(|ty| matches!(ty, MemberType::Primitive(_)))
            })
            .map_or(count, |offset| position + offset);
        read_slot(reader, map, depth, &mut members, bound)?;
    }
    Ok(members)
}

/// Reads one slot record into `out`: a value, a reference, or a null run.
/// A null run may fill slots up to index `bound`.
fn read_slot(
    reader: &mut Reader<'_>,
    map: &mut RecordMap,
    depth: usize,
    out: &mut Vec<MemberValue>,
    bound: usize,
) -> Result<(), DecodeError> {
    loop {
        let value = match read_record(reader, map, depth + 1)? {
            Parsed::Stored(index) => {
                if let Some(Record::BinaryLibrary(_)) = map.record(index) {
                    continue;
                }
                MemberValue::Record(index)
            }
            Parsed::Inline(record) => {
                if let Some(count) = record.null_count() {
                    let count = expand_run(out.len(), count, bound)?;
                    if !matches!(record, Record::ObjectNull) {
                        map.take_null_slots(count)?;
                    }
                    out.resize(out.len() + count, MemberValue::Null);
                    return Ok(());
                }
                match record {
                    Record::MemberPrimitiveTyped(value) => MemberValue::Primitive(value),
                    Record::MemberReference(id) => MemberValue::Reference(id),
                    other => {
                        log::debug!("[binfmt] {:?} in a member position", other.record_type());
                        return Err(DecodeError::UnexpectedRecord(other.record_type()));
                    }
                }
            }
        };
        out.push(value);
        return Ok(());
    }
}

fn read_array_primitive(
    reader: &mut Reader<'_>,
    map: &mut RecordMap,
) -> Result<Parsed, DecodeError> {
    let object_id = reader.i32()?;
    let length = read_length(reader)?;
    let element_type = read_primitive_type(reader)?;
    if !element_type.is_scalar() {
        return Err(DecodeError::NonScalarPrimitive(element_type));
    }
    let mut values = Vec::with_capacity(length.min(PREALLOCATION_CAP));
    for _ in 0..length {
        values.push(read_primitive(reader, element_type)?);
    }
    let record = Record::ArraySinglePrimitive(ArraySinglePrimitive {
        object_id,
        element_type,
        values,
    });
    map.push(record).map(Parsed::Stored)
}

fn read_array_single(
    reader: &mut Reader<'_>,
    map: &mut RecordMap,
    depth: usize,
    record_type: RecordType,
) -> Result<Parsed, DecodeError> {
    let object_id: Id = reader.i32()?;
    let length = read_length(reader)?;
    let index = map.reserve(Some(object_id))?;
    let mut elements = Vec::with_capacity(length.min(PREALLOCATION_CAP));
    while elements.len() < length {
        read_slot(reader, map, depth, &mut elements, length)?;
    }
    let array = ArraySingle {
        object_id,
        elements,
    };
    let record = match record_type {
        RecordType::ArraySingleString => Record::ArraySingleString(array),
        _ => Record::ArraySingleObject(array),
    };
    map.fill(index, record);
    Ok(Parsed::Stored(index))
}
