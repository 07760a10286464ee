//! `CanonicalEncoder`: writes the record sequences the legacy serializer
//! produces for each supported root shape.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use binfmt_buffers::Writer;

use crate::constants::{
    list_type_name, PrimitiveType, RecordType, ARRAY_LIST_TYPE_NAME, DATE_TIME_MEMBER_NAMES,
    DECIMAL_MEMBER_NAMES, HASHTABLE_LOAD_FACTOR, HASHTABLE_MEMBER_NAMES, HASHTABLE_PRIMES,
    HASHTABLE_TYPE_NAME, HEADER_ID, ICOMPARER_TYPE_NAME, IHASHCODEPROVIDER_TYPE_NAME,
    INTPTR_TYPE_NAME, LIST_MEMBER_NAMES, MAJOR_VERSION, MINOR_VERSION, NATIVE_INT_MEMBER_NAMES,
    PRIMITIVE_MEMBER_NAMES, ROOT_ID, TIME_SPAN_MEMBER_NAMES, UINTPTR_TYPE_NAME,
};
use crate::error::EncodeError;
use crate::map::RecordMap;
use crate::primitive::{DateTime, Decimal, PrimitiveValue, TimeSpan};
use crate::record::{
    ArraySingle, ArraySinglePrimitive, BinaryObjectString, ClassInfo, ClassMetadata, ClassRecord,
    Id, MemberType, MemberTypeInfo, MemberValue, Record, SerializationHeader,
};
use crate::value::Value;

/// Encoder for the closed set of [`Value`] shapes.
///
/// Every payload is a header (root id 1), the root record, any arrays it
/// references, and the terminator. Records are built into a per-call
/// [`RecordMap`] and written as they are completed.
///
/// # Example
///
/// ```
/// use binfmt::CanonicalEncoder;
///
/// let mut encoder = CanonicalEncoder::new();
/// let bytes = encoder.encode_str("hi").unwrap();
/// assert_eq!(&bytes[17..], &[0x06, 0x01, 0x00, 0x00, 0x00, 0x02, b'h', b'i', 0x0b]);
/// ```
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    pub writer: Writer,
    map: RecordMap,
}

impl CanonicalEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_writer(writer: Writer) -> Self {
        Self {
            writer,
            map: RecordMap::new(),
        }
    }

    /// Encodes `value` and returns the payload bytes.
    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        self.writer.reset();
        self.map = RecordMap::new();
        log::debug!("[binfmt] encoding {} root", value.kind());
        self.write_any(value)?;
        Ok(self.writer.flush())
    }

    /// Encodes `value` into `sink`.
    pub fn encode_to<W: Write>(&mut self, value: &Value, sink: &mut W) -> Result<(), EncodeError> {
        let bytes = self.encode(value)?;
        sink.write_all(&bytes)?;
        Ok(())
    }

    pub fn encode_str(&mut self, s: &str) -> Result<Vec<u8>, EncodeError> {
        self.writer.reset();
        self.map = RecordMap::new();
        self.write_string(s)?;
        Ok(self.writer.flush())
    }

    pub fn write_any(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Null => Err(EncodeError::UnsupportedValue("null root")),
            Value::String(s) => self.write_string(s),
            Value::Primitive(p) => self.write_scalar(p),
            Value::NativeInt(v) => self.write_native_int(*v),
            Value::NativeUInt(v) => self.write_native_uint(*v),
            Value::PrimitiveList(ty, values) => self.write_primitive_list(*ty, values),
            Value::StringList(items) => self.write_string_list(items),
            Value::PrimitiveArray(ty, values) => self.write_primitive_array(*ty, values),
            Value::StringArray(items) => self.write_string_array(items),
            Value::ObjectList(items) => self.write_array_list(items),
            Value::Map(entries) => self.write_hashtable(entries),
        }
    }

    fn emit(&mut self, record: Record) -> Result<(), EncodeError> {
        let index = self.map.push(record)?;
        self.map
            .record(index)
            .ok_or(EncodeError::UnknownRecord(index.get()))?
            .write(&mut self.writer, &self.map)
    }

    fn write_header(&mut self) -> Result<(), EncodeError> {
        self.emit(Record::Header(SerializationHeader {
            root_id: ROOT_ID,
            header_id: HEADER_ID,
            major_version: MAJOR_VERSION,
            minor_version: MINOR_VERSION,
        }))
    }

    fn write_end(&mut self) -> Result<(), EncodeError> {
        self.emit(Record::MessageEnd)
    }

    /// Emits the root framework class with member types.
    fn write_system_class(
        &mut self,
        name: &str,
        member_names: &[&str],
        member_types: Vec<MemberType>,
        members: Vec<MemberValue>,
    ) -> Result<(), EncodeError> {
        let metadata = ClassMetadata {
            class_info: ClassInfo::new(ROOT_ID, name, member_names),
            member_types: Some(MemberTypeInfo(member_types)),
            library_id: None,
            record_type: RecordType::SystemClassWithMembersAndTypes,
        };
        self.emit(Record::SystemClassWithMembersAndTypes(ClassRecord {
            object_id: ROOT_ID,
            metadata: Rc::new(metadata),
            members,
        }))
    }

    pub fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        self.write_header()?;
        self.emit(Record::String(BinaryObjectString {
            object_id: ROOT_ID,
            value: s.to_owned(),
        }))?;
        self.write_end()
    }

    /// `System.Decimal` as its four 32-bit words.
    pub fn write_decimal(&mut self, value: Decimal) -> Result<(), EncodeError> {
        let [lo, mid, hi, flags] = value.to_parts();
        self.write_header()?;
        self.write_system_class(
            PrimitiveType::Decimal.type_name(),
            &DECIMAL_MEMBER_NAMES,
            vec![MemberType::Primitive(PrimitiveType::Int32); 4],
            [flags, hi, lo, mid]
                .into_iter()
                .map(|v| MemberValue::Primitive(PrimitiveValue::Int32(v)))
                .collect(),
        )?;
        self.write_end()
    }

    /// `System.DateTime` as plain ticks plus the packed `dateData` word.
    pub fn write_date_time(&mut self, value: DateTime) -> Result<(), EncodeError> {
        self.write_header()?;
        self.write_system_class(
            PrimitiveType::DateTime.type_name(),
            &DATE_TIME_MEMBER_NAMES,
            vec![
                MemberType::Primitive(PrimitiveType::Int64),
                MemberType::Primitive(PrimitiveType::UInt64),
            ],
            vec![
                MemberValue::Primitive(PrimitiveValue::Int64(value.ticks())),
                MemberValue::Primitive(PrimitiveValue::UInt64(value.to_raw())),
            ],
        )?;
        self.write_end()
    }

    pub fn write_time_span(&mut self, value: TimeSpan) -> Result<(), EncodeError> {
        self.write_header()?;
        self.write_system_class(
            PrimitiveType::TimeSpan.type_name(),
            &TIME_SPAN_MEMBER_NAMES,
            vec![MemberType::Primitive(PrimitiveType::Int64)],
            vec![MemberValue::Primitive(PrimitiveValue::Int64(value.ticks))],
        )?;
        self.write_end()
    }

    pub fn write_native_int(&mut self, value: i64) -> Result<(), EncodeError> {
        self.write_header()?;
        self.write_system_class(
            INTPTR_TYPE_NAME,
            &NATIVE_INT_MEMBER_NAMES,
            vec![MemberType::Primitive(PrimitiveType::Int64)],
            vec![MemberValue::Primitive(PrimitiveValue::Int64(value))],
        )?;
        self.write_end()
    }

    pub fn write_native_uint(&mut self, value: u64) -> Result<(), EncodeError> {
        self.write_header()?;
        self.write_system_class(
            UINTPTR_TYPE_NAME,
            &NATIVE_INT_MEMBER_NAMES,
            vec![MemberType::Primitive(PrimitiveType::UInt64)],
            vec![MemberValue::Primitive(PrimitiveValue::UInt64(value))],
        )?;
        self.write_end()
    }

    /// A scalar root. Decimal, date-time and time-span have layouts of their
    /// own; every other kind is wrapped as `m_value` of its runtime type.
    pub fn write_scalar(&mut self, value: &PrimitiveValue) -> Result<(), EncodeError> {
        match value {
            PrimitiveValue::Decimal(d) => return self.write_decimal(*d),
            PrimitiveValue::DateTime(dt) => return self.write_date_time(*dt),
            PrimitiveValue::TimeSpan(ts) => return self.write_time_span(*ts),
            _ => {}
        }
        let ty = value.primitive_type();
        self.write_header()?;
        self.write_system_class(
            ty.type_name(),
            &PRIMITIVE_MEMBER_NAMES,
            vec![MemberType::Primitive(ty)],
            vec![MemberValue::Primitive(*value)],
        )?;
        self.write_end()
    }

    /// `List<T>`: the list class referencing a primitive array with id 2.
    pub fn write_primitive_list(
        &mut self,
        ty: PrimitiveType,
        values: &[PrimitiveValue],
    ) -> Result<(), EncodeError> {
        check_elements(ty, values)?;
        let size = length_i32(values.len())?;
        self.write_header()?;
        self.write_list_class(
            &list_type_name(ty.type_name()),
            MemberType::PrimitiveArray(ty),
            size,
        )?;
        self.emit(Record::ArraySinglePrimitive(ArraySinglePrimitive {
            object_id: 2,
            element_type: ty,
            values: values.to_vec(),
        }))?;
        self.write_end()
    }

    /// `List<string>`: the list class referencing a string array with id 2.
    pub fn write_string_list(&mut self, items: &[Option<String>]) -> Result<(), EncodeError> {
        let size = length_i32(items.len())?;
        self.write_header()?;
        self.write_list_class(
            &list_type_name(PrimitiveType::String.type_name()),
            MemberType::StringArray,
            size,
        )?;
        let mut strings = StringTable::new(3);
        let elements = self.string_slots(items, &mut strings)?;
        self.emit(Record::ArraySingleString(ArraySingle {
            object_id: 2,
            elements,
        }))?;
        self.write_end()
    }

    /// `ArrayList` of strings, scalars and nulls.
    pub fn write_array_list(&mut self, items: &[Value]) -> Result<(), EncodeError> {
        let size = length_i32(items.len())?;
        self.write_header()?;
        self.write_list_class(ARRAY_LIST_TYPE_NAME, MemberType::ObjectArray, size)?;
        let mut strings = StringTable::new(3);
        let elements = self.leaf_slots(items.iter(), &mut strings)?;
        self.emit(Record::ArraySingleObject(ArraySingle {
            object_id: 2,
            elements,
        }))?;
        self.write_end()
    }

    /// `_items, _size, _version` with `_items` referencing id 2.
    fn write_list_class(
        &mut self,
        name: &str,
        items_type: MemberType,
        size: i32,
    ) -> Result<(), EncodeError> {
        self.write_system_class(
            name,
            &LIST_MEMBER_NAMES,
            vec![
                items_type,
                MemberType::Primitive(PrimitiveType::Int32),
                MemberType::Primitive(PrimitiveType::Int32),
            ],
            vec![
                MemberValue::Reference(2),
                MemberValue::Primitive(PrimitiveValue::Int32(size)),
                MemberValue::Primitive(PrimitiveValue::Int32(0)),
            ],
        )
    }

    /// `T[]` as the root record.
    pub fn write_primitive_array(
        &mut self,
        ty: PrimitiveType,
        values: &[PrimitiveValue],
    ) -> Result<(), EncodeError> {
        check_elements(ty, values)?;
        length_i32(values.len())?;
        self.write_header()?;
        self.emit(Record::ArraySinglePrimitive(ArraySinglePrimitive {
            object_id: ROOT_ID,
            element_type: ty,
            values: values.to_vec(),
        }))?;
        self.write_end()
    }

    /// `string[]` as the root record.
    pub fn write_string_array(&mut self, items: &[Option<String>]) -> Result<(), EncodeError> {
        length_i32(items.len())?;
        self.write_header()?;
        let mut strings = StringTable::new(2);
        let elements = self.string_slots(items, &mut strings)?;
        self.emit(Record::ArraySingleString(ArraySingle {
            object_id: ROOT_ID,
            elements,
        }))?;
        self.write_end()
    }

    /// `Hashtable` with default comparer. Keys and values go to object
    /// arrays 2 and 3 in the given order, sharing one string table.
    pub fn write_hashtable(&mut self, entries: &[(Value, Value)]) -> Result<(), EncodeError> {
        for (i, (key, _)) in entries.iter().enumerate() {
            if *key == Value::Null {
                return Err(EncodeError::UnsupportedValue("null hashtable key"));
            }
            if entries[..i].iter().any(|(k, _)| k == key) {
                return Err(EncodeError::UnsupportedValue("duplicate hashtable key"));
            }
        }
        length_i32(entries.len())?;
        let (version, hash_size) = hashtable_layout(entries.len());
        self.write_header()?;
        self.write_system_class(
            HASHTABLE_TYPE_NAME,
            &HASHTABLE_MEMBER_NAMES,
            vec![
                MemberType::Primitive(PrimitiveType::Single),
                MemberType::Primitive(PrimitiveType::Int32),
                MemberType::SystemClass(ICOMPARER_TYPE_NAME.to_owned()),
                MemberType::SystemClass(IHASHCODEPROVIDER_TYPE_NAME.to_owned()),
                MemberType::Primitive(PrimitiveType::Int32),
                MemberType::ObjectArray,
                MemberType::ObjectArray,
            ],
            vec![
                MemberValue::Primitive(PrimitiveValue::Single(HASHTABLE_LOAD_FACTOR)),
                MemberValue::Primitive(PrimitiveValue::Int32(version)),
                MemberValue::Null,
                MemberValue::Null,
                MemberValue::Primitive(PrimitiveValue::Int32(hash_size)),
                MemberValue::Reference(2),
                MemberValue::Reference(3),
            ],
        )?;
        let mut strings = StringTable::new(4);
        let keys = self.leaf_slots(entries.iter().map(|(k, _)| k), &mut strings)?;
        self.emit(Record::ArraySingleObject(ArraySingle {
            object_id: 2,
            elements: keys,
        }))?;
        let values = self.leaf_slots(entries.iter().map(|(_, v)| v), &mut strings)?;
        self.emit(Record::ArraySingleObject(ArraySingle {
            object_id: 3,
            elements: values,
        }))?;
        self.write_end()
    }

    fn string_slots(
        &mut self,
        items: &[Option<String>],
        strings: &mut StringTable,
    ) -> Result<Vec<MemberValue>, EncodeError> {
        items
            .iter()
            .map(|item| match item {
                Some(s) => strings.slot(s, &mut self.map),
                None => Ok(MemberValue::Null),
            })
            .collect()
    }

    fn leaf_slots<'v>(
        &mut self,
        items: impl Iterator<Item = &'v Value>,
        strings: &mut StringTable,
    ) -> Result<Vec<MemberValue>, EncodeError> {
        items
            .map(|item| match item {
                Value::Null => Ok(MemberValue::Null),
                Value::String(s) => strings.slot(s, &mut self.map),
                Value::Primitive(p) => Ok(MemberValue::Primitive(*p)),
                _ => Err(EncodeError::UnsupportedValue(
                    "only strings, scalars and nulls can be elements",
                )),
            })
            .collect()
    }
}

/// Deduplicates strings within one payload: the first occurrence becomes a
/// string record with the next id, later ones reference it.
struct StringTable {
    next_id: Id,
    ids: HashMap<String, Id>,
}

impl StringTable {
    fn new(first_id: Id) -> Self {
        Self {
            next_id: first_id,
            ids: HashMap::new(),
        }
    }

    fn slot(&mut self, s: &str, map: &mut RecordMap) -> Result<MemberValue, EncodeError> {
        if let Some(id) = self.ids.get(s) {
            return Ok(MemberValue::Reference(*id));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(s.to_owned(), id);
        let index = map.push(Record::String(BinaryObjectString {
            object_id: id,
            value: s.to_owned(),
        }))?;
        Ok(MemberValue::Record(index))
    }
}

fn length_i32(length: usize) -> Result<i32, EncodeError> {
    i32::try_from(length).map_err(|_| EncodeError::TooLong(length))
}

fn check_elements(ty: PrimitiveType, values: &[PrimitiveValue]) -> Result<(), EncodeError> {
    if !ty.is_scalar() {
        return Err(EncodeError::UnsupportedValue("element type has no scalar form"));
    }
    match values.iter().find(|v| v.primitive_type() != ty) {
        Some(v) => Err(EncodeError::MixedElementTypes {
            expected: ty,
            found: v.primitive_type(),
        }),
        None => Ok(()),
    }
}

const MAX_PRIME_ARRAY_LENGTH: i32 = 0x7fef_fffd;
const HASH_PRIME: i32 = 101;

/// `Version` and `HashSize` of a default-constructed hashtable after `count`
/// inserts: three buckets to start, grown to the next prime above double
/// whenever the count reaches `load factor * buckets`. Every insert and
/// every rehash bumps the version.
pub fn hashtable_layout(count: usize) -> (i32, i32) {
    let mut buckets = HASHTABLE_PRIMES[0];
    let mut load_size = load_size_of(buckets);
    let mut version = 0i32;
    for inserted in 0..count {
        if inserted >= load_size as usize {
            buckets = expand_prime(buckets);
            load_size = load_size_of(buckets);
            version = version.wrapping_add(1);
        }
        version = version.wrapping_add(1);
    }
    (version, buckets)
}

fn load_size_of(buckets: i32) -> i32 {
    (HASHTABLE_LOAD_FACTOR * buckets as f32) as i32
}

fn expand_prime(old_size: i32) -> i32 {
    let new_size = old_size.saturating_mul(2);
    if new_size > MAX_PRIME_ARRAY_LENGTH && MAX_PRIME_ARRAY_LENGTH > old_size {
        return MAX_PRIME_ARRAY_LENGTH;
    }
    get_prime(new_size)
}

fn get_prime(min: i32) -> i32 {
    if let Some(prime) = HASHTABLE_PRIMES.iter().find(|p| **p >= min) {
        return *prime;
    }
    let mut candidate = min | 1;
    while candidate < i32::MAX {
        if is_prime(candidate) && (candidate - 1) % HASH_PRIME != 0 {
            return candidate;
        }
        candidate += 2;
    }
    min
}

fn is_prime(candidate: i32) -> bool {
    if candidate & 1 == 0 {
        return candidate == 2;
    }
    let limit = f64::from(candidate).sqrt() as i32;
    (3..=limit).step_by(2).all(|divisor| candidate % divisor != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use binfmt_buffers::print_octets;

    #[test]
    fn hashtable_growth() {
        assert_eq!(hashtable_layout(0), (0, 3));
        assert_eq!(hashtable_layout(1), (1, 3));
        assert_eq!(hashtable_layout(2), (2, 3));
        // Third insert reaches load size 2: rehash to 7 buckets first.
        assert_eq!(hashtable_layout(3), (4, 7));
        assert_eq!(hashtable_layout(5), (6, 7));
        // load size of 7 buckets is 5; then 17 buckets, load size 12.
        assert_eq!(hashtable_layout(6), (8, 17));
        assert_eq!(hashtable_layout(12), (14, 17));
        assert_eq!(hashtable_layout(13), (16, 37));
    }

    #[test]
    fn prime_search_past_table() {
        let prime = get_prime(7_199_370);
        assert!(prime >= 7_199_370 && is_prime(prime));
        assert_ne!((prime - 1) % HASH_PRIME, 0);
        assert!(is_prime(7_199_369));
        assert!(!is_prime(9));
    }

    #[test]
    fn scalar_root_layout() {
        let mut encoder = CanonicalEncoder::new();
        let bytes = encoder.encode(&Value::Primitive(PrimitiveValue::Int32(5))).unwrap();
        let mut expected = Writer::new();
        expected.buf(&[0, 1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 1, 0, 0, 0, 0, 0, 0, 0]);
        expected.u8(4);
        expected.i32(1);
        expected.var_u32(12);
        expected.utf8("System.Int32");
        expected.i32(1);
        expected.var_u32(7);
        expected.utf8("m_value");
        expected.buf(&[0, 8]);
        expected.i32(5);
        expected.u8(11);
        assert_eq!(print_octets(&bytes, 128), print_octets(expected.as_slice(), 128));
    }

    #[test]
    fn rejects_mixed_and_nested_elements() {
        let mut encoder = CanonicalEncoder::new();
        let mixed = Value::PrimitiveList(
            PrimitiveType::Int32,
            vec![PrimitiveValue::Int32(1), PrimitiveValue::Int64(2)],
        );
        assert!(matches!(
            encoder.encode(&mixed),
            Err(EncodeError::MixedElementTypes {
                expected: PrimitiveType::Int32,
                found: PrimitiveType::Int64
            })
        ));
        let nested = Value::ObjectList(vec![Value::StringList(vec![])]);
        assert!(matches!(
            encoder.encode(&nested),
            Err(EncodeError::UnsupportedValue(_))
        ));
        assert!(matches!(
            encoder.encode(&Value::Null),
            Err(EncodeError::UnsupportedValue(_))
        ));
    }

    #[test]
    fn hashtable_rejects_duplicate_and_null_keys() {
        let mut encoder = CanonicalEncoder::new();
        let dup = Value::Map(vec![
            (Value::from("a"), Value::Null),
            (Value::from("a"), Value::Null),
        ]);
        assert!(encoder.encode(&dup).is_err());
        let null_key = Value::Map(vec![(Value::Null, Value::from("a"))]);
        assert!(encoder.encode(&null_key).is_err());
    }
}
