//! Safe structural reader and writer for the legacy binary object
//! serialization format (the tag-per-record, reference-graph stream used for
//! clipboard and inter-process object transfer).
//!
//! Decoding never creates anything from a type name found in the stream:
//! [`StreamDecoder`] parses the records into an arena and its recognizers
//! match a closed set of root shapes. [`CanonicalEncoder`] writes the exact
//! record sequences the legacy serializer produces for the same shapes.
//!
//! # Example
//!
//! ```
//! use binfmt::{decode, encode, Value};
//!
//! let value = Value::Map(vec![
//!     (Value::from("width"), Value::from(binfmt::PrimitiveValue::Int32(640))),
//!     (Value::from("title"), Value::from("demo")),
//! ]);
//! let bytes = encode(&value).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), Some(value));
//! ```

mod constants;
mod decoder;
mod encoder;
mod error;
mod map;
mod nulls;
mod options;
mod primitive;
mod recognize;
mod record;
mod value;

pub use constants::{
    list_type_name, BinaryType, PrimitiveType, RecordType, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_NULL_SLOTS, HEADER_ID, MAJOR_VERSION, MINOR_VERSION, MSCORLIB_ASSEMBLY_NAME,
    PREALLOCATION_CAP, ROOT_ID,
};
pub use decoder::StreamDecoder;
pub use encoder::{hashtable_layout, CanonicalEncoder};
pub use error::{DecodeError, EncodeError};
pub use map::RecordMap;
pub use nulls::{expand_run, write_null_run, NullCoalescer};
pub use options::DecodeOptions;
pub use primitive::{
    read_primitive, read_string, write_primitive, write_string, DateTime, DateTimeKind, Decimal,
    PrimitiveValue, TimeSpan, MAX_SCALE, MAX_TICKS, TICKS_PER_MILLISECOND, TICKS_PER_SECOND,
};
pub use record::{
    decode_next, ArraySingle, ArraySinglePrimitive, BinaryLibrary, BinaryObjectString, ClassInfo,
    ClassMetadata, ClassRecord, Id, MemberType, MemberTypeInfo, MemberValue, Record, RecordIndex,
    SerializationHeader,
};
pub use value::Value;

/// Decodes a payload and returns its root value if it has a recognized shape.
pub fn decode(bytes: &[u8]) -> Result<Option<Value>, DecodeError> {
    StreamDecoder::decode(bytes)?.try_get_value()
}

/// Encodes `value` as a complete payload.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    CanonicalEncoder::new().encode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use binfmt_buffers::print_octets;

    const HELLO: [u8; 29] = [
        0x00, 0x01, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x06, 0x01, 0x00, 0x00, 0x00, 0x05, b'h', b'e', b'l', b'l', b'o', 0x0b,
    ];

    #[test]
    fn hello_decodes_and_encodes_exactly() {
        let decoder = StreamDecoder::decode(&HELLO).unwrap();
        assert_eq!(decoder.try_get_string(), Ok(Some("hello".to_owned())));
        assert_eq!(decoder.consumed(), HELLO.len());
        let bytes = encode(&Value::from("hello")).unwrap();
        assert_eq!(print_octets(&bytes, 64), print_octets(&HELLO, 64));
    }

    #[test]
    fn decoded_records_rewrite_to_same_bytes() {
        let decoder = StreamDecoder::decode(&HELLO).unwrap();
        let mut writer = binfmt_buffers::Writer::new();
        for record in decoder.records() {
            record.write(&mut writer, decoder.map()).unwrap();
        }
        assert_eq!(writer.flush(), HELLO.to_vec());
    }

    #[test]
    fn unrecognized_root_is_none() {
        let value = Value::Primitive(PrimitiveValue::Int32(1));
        let mut bytes = encode(&value).unwrap();
        // Rename System.Int32 to System.Int33.
        let at = bytes.windows(12).position(|w| w == b"System.Int32").unwrap();
        bytes[at + 11] = b'3';
        assert_eq!(decode(&bytes), Ok(None));
    }
}
