//! Top-level stream decoding: header, records, terminator, validation.

use binfmt_buffers::Reader;

use crate::constants::{RecordType, MAJOR_VERSION, MINOR_VERSION};
use crate::error::DecodeError;
use crate::map::RecordMap;
use crate::options::DecodeOptions;
use crate::record::{decode_next, Id, MemberValue, Record, RecordIndex, SerializationHeader};

/// A fully decoded stream.
///
/// Holds the top-level records in wire order and the [`RecordMap`] arena with
/// every record, nested ones included. Construction fails unless the stream
/// starts with a header, ends with a terminator, and every back-reference
/// and the root id resolve.
///
/// # Example
///
/// ```
/// use binfmt::StreamDecoder;
///
/// let bytes = [
///     0x00, 0x01, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x01, 0x00, 0x00, 0x00,
///     0x00, 0x00, 0x00, 0x00, 0x06, 0x01, 0x00, 0x00, 0x00, 0x02, b'h', b'i', 0x0b,
/// ];
/// let decoder = StreamDecoder::decode(&bytes).unwrap();
/// assert_eq!(decoder.try_get_string().unwrap().as_deref(), Some("hi"));
/// assert_eq!(decoder.consumed(), bytes.len());
/// ```
#[derive(Debug)]
pub struct StreamDecoder {
    header: SerializationHeader,
    records: Vec<RecordIndex>,
    map: RecordMap,
    consumed: usize,
}

impl StreamDecoder {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::with_options(bytes, DecodeOptions::default())
    }

    /// Decodes records up to and including the terminator. Bytes after the
    /// terminator are left alone; see [`StreamDecoder::consumed`].
    pub fn with_options(bytes: &[u8], options: DecodeOptions) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);
        let mut map = RecordMap::with_options(options);

        if reader.peek()? != RecordType::SerializedStreamHeader as u8 {
            log::debug!("[binfmt] stream does not start with a header");
            return Err(DecodeError::MissingHeader);
        }
        let first = decode_next(&mut reader, &mut map, 0)?;
        let header = match map.record(first) {
            Some(Record::Header(header)) => *header,
            _ => return Err(DecodeError::MissingHeader),
        };
        if header.major_version != MAJOR_VERSION || header.minor_version != MINOR_VERSION {
            log::debug!(
                "[binfmt] unsupported version {}.{}",
                header.major_version,
                header.minor_version
            );
            return Err(DecodeError::InvalidVersion {
                major: header.major_version,
                minor: header.minor_version,
            });
        }

        let mut records = vec![first];
        loop {
            let index = decode_next(&mut reader, &mut map, 0)?;
            records.push(index);
            match map.record(index).map(Record::record_type) {
                Some(RecordType::MessageEnd) => break,
                // Null runs and member-only records need an enclosing sequence.
                Some(
                    record_type @ (RecordType::SerializedStreamHeader
                    | RecordType::ObjectNull
                    | RecordType::ObjectNullMultiple256
                    | RecordType::ObjectNullMultiple
                    | RecordType::MemberPrimitiveTyped
                    | RecordType::MemberReference),
                ) => {
                    log::debug!("[binfmt] {record_type:?} at top level");
                    return Err(DecodeError::UnexpectedRecord(record_type));
                }
                _ => {}
            }
        }

        let decoder = Self {
            header,
            records,
            map,
            consumed: reader.x,
        };
        decoder.validate()?;
        log::debug!(
            "[binfmt] decoded {} records ({} top-level) from {} bytes",
            decoder.map.len(),
            decoder.records.len(),
            decoder.consumed
        );
        Ok(decoder)
    }

    /// Checks every back-reference, library id and the root id.
    fn validate(&self) -> Result<(), DecodeError> {
        let check = |id: Id| {
            if self.map.contains(id) {
                Ok(())
            } else {
                log::debug!("[binfmt] unresolved reference to id {id}");
                Err(DecodeError::UnresolvedReference(id))
            }
        };
        for (_, record) in self.map.iter() {
            if let Some(library_id) = record.as_class().and_then(|c| c.metadata.library_id) {
                check(library_id)?;
            }
            for slot in record.slots() {
                if let MemberValue::Reference(id) = slot {
                    check(*id)?;
                }
            }
        }
        check(self.header.root_id)
    }

    pub fn header(&self) -> &SerializationHeader {
        &self.header
    }

    /// Top-level records in wire order, header and terminator included.
    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter().filter_map(|index| self.map.record(*index))
    }

    /// Number of top-level records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Top-level record at `position`.
    pub fn record_at(&self, position: usize) -> Option<&Record> {
        self.map.record(*self.records.get(position)?)
    }

    pub fn record_by_id(&self, id: Id) -> Result<&Record, DecodeError> {
        self.map.get(id)
    }

    /// The record named by the header's root id.
    pub fn root_record(&self) -> Result<&Record, DecodeError> {
        self.map.get(self.header.root_id)
    }

    /// Follows a member slot to its record. `None` for nulls and primitives.
    pub fn resolve(&self, value: &MemberValue) -> Result<Option<&Record>, DecodeError> {
        match value {
            MemberValue::Null | MemberValue::Primitive(_) => Ok(None),
            MemberValue::Reference(id) => self.map.get(*id).map(Some),
            MemberValue::Record(index) => Ok(self.map.record(*index)),
        }
    }

    pub fn map(&self) -> &RecordMap {
        &self.map
    }

    /// Bytes read, terminator included.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binfmt_buffers::Writer;

    fn header(writer: &mut Writer, root_id: Id) {
        writer.u8(0);
        writer.i32(root_id);
        writer.i32(-1);
        writer.i32(1);
        writer.i32(0);
    }

    fn string(writer: &mut Writer, id: Id, value: &str) {
        writer.u8(6);
        writer.i32(id);
        writer.var_u32(value.len() as u32);
        writer.utf8(value);
    }

    #[test]
    fn trailing_bytes_are_not_consumed() {
        let mut w = Writer::new();
        header(&mut w, 1);
        string(&mut w, 1, "x");
        w.u8(11);
        let end = w.len();
        w.buf(&[0xde, 0xad]);
        let decoder = StreamDecoder::decode(w.as_slice()).unwrap();
        assert_eq!(decoder.consumed(), end);
        assert_eq!(decoder.len(), 3);
        assert_eq!(decoder.record_at(2), Some(&Record::MessageEnd));
    }

    #[test]
    fn requires_header_first() {
        let mut w = Writer::new();
        string(&mut w, 1, "x");
        w.u8(11);
        assert_eq!(
            StreamDecoder::decode(w.as_slice()).err(),
            Some(DecodeError::MissingHeader)
        );
    }

    #[test]
    fn rejects_second_header() {
        let mut w = Writer::new();
        header(&mut w, 1);
        header(&mut w, 1);
        w.u8(11);
        assert_eq!(
            StreamDecoder::decode(w.as_slice()).err(),
            Some(DecodeError::UnexpectedRecord(RecordType::SerializedStreamHeader))
        );
    }

    #[test]
    fn member_only_records_rejected_at_top_level() {
        let cases: [(&[u8], RecordType); 5] = [
            (&[10], RecordType::ObjectNull),
            (&[13, 2], RecordType::ObjectNullMultiple256),
            (&[14, 0xfb, 0xff, 0xff, 0xff], RecordType::ObjectNullMultiple),
            (&[8, 8, 1, 0, 0, 0], RecordType::MemberPrimitiveTyped),
            (&[9, 1, 0, 0, 0], RecordType::MemberReference),
        ];
        for (record, record_type) in cases {
            let mut w = Writer::new();
            header(&mut w, 1);
            w.buf(record);
            string(&mut w, 1, "x");
            w.u8(11);
            assert_eq!(
                StreamDecoder::decode(w.as_slice()).err(),
                Some(DecodeError::UnexpectedRecord(record_type)),
                "{record_type:?}"
            );
        }
    }

    #[test]
    fn rejects_other_versions() {
        let mut w = Writer::new();
        w.u8(0);
        w.i32(1);
        w.i32(-1);
        w.i32(2);
        w.i32(0);
        w.u8(11);
        assert_eq!(
            StreamDecoder::decode(w.as_slice()).err(),
            Some(DecodeError::InvalidVersion { major: 2, minor: 0 })
        );
    }

    #[test]
    fn missing_terminator_is_truncation() {
        let mut w = Writer::new();
        header(&mut w, 1);
        string(&mut w, 1, "x");
        assert!(matches!(
            StreamDecoder::decode(w.as_slice()),
            Err(DecodeError::Buffer(_))
        ));
    }

    #[test]
    fn root_id_must_resolve() {
        let mut w = Writer::new();
        header(&mut w, 2);
        string(&mut w, 1, "x");
        w.u8(11);
        assert_eq!(
            StreamDecoder::decode(w.as_slice()).err(),
            Some(DecodeError::UnresolvedReference(2))
        );
    }
}
