//! Null-run expansion (decode) and coalescing (encode).
//!
//! A run of consecutive nulls inside a member or element sequence is carried
//! by one of three records: `ObjectNull` for a single null,
//! `ObjectNullMultiple256` for up to 255, and `ObjectNullMultiple` above that.

use binfmt_buffers::Writer;

use crate::constants::RecordType;
use crate::error::DecodeError;

/// Checks a run of `count` nulls starting at `index` in a sequence of
/// `length` slots and returns the number of slots it fills.
pub fn expand_run(index: usize, count: i64, length: usize) -> Result<usize, DecodeError> {
    if count < 0 {
        return Err(DecodeError::InvalidNullCount(count as i32));
    }
    let count = count as usize;
    if index.checked_add(count).map_or(true, |end| end > length) {
        log::debug!("[binfmt] null run of {count} at {index} overruns length {length}");
        return Err(DecodeError::NullRunOverflow {
            index,
            count,
            length,
        });
    }
    Ok(count)
}

/// Writes the smallest record that stands for `count` nulls. Writes nothing
/// for `0`.
pub fn write_null_run(writer: &mut Writer, count: usize) {
    match count {
        0 => {}
        1 => writer.u8(RecordType::ObjectNull as u8),
        2..=255 => {
            writer.u8(RecordType::ObjectNullMultiple256 as u8);
            writer.u8(count as u8);
        }
        _ => {
            writer.u8(RecordType::ObjectNullMultiple as u8);
            writer.i32(count.min(i32::MAX as usize) as i32);
        }
    }
}

/// Accumulates consecutive nulls until the next non-null slot or the end of
/// the sequence.
#[derive(Debug, Default)]
pub struct NullCoalescer {
    pending: usize,
}

impl NullCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_null(&mut self) {
        self.pending += 1;
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Writes any pending run. Call before each non-null slot and once at the
    /// end of the sequence.
    pub fn flush(&mut self, writer: &mut Writer) {
        write_null_run(writer, std::mem::take(&mut self.pending));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binfmt_buffers::Reader;
    use proptest::prelude::*;

    /// Writes `slots` as `0x08 <byte>` for values and null runs for gaps.
    fn coalesce(slots: &[Option<u8>]) -> Vec<u8> {
        let mut writer = Writer::new();
        let mut nulls = NullCoalescer::new();
        for slot in slots {
            match slot {
                None => nulls.push_null(),
                Some(v) => {
                    nulls.flush(&mut writer);
                    writer.u8(RecordType::MemberPrimitiveTyped as u8);
                    writer.u8(*v);
                }
            }
        }
        nulls.flush(&mut writer);
        writer.flush()
    }

    fn expand(bytes: &[u8], length: usize) -> Result<Vec<Option<u8>>, DecodeError> {
        let mut reader = Reader::new(bytes);
        let mut out = Vec::new();
        while out.len() < length {
            let count = match reader.u8()? {
                8 => {
                    out.push(Some(reader.u8()?));
                    continue;
                }
                10 => 1,
                13 => i64::from(reader.u8()?),
                14 => i64::from(reader.i32()?),
                tag => panic!("unexpected tag {tag}"),
            };
            let count = expand_run(out.len(), count, length)?;
            out.resize(out.len() + count, None);
        }
        Ok(out)
    }

    #[test]
    fn smallest_shape_per_run_length() {
        let cases: [(usize, &[u8]); 6] = [
            (1, &[0x0a]),
            (10, &[0x0d, 10]),
            (11, &[0x0d, 11]),
            (255, &[0x0d, 0xff]),
            (256, &[0x0e, 0x00, 0x01, 0x00, 0x00]),
            (257, &[0x0e, 0x01, 0x01, 0x00, 0x00]),
        ];
        for (k, expected) in cases {
            let bytes = coalesce(&vec![None; k]);
            assert_eq!(bytes, expected, "run of {k}");
            assert_eq!(expand(&bytes, k), Ok(vec![None; k]));
        }
    }

    #[test]
    fn run_flushed_before_value() {
        let bytes = coalesce(&[None, None, Some(7), None]);
        assert_eq!(bytes, vec![0x0d, 2, 0x08, 7, 0x0a]);
    }

    #[test]
    fn overrun_and_negative_counts_rejected() {
        assert_eq!(
            expand_run(0, 11, 10),
            Err(DecodeError::NullRunOverflow {
                index: 0,
                count: 11,
                length: 10
            })
        );
        assert_eq!(expand_run(9, 1, 10), Ok(1));
        assert_eq!(expand_run(0, -1, 10), Err(DecodeError::InvalidNullCount(-1)));
        assert!(expand_run(usize::MAX, 1, usize::MAX).is_err());
    }

    proptest! {
        #[test]
        fn coalesce_then_expand_is_identity(slots in prop::collection::vec(prop::option::weighted(0.3, any::<u8>()), 0..600)) {
            let bytes = coalesce(&slots);
            prop_assert_eq!(expand(&bytes, slots.len()), Ok(slots));
        }
    }
}
