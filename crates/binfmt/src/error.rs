//! Decode and encode error types.

use binfmt_buffers::BufferError;
use thiserror::Error;

use crate::constants::{PrimitiveType, RecordType};
use crate::record::Id;

/// The payload is not a valid instance of the format.
///
/// Every failure while decoding surfaces as this one type; the variant names
/// the reason and, for lower-level faults, keeps the original error as its
/// source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated or malformed stream data: {0}")]
    Buffer(#[from] BufferError),
    #[error("corrupted stream: unknown record tag 0x{tag:02x} at offset {offset}")]
    UnknownRecordType { tag: u8, offset: usize },
    #[error("record type {0:?} is not supported")]
    Unsupported(RecordType),
    #[error("record type {0:?} is not implemented")]
    NotImplemented(RecordType),
    #[error("record type {0:?} is not allowed here")]
    UnexpectedRecord(RecordType),
    #[error("stream does not start with a serialization header")]
    MissingHeader,
    #[error("unsupported format version {major}.{minor}")]
    InvalidVersion { major: i32, minor: i32 },
    #[error("unresolved reference to id {0}")]
    UnresolvedReference(Id),
    #[error("id {0} is defined more than once")]
    DuplicateId(Id),
    #[error("id 0 is not a valid record id")]
    ZeroId,
    #[error("invalid primitive type code {0}")]
    InvalidPrimitiveType(u8),
    #[error("primitive type {0:?} has no scalar wire form")]
    NonScalarPrimitive(PrimitiveType),
    #[error("invalid member type code {0}")]
    InvalidBinaryType(u8),
    #[error("invalid length or count {0}")]
    InvalidLength(i32),
    #[error("member type metadata does not match the {0} declared members")]
    MemberCountMismatch(usize),
    #[error("invalid null run count {0}")]
    InvalidNullCount(i32),
    #[error("null run of {count} at index {index} overruns sequence of length {length}")]
    NullRunOverflow {
        index: usize,
        count: usize,
        length: usize,
    },
    #[error("invalid decimal text {0:?}")]
    InvalidDecimal(String),
    #[error("invalid decimal bits (flags 0x{0:08x})")]
    InvalidDecimalBits(u32),
    #[error("date-time ticks out of range (raw 0x{0:016x})")]
    InvalidDateTime(u64),
    #[error("invalid UTF-8 encoded char")]
    InvalidChar,
    #[error("record nesting exceeds depth limit {0}")]
    DepthLimitExceeded(usize),
    #[error("null runs expand past the limit of {0} slots")]
    NullLimitExceeded(usize),
}

/// A value could not be written in one of the supported shapes.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("unsupported value for this shape: {0}")]
    UnsupportedValue(&'static str),
    #[error("element of type {found:?} in a {expected:?} sequence")]
    MixedElementTypes {
        expected: PrimitiveType,
        found: PrimitiveType,
    },
    #[error("sequence of {0} elements exceeds the wire length limit")]
    TooLong(usize),
    #[error("char {0:?} does not fit one UTF-16 code unit")]
    CharOutOfRange(char),
    #[error("record index {0} does not belong to this session")]
    UnknownRecord(usize),
    #[error("invalid record sequence: {0}")]
    Record(#[from] DecodeError),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}
