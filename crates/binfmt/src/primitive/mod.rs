//! Scalar primitive values and their wire codec.
//!
//! Every scalar is fixed-width little-endian except three quirks: `Char` is a
//! single UTF-8 encoded scalar (1 to 4 bytes), `Decimal` is its invariant
//! culture text behind a 7-bit length prefix, and `DateTime` packs its kind
//! into the top two bits of the tick slot.

mod decimal;
mod time;

pub use decimal::{Decimal, MAX_SCALE};
pub use time::{
    DateTime, DateTimeKind, TimeSpan, MAX_TICKS, TICKS_PER_MILLISECOND, TICKS_PER_SECOND,
};

use binfmt_buffers::{Reader, Writer};

use crate::constants::PrimitiveType;
use crate::error::{DecodeError, EncodeError};

/// One scalar value of a [`PrimitiveType`] other than `String` and `Null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Byte(u8),
    Char(char),
    Decimal(Decimal),
    Double(f64),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    SByte(i8),
    Single(f32),
    TimeSpan(TimeSpan),
    DateTime(DateTime),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
}

impl PrimitiveValue {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Boolean(_) => PrimitiveType::Boolean,
            Self::Byte(_) => PrimitiveType::Byte,
            Self::Char(_) => PrimitiveType::Char,
            Self::Decimal(_) => PrimitiveType::Decimal,
            Self::Double(_) => PrimitiveType::Double,
            Self::Int16(_) => PrimitiveType::Int16,
            Self::Int32(_) => PrimitiveType::Int32,
            Self::Int64(_) => PrimitiveType::Int64,
            Self::SByte(_) => PrimitiveType::SByte,
            Self::Single(_) => PrimitiveType::Single,
            Self::TimeSpan(_) => PrimitiveType::TimeSpan,
            Self::DateTime(_) => PrimitiveType::DateTime,
            Self::UInt16(_) => PrimitiveType::UInt16,
            Self::UInt32(_) => PrimitiveType::UInt32,
            Self::UInt64(_) => PrimitiveType::UInt64,
        }
    }

    /// Widens integral kinds to `i64`; `None` for everything else.
    pub fn as_i64(&self) -> Option<i64> {
        Some(match *self {
            Self::Byte(v) => v.into(),
            Self::SByte(v) => v.into(),
            Self::Int16(v) => v.into(),
            Self::UInt16(v) => v.into(),
            Self::Int32(v) => v.into(),
            Self::UInt32(v) => v.into(),
            Self::Int64(v) => v,
            _ => return None,
        })
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PrimitiveValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Boolean,
    u8 => Byte,
    char => Char,
    Decimal => Decimal,
    f64 => Double,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    i8 => SByte,
    f32 => Single,
    TimeSpan => TimeSpan,
    DateTime => DateTime,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
}

/// Reads one value of kind `ty`.
///
/// `String` and `Null` are carried by records of their own, so asking for
/// them here is an error.
pub fn read_primitive(
    reader: &mut Reader<'_>,
    ty: PrimitiveType,
) -> Result<PrimitiveValue, DecodeError> {
    Ok(match ty {
        PrimitiveType::Boolean => PrimitiveValue::Boolean(reader.u8()? != 0),
        PrimitiveType::Byte => PrimitiveValue::Byte(reader.u8()?),
        PrimitiveType::Char => PrimitiveValue::Char(read_char(reader)?),
        PrimitiveType::Decimal => {
            let text = read_string(reader)?;
            PrimitiveValue::Decimal(text.parse()?)
        }
        PrimitiveType::Double => PrimitiveValue::Double(reader.f64()?),
        PrimitiveType::Int16 => PrimitiveValue::Int16(reader.i16()?),
        PrimitiveType::Int32 => PrimitiveValue::Int32(reader.i32()?),
        PrimitiveType::Int64 => PrimitiveValue::Int64(reader.i64()?),
        PrimitiveType::SByte => PrimitiveValue::SByte(reader.i8()?),
        PrimitiveType::Single => PrimitiveValue::Single(reader.f32()?),
        PrimitiveType::TimeSpan => PrimitiveValue::TimeSpan(TimeSpan::from_ticks(reader.i64()?)),
        PrimitiveType::DateTime => PrimitiveValue::DateTime(DateTime::from_raw(reader.u64()?)?),
        PrimitiveType::UInt16 => PrimitiveValue::UInt16(reader.u16()?),
        PrimitiveType::UInt32 => PrimitiveValue::UInt32(reader.u32()?),
        PrimitiveType::UInt64 => PrimitiveValue::UInt64(reader.u64()?),
        PrimitiveType::Null | PrimitiveType::String => {
            return Err(DecodeError::NonScalarPrimitive(ty))
        }
    })
}

/// Writes the wire form of `value`; the kind is implied by the variant.
///
/// A `Char` must fit one UTF-16 code unit, which is all a legacy reader
/// accepts for a char.
pub fn write_primitive(writer: &mut Writer, value: &PrimitiveValue) -> Result<(), EncodeError> {
    match *value {
        PrimitiveValue::Boolean(v) => writer.u8(u8::from(v)),
        PrimitiveValue::Byte(v) => writer.u8(v),
        PrimitiveValue::Char(v) => {
            if v.len_utf16() != 1 {
                return Err(EncodeError::CharOutOfRange(v));
            }
            let mut buf = [0u8; 4];
            writer.utf8(v.encode_utf8(&mut buf));
        }
        PrimitiveValue::Decimal(v) => write_string(writer, &v.to_string()),
        PrimitiveValue::Double(v) => writer.f64(v),
        PrimitiveValue::Int16(v) => writer.i16(v),
        PrimitiveValue::Int32(v) => writer.i32(v),
        PrimitiveValue::Int64(v) => writer.i64(v),
        PrimitiveValue::SByte(v) => writer.i8(v),
        PrimitiveValue::Single(v) => writer.f32(v),
        PrimitiveValue::TimeSpan(v) => writer.i64(v.ticks),
        PrimitiveValue::DateTime(v) => writer.u64(v.to_raw()),
        PrimitiveValue::UInt16(v) => writer.u16(v),
        PrimitiveValue::UInt32(v) => writer.u32(v),
        PrimitiveValue::UInt64(v) => writer.u64(v),
    }
    Ok(())
}

/// Reads a length-prefixed UTF-8 string (7-bit encoded byte length).
pub fn read_string(reader: &mut Reader<'_>) -> Result<String, DecodeError> {
    let start = reader.x;
    let len = reader.var_u32()?;
    let len = i32::try_from(len).map_err(|_| {
        reader.x = start;
        DecodeError::InvalidLength(len as i32)
    })?;
    Ok(reader.utf8(len as usize)?.to_owned())
}

/// Writes a length-prefixed UTF-8 string.
pub fn write_string(writer: &mut Writer, s: &str) {
    writer.var_u32(s.len() as u32);
    writer.utf8(s);
}

fn read_char(reader: &mut Reader<'_>) -> Result<char, DecodeError> {
    let first = reader.peek()?;
    let width = match first {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => return Err(DecodeError::InvalidChar),
    };
    let bytes = reader.buf(width)?;
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.chars().next())
        .ok_or(DecodeError::InvalidChar)
}
