//! Little-endian binary reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A binary reader over a borrowed byte slice.
///
/// Every read is bounds-checked and advances the cursor only on success, so a
/// failed read leaves `x` pointing at the offending byte.
///
/// # Example
///
/// ```
/// use binfmt_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.u32().unwrap(), 0x0504_0302);
/// assert!(reader.u8().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

macro_rules! read_le {
    ($(#[$doc:meta] $name:ident -> $ty:ty),* $(,)?) => {
        $(
            #[$doc]
            #[inline]
            pub fn $name(&mut self) -> Result<$ty, BufferError> {
                const N: usize = std::mem::size_of::<$ty>();
                let bytes = self.buf(N)?;
                let mut raw = [0u8; N];
                raw.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

impl<'a> Reader<'a> {
    /// Creates a new reader positioned at the start of `uint8`.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Resets the reader with a new byte slice.
    pub fn reset(&mut self, uint8: &'a [u8]) {
        self.uint8 = uint8;
        self.x = 0;
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.uint8.len().saturating_sub(self.x)
    }

    /// Returns `true` when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        self.uint8.get(self.x).copied().ok_or(BufferError::EndOfBuffer)
    }

    /// Returns a subslice of `size` bytes and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        if size > self.size() {
            return Err(BufferError::EndOfBuffer);
        }
        let bin = &self.uint8[self.x..self.x + size];
        self.x += size;
        Ok(bin)
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        let val = self.peek()?;
        self.x += 1;
        Ok(val)
    }

    /// Reads a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self) -> Result<i8, BufferError> {
        Ok(self.u8()? as i8)
    }

    read_le! {
        /// Reads an unsigned 16-bit integer (little-endian).
        u16 -> u16,
        /// Reads a signed 16-bit integer (little-endian).
        i16 -> i16,
        /// Reads an unsigned 32-bit integer (little-endian).
        u32 -> u32,
        /// Reads a signed 32-bit integer (little-endian).
        i32 -> i32,
        /// Reads an unsigned 64-bit integer (little-endian).
        u64 -> u64,
        /// Reads a signed 64-bit integer (little-endian).
        i64 -> i64,
        /// Reads a 32-bit floating point number (little-endian).
        f32 -> f32,
        /// Reads a 64-bit floating point number (little-endian).
        f64 -> f64,
    }

    /// Reads a 7-bit variable-length unsigned integer.
    ///
    /// Each byte contributes its low seven bits, least significant group
    /// first; the high bit marks continuation. At most five bytes are read and
    /// the fifth may only carry the top four bits of a `u32`.
    pub fn var_u32(&mut self) -> Result<u32, BufferError> {
        let start = self.x;
        let mut result: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = match self.u8() {
                Ok(b) => b,
                Err(err) => {
                    self.x = start;
                    return Err(err);
                }
            };
            if shift == 28 && byte > 0x0f {
                self.x = start;
                return Err(BufferError::InvalidVarint);
            }
            result |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        self.x = start;
        Err(BufferError::InvalidVarint)
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let start = self.x;
        let bytes = self.buf(size)?;
        str::from_utf8(bytes).map_err(|_| {
            self.x = start;
            BufferError::InvalidUtf8
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.u8(), Ok(0x01));
        assert_eq!(reader.u8(), Ok(0x02));
        assert_eq!(reader.u8(), Ok(0x03));
        assert_eq!(reader.u8(), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn test_u16() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.u16(), Ok(0x0201));
        assert_eq!(reader.u16(), Ok(0x0403));
    }

    #[test]
    fn test_i32_short_read_does_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.i32(), Err(BufferError::EndOfBuffer));
        assert_eq!(reader.x, 0);
    }

    #[test]
    fn test_var_u32() {
        let mut reader = Reader::new(&[0x05, 0x80, 0x01, 0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(reader.var_u32(), Ok(5));
        assert_eq!(reader.var_u32(), Ok(128));
        assert_eq!(reader.var_u32(), Ok(u32::MAX));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_var_u32_rejects_sixth_byte() {
        let mut reader = Reader::new(&[0xff, 0xff, 0xff, 0xff, 0x1f]);
        assert_eq!(reader.var_u32(), Err(BufferError::InvalidVarint));
        assert_eq!(reader.x, 0);
    }

    #[test]
    fn test_utf8() {
        let data = b"hello world";
        let mut reader = Reader::new(data);
        assert_eq!(reader.utf8(5), Ok("hello"));
        assert_eq!(reader.utf8(6), Ok(" world"));
    }

    #[test]
    fn test_utf8_invalid() {
        let mut reader = Reader::new(&[0xc3, 0x28]);
        assert_eq!(reader.utf8(2), Err(BufferError::InvalidUtf8));
    }
}
