//! Little-endian binary writer backed by a growable buffer.

/// An auto-growing little-endian byte sink.
///
/// # Example
///
/// ```
/// use binfmt_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x0b);
/// writer.i32(1);
/// assert_eq!(writer.flush(), vec![0x0b, 0x01, 0x00, 0x00, 0x00]);
/// assert!(writer.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Writer {
    /// Bytes written so far.
    pub uint8: Vec<u8>,
}

macro_rules! write_le {
    ($(#[$doc:meta] $name:ident($ty:ty)),* $(,)?) => {
        $(
            #[$doc]
            #[inline]
            pub fn $name(&mut self, val: $ty) {
                self.uint8.extend_from_slice(&val.to_le_bytes());
            }
        )*
    };
}

impl Writer {
    pub fn new() -> Self {
        Self { uint8: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Discards everything written so far.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Takes the written bytes, leaving the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.uint8
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.uint8.push(val as u8);
    }

    write_le! {
        /// Writes an unsigned 16-bit integer (little-endian).
        u16(u16),
        /// Writes a signed 16-bit integer (little-endian).
        i16(i16),
        /// Writes an unsigned 32-bit integer (little-endian).
        u32(u32),
        /// Writes a signed 32-bit integer (little-endian).
        i32(i32),
        /// Writes an unsigned 64-bit integer (little-endian).
        u64(u64),
        /// Writes a signed 64-bit integer (little-endian).
        i64(i64),
        /// Writes a 32-bit float (little-endian).
        f32(f32),
        /// Writes a 64-bit float (little-endian).
        f64(f64),
    }

    /// Writes raw bytes.
    pub fn buf(&mut self, data: &[u8]) {
        self.uint8.extend_from_slice(data);
    }

    /// Writes the UTF-8 bytes of `s` with no length prefix.
    pub fn utf8(&mut self, s: &str) {
        self.uint8.extend_from_slice(s.as_bytes());
    }

    /// Writes a 7-bit variable-length unsigned integer.
    pub fn var_u32(&mut self, mut val: u32) {
        while val >= 0x80 {
            self.uint8.push((val as u8) | 0x80);
            val >>= 7;
        }
        self.uint8.push(val as u8);
    }
}
