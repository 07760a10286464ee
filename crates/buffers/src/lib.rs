//! Little-endian binary buffer utilities for binfmt.
//!
//! # Overview
//!
//! - [`Reader`] - fallible little-endian reads over a byte slice with cursor tracking
//! - [`Writer`] - little-endian writes into an auto-growing buffer
//! - [`print_octets`] / [`print_window`] - hex dumps for diagnostics
//!
//! # Example
//!
//! ```
//! use binfmt_buffers::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.u8(0x06);
//! writer.i32(1);
//! writer.var_u32(5);
//! writer.utf8("hello");
//! let data = writer.flush();
//!
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8().unwrap(), 0x06);
//! assert_eq!(reader.i32().unwrap(), 1);
//! let len = reader.var_u32().unwrap() as usize;
//! assert_eq!(reader.utf8(len).unwrap(), "hello");
//! ```

mod print_octets;
mod reader;
mod writer;

pub use print_octets::{print_octets, print_window};
pub use reader::Reader;
pub use writer::Writer;

/// Error type for buffer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer,
    /// Invalid UTF-8 sequence.
    InvalidUtf8,
    /// A 7-bit variable-length integer was longer than five bytes or overflowed 32 bits.
    InvalidVarint,
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::EndOfBuffer => write!(f, "end of buffer"),
            BufferError::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
            BufferError::InvalidVarint => write!(f, "malformed 7-bit encoded integer"),
        }
    }
}

impl std::error::Error for BufferError {}
