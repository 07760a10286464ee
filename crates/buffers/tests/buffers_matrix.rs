//! Reader/Writer behaviour matrix for the little-endian buffers crate.

use binfmt_buffers::{print_octets, BufferError, Reader, Writer};

// ---------------------------------------------------------------------------
// Fixed-width layout
// ---------------------------------------------------------------------------

#[test]
fn fixed_width_values_are_little_endian() {
    let mut w = Writer::new();
    w.i32(-1);
    w.u16(0x0102);
    w.i64(i64::MIN);
    w.f64(1.0);
    assert_eq!(
        print_octets(w.as_slice(), 64),
        "ff ff ff ff 02 01 00 00 00 00 00 00 00 80 00 00 00 00 00 00 f0 3f"
    );

    let data = w.flush();
    let mut r = Reader::new(&data);
    assert_eq!(r.i32(), Ok(-1));
    assert_eq!(r.u16(), Ok(0x0102));
    assert_eq!(r.i64(), Ok(i64::MIN));
    assert_eq!(r.f64(), Ok(1.0));
    assert!(r.is_empty());
}

#[test]
fn float_specials_survive() {
    let mut w = Writer::new();
    w.f32(f32::NEG_INFINITY);
    w.f64(f64::NAN);
    let data = w.flush();
    let mut r = Reader::new(&data);
    assert_eq!(r.f32(), Ok(f32::NEG_INFINITY));
    assert!(r.f64().unwrap().is_nan());
}

// ---------------------------------------------------------------------------
// 7-bit encoded integers
// ---------------------------------------------------------------------------

#[test]
fn var_u32_width_boundaries() {
    let cases: [(u32, usize); 6] = [
        (0, 1),
        (0x7f, 1),
        (0x80, 2),
        (0x3fff, 2),
        (0x4000, 3),
        (u32::MAX, 5),
    ];
    for (value, width) in cases {
        let mut w = Writer::new();
        w.var_u32(value);
        let data = w.flush();
        assert_eq!(data.len(), width, "width of {value:#x}");
        let mut r = Reader::new(&data);
        assert_eq!(r.var_u32(), Ok(value));
    }
}

#[test]
fn var_u32_truncated_restores_cursor() {
    let mut r = Reader::new(&[0x80, 0x80]);
    assert_eq!(r.var_u32(), Err(BufferError::EndOfBuffer));
    assert_eq!(r.x, 0);
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

#[test]
fn oversized_buf_request_fails_without_advancing() {
    let data = [1u8, 2, 3];
    let mut r = Reader::new(&data);
    assert_eq!(r.buf(usize::MAX), Err(BufferError::EndOfBuffer));
    assert_eq!(r.buf(4), Err(BufferError::EndOfBuffer));
    assert_eq!(r.buf(3), Ok(&data[..]));
    assert_eq!(r.peek(), Err(BufferError::EndOfBuffer));
}

#[test]
fn reset_rewinds_to_new_input() {
    let first = [1u8];
    let second = [2u8, 3];
    let mut r = Reader::new(&first);
    assert_eq!(r.u8(), Ok(1));
    r.reset(&second);
    assert_eq!(r.size(), 2);
    assert_eq!(r.u8(), Ok(2));
}
