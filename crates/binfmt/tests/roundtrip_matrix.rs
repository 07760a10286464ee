//! Encode/decode behaviour matrix for every supported root shape.

use binfmt::{
    decode, encode, hashtable_layout, DateTime, DateTimeKind, Decimal, EncodeError, MemberValue,
    PrimitiveType, PrimitiveValue, Record, StreamDecoder, TimeSpan, Value, MAX_TICKS,
};
use binfmt_buffers::Writer;

fn roundtrip(value: &Value) -> Vec<u8> {
    let bytes = encode(value).unwrap_or_else(|e| panic!("encode {value:?}: {e}"));
    assert_eq!(decode(&bytes).as_ref(), Ok(&Some(value.clone())), "{value:?}");
    bytes
}

/// Re-emitting every decoded top-level record reproduces the payload.
fn assert_rewrites(bytes: &[u8]) {
    let decoder = StreamDecoder::decode(bytes).unwrap();
    let mut writer = Writer::new();
    for record in decoder.records() {
        record.write(&mut writer, decoder.map()).unwrap();
    }
    assert_eq!(writer.flush(), bytes);
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

#[test]
fn strings() {
    for s in ["", "hello", "naïve ☃", "😀 emoji", &"x".repeat(300)] {
        let bytes = roundtrip(&Value::from(s));
        assert_rewrites(&bytes);
    }
}

#[test]
fn every_scalar_kind() {
    let values = [
        PrimitiveValue::Boolean(true),
        PrimitiveValue::Boolean(false),
        PrimitiveValue::Byte(0xfe),
        PrimitiveValue::SByte(-128),
        PrimitiveValue::Char('a'),
        PrimitiveValue::Char('€'),
        PrimitiveValue::Char('\u{FFFF}'),
        PrimitiveValue::Int16(i16::MIN),
        PrimitiveValue::UInt16(u16::MAX),
        PrimitiveValue::Int32(-42),
        PrimitiveValue::UInt32(u32::MAX),
        PrimitiveValue::Int64(i64::MIN),
        PrimitiveValue::UInt64(u64::MAX),
        PrimitiveValue::Single(1.5),
        PrimitiveValue::Double(-0.25),
        PrimitiveValue::Double(f64::INFINITY),
    ];
    for value in values {
        let bytes = roundtrip(&Value::Primitive(value));
        assert_rewrites(&bytes);
    }
}

#[test]
fn char_outside_bmp_is_not_encoded() {
    for value in [
        Value::Primitive(PrimitiveValue::Char('😀')),
        Value::PrimitiveList(PrimitiveType::Char, vec![PrimitiveValue::Char('😀')]),
        Value::ObjectList(vec![Value::Primitive(PrimitiveValue::Char('😀'))]),
    ] {
        assert!(
            matches!(encode(&value), Err(EncodeError::CharOutOfRange('😀'))),
            "{value:?}"
        );
    }
}

#[test]
fn decimal_boundaries() {
    let values = [
        Decimal::ZERO,
        Decimal::MAX,
        Decimal::MIN,
        Decimal::new(1, 28).unwrap(),
        Decimal::new(-12_345, 2).unwrap(),
        "0.00".parse().unwrap(),
    ];
    for value in values {
        roundtrip(&Value::Primitive(PrimitiveValue::Decimal(value)));
    }
}

#[test]
fn date_time_kinds() {
    for kind in [
        DateTimeKind::Unspecified,
        DateTimeKind::Utc,
        DateTimeKind::Local,
        DateTimeKind::LocalAmbiguousDst,
    ] {
        for ticks in [0, 638_000_000_000_000_000, MAX_TICKS] {
            let value = DateTime::new(ticks, kind).unwrap();
            roundtrip(&Value::Primitive(PrimitiveValue::DateTime(value)));
        }
    }
}

#[test]
fn time_spans_and_native_ints() {
    for ticks in [i64::MIN, -1, 0, 36_000_000_000, i64::MAX] {
        roundtrip(&Value::Primitive(PrimitiveValue::TimeSpan(
            TimeSpan::from_ticks(ticks),
        )));
    }
    roundtrip(&Value::NativeInt(-7));
    roundtrip(&Value::NativeUInt(u64::MAX));
}

// ---------------------------------------------------------------------------
// Lists and arrays
// ---------------------------------------------------------------------------

#[test]
fn primitive_lists_of_length_0_1_n() {
    let lists = [
        Value::PrimitiveList(PrimitiveType::Int32, vec![]),
        Value::PrimitiveList(PrimitiveType::Double, vec![PrimitiveValue::Double(1.5)]),
        Value::PrimitiveList(
            PrimitiveType::Int64,
            (0..100).map(PrimitiveValue::Int64).collect(),
        ),
        Value::PrimitiveList(
            PrimitiveType::Char,
            "héllo".chars().map(PrimitiveValue::Char).collect(),
        ),
        Value::PrimitiveList(
            PrimitiveType::Decimal,
            vec![
                PrimitiveValue::Decimal(Decimal::MAX),
                PrimitiveValue::Decimal("1.50".parse().unwrap()),
            ],
        ),
        Value::PrimitiveList(
            PrimitiveType::Boolean,
            vec![PrimitiveValue::Boolean(true), PrimitiveValue::Boolean(false)],
        ),
    ];
    for list in &lists {
        let bytes = roundtrip(list);
        assert_rewrites(&bytes);
    }
}

#[test]
fn string_list_deduplicates_repeats() {
    let list = Value::StringList(vec![
        Some("a".to_owned()),
        None,
        Some("b".to_owned()),
        Some("a".to_owned()),
    ]);
    let bytes = roundtrip(&list);
    assert_rewrites(&bytes);

    let decoder = StreamDecoder::decode(&bytes).unwrap();
    let Ok(Record::ArraySingleString(array)) = decoder.record_by_id(2) else {
        panic!("expected string array with id 2");
    };
    assert_eq!(array.elements[1], MemberValue::Null);
    assert_eq!(array.elements[3], MemberValue::Reference(3));
}

#[test]
fn arrays_as_root() {
    roundtrip(&Value::PrimitiveArray(
        PrimitiveType::UInt16,
        vec![PrimitiveValue::UInt16(1), PrimitiveValue::UInt16(2)],
    ));
    roundtrip(&Value::PrimitiveArray(PrimitiveType::Byte, vec![]));
    let bytes = roundtrip(&Value::StringArray(vec![
        Some("x".to_owned()),
        None,
        None,
        Some("x".to_owned()),
    ]));
    assert_rewrites(&bytes);
}

#[test]
fn object_list_of_leaves() {
    let list = Value::ObjectList(vec![
        Value::from("a"),
        Value::Null,
        Value::Primitive(PrimitiveValue::Int32(3)),
        Value::from("a"),
        Value::Primitive(PrimitiveValue::Boolean(true)),
    ]);
    let bytes = roundtrip(&list);
    assert_rewrites(&bytes);
}

// ---------------------------------------------------------------------------
// Hashtables
// ---------------------------------------------------------------------------

#[test]
fn string_keyed_map_of_mixed_values() {
    let map = Value::Map(vec![
        (Value::from("name"), Value::from("shared")),
        (Value::from("count"), Value::Primitive(PrimitiveValue::Int32(3))),
        (Value::from("missing"), Value::Null),
        (Value::from("alias"), Value::from("shared")),
        (
            Value::Primitive(PrimitiveValue::Int64(9)),
            Value::Primitive(PrimitiveValue::Double(0.5)),
        ),
    ]);
    let bytes = roundtrip(&map);
    assert_rewrites(&bytes);

    let decoder = StreamDecoder::decode(&bytes).unwrap();
    let class = decoder.root_record().unwrap().as_class().unwrap();
    let (version, hash_size) = hashtable_layout(5);
    assert_eq!(
        class.member("Version"),
        Some(&MemberValue::Primitive(PrimitiveValue::Int32(version)))
    );
    assert_eq!(
        class.member("HashSize"),
        Some(&MemberValue::Primitive(PrimitiveValue::Int32(hash_size)))
    );
    assert_eq!(
        class.member("LoadFactor"),
        Some(&MemberValue::Primitive(PrimitiveValue::Single(0.72)))
    );
    // "shared" is inlined once among the values and referenced afterwards.
    let Ok(Record::ArraySingleObject(values)) = decoder.record_by_id(3) else {
        panic!("expected values array with id 3");
    };
    assert!(matches!(values.elements[0], MemberValue::Record(_)));
    assert!(matches!(values.elements[3], MemberValue::Reference(_)));
}

#[test]
fn empty_map() {
    let bytes = roundtrip(&Value::Map(vec![]));
    assert_rewrites(&bytes);
}
