//! Text and JSON renderings of records and recognized values.

use binfmt::{PrimitiveValue, Record, Value};
use serde_json::{json, Value as Json};

/// One-line summary of a record: its kind, id and size.
pub fn describe(record: &Record) -> String {
    let mut line = format!("{:?}", record.record_type());
    if let Some(id) = record.id() {
        line.push_str(&format!(" id={id}"));
    }
    match record {
        Record::String(s) => line.push_str(&format!(" {:?}", s.value)),
        Record::ArraySinglePrimitive(array) => line.push_str(&format!(
            " {:?}[{}]",
            array.element_type,
            array.values.len()
        )),
        Record::ArraySingleObject(array) | Record::ArraySingleString(array) => {
            line.push_str(&format!(" [{}]", array.elements.len()))
        }
        Record::BinaryLibrary(library) => line.push_str(&format!(" {:?}", library.name)),
        Record::MemberPrimitiveTyped(value) => line.push_str(&format!(" {value:?}")),
        Record::MemberReference(id) => line.push_str(&format!(" -> {id}")),
        _ => {
            if let Some(class) = record.as_class() {
                line.push_str(&format!(" {} ({} members)", class.name(), class.members.len()));
            } else if let Some(count) = record.null_count() {
                line.push_str(&format!(" x{count}"));
            }
        }
    }
    line
}

pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::String(s) => json!(s),
        Value::Primitive(p) => primitive_json(p),
        Value::NativeInt(v) => json!(v),
        Value::NativeUInt(v) => json!(v),
        Value::PrimitiveList(_, values) | Value::PrimitiveArray(_, values) => {
            values.iter().map(primitive_json).collect()
        }
        Value::StringList(values) | Value::StringArray(values) => json!(values),
        Value::ObjectList(items) => items.iter().map(to_json).collect(),
        // Keys are not always strings, so entries stay pairs.
        Value::Map(entries) => entries
            .iter()
            .map(|(k, v)| json!([to_json(k), to_json(v)]))
            .collect(),
    }
}

fn primitive_json(value: &PrimitiveValue) -> Json {
    match *value {
        PrimitiveValue::Boolean(v) => json!(v),
        PrimitiveValue::Byte(v) => json!(v),
        PrimitiveValue::SByte(v) => json!(v),
        PrimitiveValue::Char(v) => json!(v.to_string()),
        PrimitiveValue::Int16(v) => json!(v),
        PrimitiveValue::UInt16(v) => json!(v),
        PrimitiveValue::Int32(v) => json!(v),
        PrimitiveValue::UInt32(v) => json!(v),
        PrimitiveValue::Int64(v) => json!(v),
        PrimitiveValue::UInt64(v) => json!(v),
        PrimitiveValue::Single(v) => float_json(f64::from(v)),
        PrimitiveValue::Double(v) => float_json(v),
        // Decimal text keeps scale and precision.
        PrimitiveValue::Decimal(v) => json!(v.to_string()),
        PrimitiveValue::DateTime(v) => json!({
            "ticks": v.ticks(),
            "kind": format!("{:?}", v.kind()),
        }),
        PrimitiveValue::TimeSpan(v) => json!(v.to_string()),
    }
}

fn float_json(v: f64) -> Json {
    serde_json::Number::from_f64(v)
        .map(Json::Number)
        .unwrap_or_else(|| json!(v.to_string()))
}
