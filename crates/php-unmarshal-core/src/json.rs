//! JSON conversion for decoded values and dynamic records.
//!
//! This module provides conversion to JSON using serde_json.
//! Enable the `serde` feature to use this module.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Map, Value as JsonValue};

use crate::dynamic::{DynamicField, DynamicRecord};
use crate::types::Value;

/// Convert a decoded value to a JSON value.
///
/// # Mapping Rules
///
/// | PHP Type | JSON Type |
/// |----------|-----------|
/// | `null` | `null` |
/// | `bool` | `boolean` |
/// | `int` | `number` |
/// | `float` | `number` (`null` for NaN, `"Infinity"`/`"-Infinity"`) |
/// | `string` | `string` |
///
/// # Example
///
/// ```rust
/// use php_unmarshal_core::{unmarshal_value, to_json};
///
/// let value = unmarshal_value(b"s:5:\"Alice\";").unwrap();
/// assert_eq!(to_json(&value), serde_json::json!("Alice"));
/// ```
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => json!(*i),
        Value::Float(f) => float_to_json(*f),
        Value::Text(s) => JsonValue::String(s.to_string()),
    }
}

fn float_to_json(f: f64) -> JsonValue {
    if f.is_nan() {
        JsonValue::Null
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            json!("Infinity")
        } else {
            json!("-Infinity")
        }
    } else {
        json!(f)
    }
}

/// Convert a dynamic record to a JSON object, nesting sub-records.
///
/// # Example
///
/// ```rust
/// use php_unmarshal_core::{record_to_json, unmarshal, FieldKind, Schema};
///
/// let schema = Schema::new()
///     .field("Name", FieldKind::Text)
///     .field("Age", FieldKind::Int);
/// let mut record = schema.instantiate();
/// unmarshal(br#"O:6:"Person":2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#, &mut record).unwrap();
/// assert_eq!(
///     record_to_json(&record),
///     serde_json::json!({"Name": "Alice", "Age": 30})
/// );
/// ```
pub fn record_to_json(record: &DynamicRecord) -> JsonValue {
    let mut map = Map::new();
    for (name, field) in record.iter() {
        map.insert(name.to_string(), field_to_json(field));
    }
    JsonValue::Object(map)
}

fn field_to_json(field: &DynamicField) -> JsonValue {
    match field {
        DynamicField::Int(i) => json!(*i),
        DynamicField::Uint(u) => json!(*u),
        DynamicField::Float(f) => float_to_json(*f),
        DynamicField::Bool(b) => JsonValue::Bool(*b),
        DynamicField::Text(s) => JsonValue::String(s.clone()),
        DynamicField::Any(v) => to_json(v),
        DynamicField::Record(r) => record_to_json(r),
    }
}

/// Convert a decoded value to a JSON string.
pub fn to_json_string(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string(&to_json(value))
}

/// Convert a dynamic record to a JSON string.
pub fn record_to_json_string(record: &DynamicRecord) -> serde_json::Result<String> {
    serde_json::to_string(record)
}

impl Serialize for Value<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => float_to_json(*f).serialize(serializer),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for DynamicField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DynamicField::Int(i) => serializer.serialize_i64(*i),
            DynamicField::Uint(u) => serializer.serialize_u64(*u),
            DynamicField::Float(f) => float_to_json(*f).serialize(serializer),
            DynamicField::Bool(b) => serializer.serialize_bool(*b),
            DynamicField::Text(s) => serializer.serialize_str(s),
            DynamicField::Any(v) => v.serialize(serializer),
            DynamicField::Record(r) => r.serialize(serializer),
        }
    }
}

impl Serialize for DynamicRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, field) in self.iter() {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}
