//! A record whose fields are declared at runtime.
//!
//! [`DynamicRecord`] is the destination used when the field layout is only known
//! at runtime, e.g. from the Python bindings. Fields start at their zero value and
//! keep declaration order.

use crate::record::{IntoSlot, Record, Slot};
use crate::types::Value;

/// The kind of a runtime-declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    Uint,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// Text.
    Text,
    /// Any scalar, stored as decoded.
    Any,
    /// Nested object with its own schema.
    Record(Schema),
}

impl FieldKind {
    /// Parse a kind name (`int`, `uint`, `float`, `bool`, `str`, `any`).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => FieldKind::Int,
            "uint" => FieldKind::Uint,
            "float" => FieldKind::Float,
            "bool" => FieldKind::Bool,
            "str" | "string" => FieldKind::Text,
            "any" => FieldKind::Any,
            _ => return None,
        })
    }
}

/// An ordered list of field declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, FieldKind)>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Names are matched against normalized keys, so they
    /// should start with an uppercase letter.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((name.into(), kind));
        self
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record with every field at its zero value.
    pub fn instantiate(&self) -> DynamicRecord {
        DynamicRecord {
            fields: self
                .fields
                .iter()
                .map(|(name, kind)| (name.clone(), DynamicField::zero(kind)))
                .collect(),
        }
    }
}

/// The current value of a runtime-declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicField {
    /// Signed integer field.
    Int(i64),
    /// Unsigned integer field.
    Uint(u64),
    /// Float field.
    Float(f64),
    /// Boolean field.
    Bool(bool),
    /// Text field.
    Text(String),
    /// Untyped field.
    Any(Value<'static>),
    /// Nested record field.
    Record(DynamicRecord),
}

impl DynamicField {
    fn zero(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Int => DynamicField::Int(0),
            FieldKind::Uint => DynamicField::Uint(0),
            FieldKind::Float => DynamicField::Float(0.0),
            FieldKind::Bool => DynamicField::Bool(false),
            FieldKind::Text => DynamicField::Text(String::new()),
            FieldKind::Any => DynamicField::Any(Value::Null),
            FieldKind::Record(schema) => DynamicField::Record(schema.instantiate()),
        }
    }

    fn slot(&mut self) -> Slot<'_> {
        match self {
            DynamicField::Int(v) => v.slot(),
            DynamicField::Uint(v) => v.slot(),
            DynamicField::Float(v) => v.slot(),
            DynamicField::Bool(v) => v.slot(),
            DynamicField::Text(v) => v.slot(),
            DynamicField::Any(v) => v.slot(),
            DynamicField::Record(r) => Slot::Record(r),
        }
    }
}

/// A record instantiated from a [`Schema`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    fields: Vec<(String, DynamicField)>,
}

impl DynamicRecord {
    /// Get a field's current value.
    pub fn get(&self, name: &str) -> Option<&DynamicField> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynamicField)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Record for DynamicRecord {
    fn field(&mut self, name: &str) -> Option<Slot<'_>> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.slot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consume::consume_object;

    fn person_schema() -> Schema {
        Schema::new()
            .field("Name", FieldKind::Text)
            .field("Age", FieldKind::Uint)
            .field(
                "Address",
                FieldKind::Record(Schema::new().field("City", FieldKind::Text)),
            )
    }

    #[test]
    fn test_instantiate_zero_values() {
        let record = person_schema().instantiate();
        assert_eq!(record.get("Name"), Some(&DynamicField::Text(String::new())));
        assert_eq!(record.get("Age"), Some(&DynamicField::Uint(0)));
        assert!(matches!(record.get("Address"), Some(DynamicField::Record(_))));
        assert_eq!(record.get("Missing"), None);
    }

    #[test]
    fn test_consume_into_dynamic_record() {
        let data = br#"O:6:"Person":3:{s:4:"name";s:3:"Bob";s:3:"age";i:30;s:7:"address";O:7:"Address":1:{s:4:"city";s:5:"Paris";}}"#;
        let mut record = person_schema().instantiate();
        let offset = consume_object(data, 0, &mut record).unwrap();
        assert_eq!(offset, data.len());

        assert_eq!(record.get("Name"), Some(&DynamicField::Text("Bob".into())));
        assert_eq!(record.get("Age"), Some(&DynamicField::Uint(30)));
        match record.get("Address") {
            Some(DynamicField::Record(address)) => {
                assert_eq!(address.get("City"), Some(&DynamicField::Text("Paris".into())));
            }
            other => panic!("Expected nested record, got {:?}", other),
        }
    }

    #[test]
    fn test_iter_keeps_declaration_order() {
        let record = person_schema().instantiate();
        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Name", "Age", "Address"]);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(FieldKind::from_name("uint"), Some(FieldKind::Uint));
        assert_eq!(FieldKind::from_name("str"), Some(FieldKind::Text));
        assert_eq!(FieldKind::from_name("list"), None);
    }
}
