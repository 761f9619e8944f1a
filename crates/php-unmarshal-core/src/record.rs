//! Destination records.
//!
//! An object node is never materialized as a value. Instead its key/value pairs
//! are projected into a caller-owned [`Record`]: for each key the consumer asks
//! the record for a [`Slot`] by name, and the slot variant decides how the
//! decoded scalar is coerced before it is stored.
//!
//! Most records are plain structs wired up with [`impl_record!`](crate::impl_record):
//!
//! ```rust
//! use php_unmarshal_core::{impl_record, unmarshal};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     age: u8,
//! }
//!
//! impl_record!(Person {
//!     "Name" => name,
//!     "Age" => age,
//! });
//!
//! let mut person = Person::default();
//! unmarshal(br#"O:6:"Person":2:{s:4:"name";s:3:"Bob";s:3:"age";i:30;}"#, &mut person).unwrap();
//! assert_eq!(person.name, "Bob");
//! assert_eq!(person.age, 30);
//! ```

use std::borrow::Cow;

use crate::types::Value;

/// A destination that exposes named, typed fields.
pub trait Record {
    /// Look up a field by its normalized name.
    ///
    /// Returning `None` makes the consumer discard the value for that key.
    fn field(&mut self, name: &str) -> Option<Slot<'_>>;
}

/// A settable field, tagged with the coercion rule that applies to it.
pub enum Slot<'r> {
    /// Signed integer field; receives decoded integers that fit its width.
    Int(&'r mut dyn SignedField),
    /// Unsigned integer field; receives non-negative decoded integers that fit.
    Uint(&'r mut dyn UnsignedField),
    /// Floating-point field; receives floats and widened integers.
    Float(&'r mut dyn FloatField),
    /// Any other field; receives the decoded value as-is.
    Opaque(&'r mut dyn OpaqueField),
    /// Nullable field; null clears it, anything else fills the inner slot.
    Optional(&'r mut dyn OptionalField),
    /// Nested record; receives a nested object node.
    Record(&'r mut dyn Record),
}

impl Slot<'_> {
    /// Name of the field's type, for error messages.
    pub fn type_name(&self) -> Cow<'static, str> {
        match self {
            Slot::Int(f) => Cow::Borrowed(f.type_name()),
            Slot::Uint(f) => Cow::Borrowed(f.type_name()),
            Slot::Float(f) => Cow::Borrowed(f.type_name()),
            Slot::Opaque(f) => Cow::Borrowed(f.type_name()),
            Slot::Optional(f) => f.type_name(),
            Slot::Record(_) => Cow::Borrowed("record"),
        }
    }
}

/// A signed integer field.
pub trait SignedField {
    /// Store `value`, returning `false` if it does not fit.
    fn set_signed(&mut self, value: i64) -> bool;
    /// Name of the field's type.
    fn type_name(&self) -> &'static str;
}

/// An unsigned integer field.
pub trait UnsignedField {
    /// Store `value`, returning `false` if it does not fit.
    fn set_unsigned(&mut self, value: u64) -> bool;
    /// Name of the field's type.
    fn type_name(&self) -> &'static str;
}

/// A floating-point field.
pub trait FloatField {
    /// Store `value`, narrowing if the field is smaller than 64 bits.
    fn set_float(&mut self, value: f64);
    /// Name of the field's type.
    fn type_name(&self) -> &'static str;
}

/// A field that takes decoded values without numeric coercion.
pub trait OpaqueField {
    /// Store `value`, returning `false` if its kind is not accepted.
    fn set_value(&mut self, value: Value<'_>) -> bool;
    /// Name of the field's type.
    fn type_name(&self) -> &'static str;
}

/// A nullable field wrapping another slot.
pub trait OptionalField {
    /// Store `value`: null clears the field, anything else is coerced into a
    /// fresh inner value. On failure the field is left untouched.
    fn set_value(&mut self, value: Value<'_>) -> Result<(), Cow<'static, str>>;
    /// Replace the field with a default inner record and borrow it.
    ///
    /// Returns `None`, leaving the field untouched, if the inner type is not a
    /// record.
    fn fill_record(&mut self) -> Option<&mut dyn Record>;
    /// Name of the field's type, e.g. `Option<String>`.
    fn type_name(&self) -> Cow<'static, str>;
}

/// Types that can be borrowed as a [`Slot`].
pub trait IntoSlot {
    /// Borrow `self` as a settable slot.
    fn slot(&mut self) -> Slot<'_>;
}

macro_rules! signed_fields {
    ($($t:ty),*) => {$(
        impl SignedField for $t {
            #[inline]
            fn set_signed(&mut self, value: i64) -> bool {
                match <$t>::try_from(value) {
                    Ok(v) => {
                        *self = v;
                        true
                    }
                    Err(_) => false,
                }
            }

            fn type_name(&self) -> &'static str {
                stringify!($t)
            }
        }

        impl IntoSlot for $t {
            #[inline]
            fn slot(&mut self) -> Slot<'_> {
                Slot::Int(self)
            }
        }
    )*};
}

macro_rules! unsigned_fields {
    ($($t:ty),*) => {$(
        impl UnsignedField for $t {
            #[inline]
            fn set_unsigned(&mut self, value: u64) -> bool {
                match <$t>::try_from(value) {
                    Ok(v) => {
                        *self = v;
                        true
                    }
                    Err(_) => false,
                }
            }

            fn type_name(&self) -> &'static str {
                stringify!($t)
            }
        }

        impl IntoSlot for $t {
            #[inline]
            fn slot(&mut self) -> Slot<'_> {
                Slot::Uint(self)
            }
        }
    )*};
}

signed_fields!(i8, i16, i32, i64, isize);
unsigned_fields!(u8, u16, u32, u64, usize);

impl FloatField for f64 {
    #[inline]
    fn set_float(&mut self, value: f64) {
        *self = value;
    }

    fn type_name(&self) -> &'static str {
        "f64"
    }
}

impl FloatField for f32 {
    #[inline]
    fn set_float(&mut self, value: f64) {
        *self = value as f32;
    }

    fn type_name(&self) -> &'static str {
        "f32"
    }
}

impl IntoSlot for f64 {
    #[inline]
    fn slot(&mut self) -> Slot<'_> {
        Slot::Float(self)
    }
}

impl IntoSlot for f32 {
    #[inline]
    fn slot(&mut self) -> Slot<'_> {
        Slot::Float(self)
    }
}

impl OpaqueField for bool {
    fn set_value(&mut self, value: Value<'_>) -> bool {
        match value {
            Value::Bool(b) => {
                *self = b;
                true
            }
            _ => false,
        }
    }

    fn type_name(&self) -> &'static str {
        "bool"
    }
}

impl OpaqueField for String {
    fn set_value(&mut self, value: Value<'_>) -> bool {
        match value {
            Value::Text(s) => {
                *self = s.into_owned();
                true
            }
            _ => false,
        }
    }

    fn type_name(&self) -> &'static str {
        "String"
    }
}

impl OpaqueField for Value<'static> {
    fn set_value(&mut self, value: Value<'_>) -> bool {
        *self = value.into_owned();
        true
    }

    fn type_name(&self) -> &'static str {
        "Value"
    }
}

impl<T: IntoSlot + Default> OptionalField for Option<T> {
    fn set_value(&mut self, value: Value<'_>) -> Result<(), Cow<'static, str>> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }

        let mut inner = T::default();
        let assigned = assign(inner.slot(), value);
        match assigned {
            Ok(()) => {
                *self = Some(inner);
                Ok(())
            }
            Err(_) => Err(self.type_name()),
        }
    }

    fn fill_record(&mut self) -> Option<&mut dyn Record> {
        let mut inner = T::default();
        if !matches!(inner.slot(), Slot::Record(_)) {
            return None;
        }

        match self.insert(inner).slot() {
            Slot::Record(record) => Some(record),
            _ => None,
        }
    }

    fn type_name(&self) -> Cow<'static, str> {
        let mut inner = T::default();
        let inner_name = inner.slot().type_name();
        Cow::Owned(format!("Option<{}>", inner_name))
    }
}

impl IntoSlot for bool {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Opaque(self)
    }
}

impl IntoSlot for String {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Opaque(self)
    }
}

impl IntoSlot for Value<'static> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Opaque(self)
    }
}

impl<T: IntoSlot + Default> IntoSlot for Option<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Optional(self)
    }
}

/// Coerce `value` into `slot`.
///
/// On failure the slot's type name is returned so the caller can build a
/// [`ErrorKind::FieldTypeMismatch`](crate::ErrorKind::FieldTypeMismatch).
pub(crate) fn assign(slot: Slot<'_>, value: Value<'_>) -> Result<(), Cow<'static, str>> {
    match slot {
        Slot::Int(field) => {
            if let Value::Int(i) = value {
                if field.set_signed(i) {
                    return Ok(());
                }
            }
            Err(field.type_name().into())
        }
        Slot::Uint(field) => {
            if let Value::Int(i) = value {
                if let Ok(u) = u64::try_from(i) {
                    if field.set_unsigned(u) {
                        return Ok(());
                    }
                }
            }
            Err(field.type_name().into())
        }
        Slot::Float(field) => match value {
            Value::Float(f) => {
                field.set_float(f);
                Ok(())
            }
            Value::Int(i) => {
                field.set_float(i as f64);
                Ok(())
            }
            _ => Err(field.type_name().into()),
        },
        Slot::Opaque(field) => {
            let name = field.type_name();
            if field.set_value(value) {
                Ok(())
            } else {
                Err(name.into())
            }
        }
        Slot::Optional(field) => field.set_value(value),
        Slot::Record(_) => Err("record".into()),
    }
}

/// The discard sink: a record with no fields.
///
/// Used as the destination for nested objects whose key has no matching field,
/// so the cursor still advances over them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Discard;

impl Record for Discard {
    #[inline]
    fn field(&mut self, _name: &str) -> Option<Slot<'_>> {
        None
    }
}

/// Implement [`Record`] and [`IntoSlot`] for a struct.
///
/// Each entry maps a normalized wire name (first letter uppercase) to a struct
/// field whose type implements [`IntoSlot`]. Structs wired up this way can be
/// nested inside one another.
///
/// ```rust
/// use php_unmarshal_core::impl_record;
///
/// #[derive(Default)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// impl_record!(Point { "X" => x, "Y" => y });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($name:literal => $field:ident),* $(,)? }) => {
        impl $crate::Record for $ty {
            #[allow(unused_variables)]
            fn field(&mut self, name: &str) -> ::core::option::Option<$crate::Slot<'_>> {
                match name {
                    $($name => ::core::option::Option::Some($crate::IntoSlot::slot(&mut self.$field)),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::IntoSlot for $ty {
            fn slot(&mut self) -> $crate::Slot<'_> {
                $crate::Slot::Record(self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        count: i32,
        size: u16,
        ratio: f32,
        label: String,
        note: Option<String>,
        limit: Option<i64>,
    }

    crate::impl_record!(Sample {
        "Count" => count,
        "Size" => size,
        "Ratio" => ratio,
        "Label" => label,
        "Note" => note,
        "Limit" => limit,
    });

    fn set(record: &mut Sample, name: &str, value: Value<'_>) -> Result<(), Cow<'static, str>> {
        let slot = record.field(name).expect("field exists");
        assign(slot, value)
    }

    #[test]
    fn test_lookup_unknown_field() {
        let mut sample = Sample::default();
        assert!(sample.field("Missing").is_none());
        assert!(sample.field("count").is_none());
    }

    #[test]
    fn test_signed_coercion() {
        let mut sample = Sample::default();
        set(&mut sample, "Count", Value::Int(-7)).unwrap();
        assert_eq!(sample.count, -7);
        assert_eq!(set(&mut sample, "Count", Value::Int(1 << 40)), Err("i32".into()));
        assert_eq!(set(&mut sample, "Count", Value::Float(1.0)), Err("i32".into()));
        assert_eq!(sample.count, -7);
    }

    #[test]
    fn test_unsigned_coercion() {
        let mut sample = Sample::default();
        set(&mut sample, "Size", Value::Int(65535)).unwrap();
        assert_eq!(sample.size, 65535);
        assert_eq!(set(&mut sample, "Size", Value::Int(-1)), Err("u16".into()));
        assert_eq!(set(&mut sample, "Size", Value::Int(65536)), Err("u16".into()));
    }

    #[test]
    fn test_float_coercion_widens_integers() {
        let mut sample = Sample::default();
        set(&mut sample, "Ratio", Value::Float(0.5)).unwrap();
        assert_eq!(sample.ratio, 0.5);
        set(&mut sample, "Ratio", Value::Int(3)).unwrap();
        assert_eq!(sample.ratio, 3.0);
        assert_eq!(set(&mut sample, "Ratio", Value::Null), Err("f32".into()));
    }

    #[test]
    fn test_opaque_assignment() {
        let mut sample = Sample::default();
        set(&mut sample, "Label", Value::Text("hi".into())).unwrap();
        assert_eq!(sample.label, "hi");
        assert_eq!(set(&mut sample, "Label", Value::Int(1)), Err("String".into()));
    }

    #[test]
    fn test_option_fields() {
        let mut sample = Sample::default();
        set(&mut sample, "Note", Value::Text("n".into())).unwrap();
        assert_eq!(sample.note.as_deref(), Some("n"));
        set(&mut sample, "Note", Value::Null).unwrap();
        assert_eq!(sample.note, None);

        set(&mut sample, "Limit", Value::Int(9)).unwrap();
        assert_eq!(sample.limit, Some(9));
        assert_eq!(
            set(&mut sample, "Limit", Value::Bool(true)),
            Err("Option<i64>".into())
        );
        assert_eq!(sample.limit, Some(9));
    }

    #[test]
    fn test_option_type_names() {
        let mut note: Option<String> = None;
        assert_eq!(note.slot().type_name(), "Option<String>");
        let mut nested: Option<Option<u8>> = None;
        assert_eq!(nested.slot().type_name(), "Option<Option<u8>>");
        let mut sample: Option<Sample> = None;
        assert_eq!(sample.slot().type_name(), "Option<record>");
    }

    #[test]
    fn test_option_fill_record() {
        let mut sample: Option<Sample> = None;
        match sample.slot() {
            Slot::Optional(field) => {
                let record = field.fill_record().expect("inner type is a record");
                let slot = record.field("Count").expect("field exists");
                assign(slot, Value::Int(3)).unwrap();
            }
            _ => panic!("expected an optional slot"),
        }
        assert_eq!(sample.map(|s| s.count), Some(3));

        let mut note: Option<String> = None;
        match note.slot() {
            Slot::Optional(field) => assert!(field.fill_record().is_none()),
            _ => panic!("expected an optional slot"),
        }
        assert_eq!(note, None);
    }

    #[test]
    fn test_value_field_takes_anything() {
        let mut any = Value::Null;
        assign(any.slot(), Value::Float(2.0)).unwrap();
        assert_eq!(any, Value::Float(2.0));
    }

    #[test]
    fn test_scalar_into_record_slot_fails() {
        let mut sample = Sample::default();
        assert_eq!(assign(sample.slot(), Value::Int(1)), Err("record".into()));
    }

    #[test]
    fn test_discard_has_no_fields() {
        assert!(Discard.field("Anything").is_none());
    }
}
