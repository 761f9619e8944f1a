//! Cursor-based decoder for PHP's `serialize()` format.
//!
//! This crate walks a serialized byte buffer with an explicit offset, decoding
//! scalar nodes into [`Value`]s and projecting object nodes straight into
//! caller-owned [`Record`]s by matching keys to field names.
//!
//! # Features
//!
//! - **Explicit cursor** - Every consumer takes an offset and returns the next one
//! - **Typed projection** - Object keys land in struct fields with numeric coercion
//! - **Byte-exact strings** - Length prefixes are applied to raw bytes, then decoded
//! - **Tolerant schemas** - Keys without a matching field are skipped, not rejected
//! - **Detailed errors** - Precise error offsets and input previews
//!
//! # Quick Start
//!
//! ```rust
//! use php_unmarshal_core::{impl_record, unmarshal};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! impl_record!(Person { "Name" => name, "Age" => age });
//!
//! let data = br#"O:6:"Person":2:{s:4:"Name";s:3:"Bob";s:3:"Age";i:30;}"#;
//! let mut person = Person::default();
//! unmarshal(data, &mut person).unwrap();
//! assert_eq!(person.name, "Bob");
//! assert_eq!(person.age, 30);
//! ```
//!
//! # Supported Tags
//!
//! | Tag | Form | Decoded as |
//! |-----|------|------------|
//! | `N` | `N;` | `Value::Null` |
//! | `b` | `b:1;` | `Value::Bool(bool)` |
//! | `i` | `i:42;` | `Value::Int(i64)` |
//! | `d` | `d:3.5;` | `Value::Float(f64)` |
//! | `s` | `s:5:"hello";` | `Value::Text(Cow<str>)` |
//! | `O` | `O:6:"Person":2:{...}` | projected into a [`Record`] |
//!
//! Arrays (`a`), references, enums and custom-serialized objects are not
//! supported and fail with [`ErrorKind::UnsupportedTag`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)]

pub mod consume;
pub mod dynamic;
pub mod error;
pub mod record;
pub mod scanner;
pub mod text;
pub mod types;

#[cfg(feature = "serde")]
pub mod json;

pub use consume::{
    consume_bool, consume_float, consume_int, consume_next, consume_null, consume_object,
    consume_text, is_serialized, preprocess, unmarshal, unmarshal_value,
    unmarshal_value_with_config, unmarshal_with_config, ConsumeConfig, Consumer,
};
pub use dynamic::{DynamicField, DynamicRecord, FieldKind, Schema};
pub use error::{ConsumeError, ErrorKind, Result};
pub use record::{
    Discard, FloatField, IntoSlot, OpaqueField, OptionalField, Record, SignedField, Slot,
    UnsignedField,
};
pub use types::Value;

#[cfg(feature = "serde")]
pub use json::{record_to_json, to_json};
