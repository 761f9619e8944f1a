//! Decoded scalar values.

use std::borrow::Cow;
use std::fmt;

/// A single decoded scalar node.
///
/// This is the closed set of values the value dispatcher produces; objects are
/// never materialized as values but projected straight into a [`Record`](crate::Record).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value<'a> {
    /// `N;`
    #[default]
    Null,

    /// `b:0;` / `b:1;`
    Bool(bool),

    /// `i:<digits>;` as a signed 64-bit integer.
    Int(i64),

    /// `d:<decimal>;` as an IEEE double.
    Float(f64),

    /// `s:<len>:"<bytes>";`, borrowed from the input when it is valid UTF-8.
    Text(Cow<'a, str>),
}

impl<'a> Value<'a> {
    /// Check if the value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the value as a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as text.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Convert to an owned value that doesn't borrow from the input.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(b),
            Value::Int(i) => Value::Int(i),
            Value::Float(f) => Value::Float(f),
            Value::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
        }
    }

    /// Get a type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(3).as_int(), Some(3));
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Text("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Float(1.5).as_int(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Text("Bob".into()).to_string(), "\"Bob\"");
    }

    #[test]
    fn test_into_owned_keeps_text() {
        let owned = {
            let raw = String::from("hello");
            Value::Text(Cow::Borrowed(raw.as_str())).into_owned()
        };
        assert_eq!(owned.as_str(), Some("hello"));
    }
}
