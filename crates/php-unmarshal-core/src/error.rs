//! Error types for PHP unmarshalling.
//!
//! Every consumer reports failure through [`ConsumeError`], which carries the
//! [`ErrorKind`], the byte offset where the problem was detected, and optional
//! context for debugging.

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// The main error type for PHP unmarshalling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ConsumeError {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// The byte offset where the error occurred.
    pub position: usize,
    /// Optional context about what was being consumed.
    pub context: Option<String>,
    /// Preview of input around error position for debugging.
    pub input_preview: Option<String>,
}

impl fmt::Display for ConsumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.position)?;
        if let Some(ref ctx) = self.context {
            write!(f, " ({})", ctx)?;
        }
        if let Some(ref preview) = self.input_preview {
            write!(f, "\n{}", preview)?;
        }
        Ok(())
    }
}

/// Specific kinds of unmarshalling errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The tag byte (or its `:` separator) was not the one the consumer handles.
    #[error("expected '{expected}' tag, found '{found}'")]
    UnexpectedTag {
        /// The tag the consumer expected.
        expected: char,
        /// The byte that was found instead.
        found: char,
    },

    /// A framing byte was missing.
    #[error("expected '{expected}', found '{found}'")]
    UnexpectedChar {
        /// The byte that was expected.
        expected: char,
        /// The byte that was found.
        found: char,
    },

    /// A `<digits>:` count field did not parse.
    #[error("malformed count field: {0:?}")]
    MalformedCount(String),

    /// A length-prefixed payload did not parse.
    #[error("malformed string: {0}")]
    MalformedString(String),

    /// A numeric literal was not valid for its kind.
    #[error("invalid {kind} literal: {literal:?}")]
    NumericParseError {
        /// `"integer"` or `"float"`.
        kind: &'static str,
        /// The offending literal text.
        literal: String,
    },

    /// An object key was not a string node.
    #[error("object key must be a string, found tag '{0}'")]
    InvalidKey(char),

    /// A decoded value could not be assigned to the matched field.
    #[error("cannot assign {found} to field {field:?} of type {expected}")]
    FieldTypeMismatch {
        /// The normalized field name.
        field: String,
        /// The field's type.
        expected: Cow<'static, str>,
        /// The decoded value's kind.
        found: &'static str,
    },

    /// The cursor ran past the end of the buffer.
    #[error("corrupt stream: unexpected end of input")]
    CorruptStream,

    /// The tag byte is not one the value dispatcher handles.
    #[error("can not consume type '{tag}': {tail}")]
    UnsupportedTag {
        /// The unrecognized tag.
        tag: char,
        /// The remaining buffer from the tag onwards.
        tail: String,
    },

    /// Nesting depth exceeded.
    #[error("maximum nesting depth ({0}) exceeded")]
    MaxDepthExceeded(usize),
}

impl ConsumeError {
    /// Create a new error with the given kind and position.
    #[inline]
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            position,
            context: None,
            input_preview: None,
        }
    }

    /// Shorthand for a [`ErrorKind::CorruptStream`] error.
    #[inline]
    pub fn corrupt(position: usize) -> Self {
        Self::new(ErrorKind::CorruptStream, position)
    }

    /// Add context to the error.
    #[inline]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add input preview around the error position for debugging.
    ///
    /// Shows up to 20 bytes before and after the error position.
    #[cold]
    pub fn with_input_preview(mut self, data: &[u8], error_pos: usize) -> Self {
        let start = error_pos.saturating_sub(20).min(data.len());
        let end = error_pos.saturating_add(20).min(data.len());

        if start < end {
            let preview = String::from_utf8_lossy(&data[start..end]);

            let relative_pos = error_pos.saturating_sub(start);
            let mut result = String::with_capacity(preview.len() + relative_pos + 2);
            result.push_str(&preview);
            result.push('\n');
            result.push_str(&" ".repeat(relative_pos));
            result.push('^');

            self.input_preview = Some(result);
        }
        self
    }
}

/// Result type alias for PHP unmarshalling.
pub type Result<T> = std::result::Result<T, ConsumeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offset_and_context() {
        let err = ConsumeError::new(ErrorKind::CorruptStream, 7).with_context("reading key");
        assert_eq!(
            err.to_string(),
            "corrupt stream: unexpected end of input at offset 7 (reading key)"
        );
    }

    #[test]
    fn test_input_preview_marks_position() {
        let err = ConsumeError::corrupt(2).with_input_preview(b"i:x;", 2);
        assert_eq!(err.input_preview.as_deref(), Some("i:x;\n  ^"));
    }

    #[test]
    fn test_input_preview_past_end_is_skipped() {
        let err = ConsumeError::corrupt(50).with_input_preview(b"N;", 50);
        assert!(err.input_preview.is_none());
    }
}
