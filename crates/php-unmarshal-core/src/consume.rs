//! Cursor-based PHP serialize consumers.
//!
//! Every consumer takes the buffer and a starting offset and returns the decoded
//! item together with the offset just past it, so callers can keep consuming
//! siblings from the same buffer:
//!
//! ```rust
//! use php_unmarshal_core::{consume_next, Value};
//!
//! let data = b"i:1;s:2:\"hi\";N;";
//! let (first, offset) = consume_next(data, 0).unwrap();
//! let (second, offset) = consume_next(data, offset).unwrap();
//! let (third, offset) = consume_next(data, offset).unwrap();
//! assert_eq!(first, Value::Int(1));
//! assert_eq!(second.as_str(), Some("hi"));
//! assert!(third.is_null());
//! assert_eq!(offset, data.len());
//! ```
//!
//! # Tracing Support
//!
//! Enable the `tracing` feature to get events for every dispatched tag and
//! object key:
//!
//! ```toml
//! php-unmarshal-core = { version = "0.1", features = ["tracing"] }
//! ```

use std::borrow::Cow;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, trace, warn};

use crate::error::{ConsumeError, ErrorKind, Result};
use crate::record::{assign, Discard, Record, Slot};
use crate::scanner::{byte_at, expect_byte, find_next_delimiter, read_count_field};
use crate::text::{decode_payload, upper_case_first_letter};
use crate::types::Value;

/// Maximum object nesting depth to prevent stack overflow.
const MAX_DEPTH: usize = 512;

/// Consumer configuration options.
#[derive(Debug, Clone)]
pub struct ConsumeConfig {
    /// Maximum nesting depth for objects.
    pub max_depth: usize,
    /// Reject string payloads that are not valid UTF-8 instead of decoding them lossily.
    pub strict_utf8: bool,
    /// Whether the top-level `unmarshal*` functions unescape DB-exported input.
    ///
    /// Offset-level consumers never preprocess, since that would shift offsets.
    pub auto_unescape: bool,
}

impl Default for ConsumeConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            strict_utf8: false,
            auto_unescape: true,
        }
    }
}

/// A set of consumers bound to one buffer and configuration.
///
/// The consumer holds no cursor of its own; every method takes an offset and
/// returns the offset just past what it consumed.
#[derive(Debug, Clone)]
pub struct Consumer<'a> {
    data: &'a [u8],
    config: ConsumeConfig,
}

impl<'a> Consumer<'a> {
    /// Create a consumer with default configuration.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, ConsumeConfig::default())
    }

    /// Create a consumer with custom configuration.
    pub fn with_config(data: &'a [u8], config: ConsumeConfig) -> Self {
        Self { data, config }
    }

    /// The underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Consume `N;` and return the offset past it.
    pub fn consume_null(&self, offset: usize) -> Result<usize> {
        self.check_tag(b'N', b';', offset)?;
        Ok(offset + 2)
    }

    /// Consume `b:<0|1>;`. Any payload byte other than `1` decodes as `false`.
    pub fn consume_bool(&self, offset: usize) -> Result<(bool, usize)> {
        self.check_tag(b'b', b':', offset)?;
        let payload = byte_at(self.data, offset + 2)?;
        expect_byte(self.data, b';', offset + 3)?;
        Ok((payload == b'1', offset + 4))
    }

    /// Consume `i:<digits>;` as a signed 64-bit integer.
    pub fn consume_int(&self, offset: usize) -> Result<(i64, usize)> {
        self.check_tag(b'i', b':', offset)?;
        let (literal, next) = self.literal(offset + 2, "integer")?;
        let value = literal.parse::<i64>().map_err(|_| {
            ConsumeError::new(
                ErrorKind::NumericParseError {
                    kind: "integer",
                    literal: literal.to_string(),
                },
                offset + 2,
            )
            .with_input_preview(self.data, offset + 2)
        })?;
        Ok((value, next))
    }

    /// Consume `d:<decimal>;` as a 64-bit float.
    ///
    /// The literal goes through Rust's float grammar unchanged, which also
    /// covers PHP's `INF`, `-INF` and `NAN` spellings.
    pub fn consume_float(&self, offset: usize) -> Result<(f64, usize)> {
        self.check_tag(b'd', b':', offset)?;
        let (literal, next) = self.literal(offset + 2, "float")?;
        let value = literal.parse::<f64>().map_err(|_| {
            ConsumeError::new(
                ErrorKind::NumericParseError {
                    kind: "float",
                    literal: literal.to_string(),
                },
                offset + 2,
            )
            .with_input_preview(self.data, offset + 2)
        })?;
        Ok((value, next))
    }

    /// Consume `s:<len>:"<bytes>";`.
    ///
    /// `<len>` counts bytes of the raw payload. The payload is sliced first and
    /// decoded second, so multi-byte UTF-8 text is extracted exactly.
    pub fn consume_text(&self, offset: usize) -> Result<(Cow<'a, str>, usize)> {
        self.check_tag(b's', b':', offset)?;
        self.length_prefixed(offset + 2, b';')
    }

    /// Consume the next scalar node, dispatching on its tag byte.
    ///
    /// Supported tags are `N`, `b`, `i`, `d` and `s`. Anything else, arrays
    /// and objects included, fails with [`ErrorKind::UnsupportedTag`].
    #[cfg_attr(feature = "tracing", instrument(skip(self), level = "trace"))]
    pub fn consume_next(&self, offset: usize) -> Result<(Value<'a>, usize)> {
        let Some(&tag) = self.data.get(offset) else {
            return Err(ConsumeError::corrupt(offset));
        };

        #[cfg(feature = "tracing")]
        trace!(tag = %char::from(tag), offset, "Dispatching value");

        match tag {
            b'N' => self.consume_null(offset).map(|next| (Value::Null, next)),
            b'b' => self
                .consume_bool(offset)
                .map(|(b, next)| (Value::Bool(b), next)),
            b'i' => self
                .consume_int(offset)
                .map(|(i, next)| (Value::Int(i), next)),
            b'd' => self
                .consume_float(offset)
                .map(|(f, next)| (Value::Float(f), next)),
            b's' => self
                .consume_text(offset)
                .map(|(s, next)| (Value::Text(s), next)),
            _ => {
                #[cfg(feature = "tracing")]
                warn!(tag = %char::from(tag), offset, "Unsupported tag");
                Err(ConsumeError::new(
                    ErrorKind::UnsupportedTag {
                        tag: tag as char,
                        tail: String::from_utf8_lossy(&self.data[offset..]).into_owned(),
                    },
                    offset,
                ))
            }
        }
    }

    /// Consume an `O:` node, projecting its pairs into `dest`.
    ///
    /// Keys are normalized (first letter uppercased) and looked up on `dest`;
    /// keys without a matching field are consumed and dropped. Returns the
    /// offset past the closing `}`. On failure, writes already made to `dest`
    /// are kept.
    pub fn consume_object(&self, offset: usize, dest: &mut dyn Record) -> Result<usize> {
        self.consume_object_at(offset, dest, 0)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, dest), level = "trace"))]
    fn consume_object_at(&self, offset: usize, dest: &mut dyn Record, depth: usize) -> Result<usize> {
        if depth > self.config.max_depth {
            #[cfg(feature = "tracing")]
            warn!(depth, max_depth = self.config.max_depth, "Max depth exceeded");
            return Err(ConsumeError::new(
                ErrorKind::MaxDepthExceeded(self.config.max_depth),
                offset,
            ));
        }

        self.check_tag(b'O', b':', offset)?;

        // The class name only needs to be stepped over.
        let (_class_name, pos) = self.length_prefixed(offset + 2, b':')?;
        let (count, pos) = read_count_field(self.data, pos)?;
        expect_byte(self.data, b'{', pos)?;
        let mut pos = pos + 1;

        #[cfg(feature = "tracing")]
        trace!(class = %_class_name, count, depth, "Consuming object");

        for _ in 0..count {
            let key_tag = byte_at(self.data, pos)?;
            if key_tag != b's' {
                return Err(ConsumeError::new(ErrorKind::InvalidKey(key_tag as char), pos)
                    .with_input_preview(self.data, pos));
            }

            let (key, next) = self.consume_text(pos)?;
            pos = next;
            let name = upper_case_first_letter(&key);
            let slot = dest.field(&name);

            #[cfg(feature = "tracing")]
            if slot.is_none() {
                trace!(key = %name, "No matching field, discarding");
            }

            if byte_at(self.data, pos)? == b'O' {
                pos = match slot {
                    Some(Slot::Record(nested)) => self.consume_object_at(pos, nested, depth + 1)?,
                    Some(Slot::Optional(optional)) => match optional.fill_record() {
                        Some(nested) => self.consume_object_at(pos, nested, depth + 1)?,
                        None => {
                            return Err(ConsumeError::new(
                                ErrorKind::FieldTypeMismatch {
                                    field: name.into_owned(),
                                    expected: optional.type_name(),
                                    found: "object",
                                },
                                pos,
                            ));
                        }
                    },
                    None => self.consume_object_at(pos, &mut Discard, depth + 1)?,
                    Some(other) => {
                        return Err(ConsumeError::new(
                            ErrorKind::FieldTypeMismatch {
                                field: name.into_owned(),
                                expected: other.type_name(),
                                found: "object",
                            },
                            pos,
                        ));
                    }
                };
            } else {
                let value_start = pos;
                let (value, next) = self.consume_next(pos)?;
                pos = next;

                if let Some(slot) = slot {
                    let found = value.type_name();
                    assign(slot, value).map_err(|expected| {
                        ConsumeError::new(
                            ErrorKind::FieldTypeMismatch {
                                field: name.into_owned(),
                                expected,
                                found,
                            },
                            value_start,
                        )
                    })?;
                }
            }
        }

        expect_byte(self.data, b'}', pos)?;
        Ok(pos + 1)
    }

    /// Check that `tag` sits at `offset` followed by `separator`.
    #[inline]
    fn check_tag(&self, tag: u8, separator: u8, offset: usize) -> Result<()> {
        let found = byte_at(self.data, offset)?;
        if found != tag {
            return Err(self.unexpected_tag(tag, found, offset));
        }
        let found = byte_at(self.data, offset + 1)?;
        if found != separator {
            return Err(self
                .unexpected_tag(tag, found, offset + 1)
                .with_context(format!("tag must be followed by '{}'", separator as char)));
        }
        Ok(())
    }

    #[cold]
    #[inline(never)]
    fn unexpected_tag(&self, expected: u8, found: u8, offset: usize) -> ConsumeError {
        ConsumeError::new(
            ErrorKind::UnexpectedTag {
                expected: expected as char,
                found: found as char,
            },
            offset,
        )
        .with_input_preview(self.data, offset)
    }

    /// Slice the ASCII literal from `start` up to the next `;`.
    fn literal(&self, start: usize, kind: &'static str) -> Result<(&'a str, usize)> {
        let end = find_next_delimiter(self.data, b';', start).ok_or_else(|| {
            let rest = self.data.get(start..).unwrap_or_default();
            ConsumeError::new(
                ErrorKind::NumericParseError {
                    kind,
                    literal: String::from_utf8_lossy(rest).into_owned(),
                },
                start,
            )
            .with_context("missing ';' terminator")
        })?;

        let literal = std::str::from_utf8(&self.data[start..end]).map_err(|_| {
            ConsumeError::new(
                ErrorKind::NumericParseError {
                    kind,
                    literal: String::from_utf8_lossy(&self.data[start..end]).into_owned(),
                },
                start,
            )
        })?;

        Ok((literal, end + 1))
    }

    /// Consume the `<len>:"<bytes>"<terminator>` framing shared by strings and
    /// class names.
    fn length_prefixed(&self, offset: usize, terminator: u8) -> Result<(Cow<'a, str>, usize)> {
        let (len, pos) = read_count_field(self.data, offset).map_err(|e| {
            if let ErrorKind::MalformedCount(raw) = &e.kind {
                return ConsumeError::new(
                    ErrorKind::MalformedString(format!("invalid length {:?}", raw)),
                    e.position,
                )
                .with_input_preview(self.data, e.position);
            }
            e
        })?;

        expect_byte(self.data, b'"', pos)?;
        let start = pos + 1;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                ConsumeError::corrupt(start)
                    .with_context(format!("payload of {} bytes runs past end of input", len))
            })?;

        expect_byte(self.data, b'"', end)?;
        expect_byte(self.data, terminator, end + 1)?;

        let text = decode_payload(&self.data[start..end], self.config.strict_utf8).ok_or_else(|| {
            ConsumeError::new(
                ErrorKind::MalformedString("payload is not valid UTF-8".into()),
                start,
            )
        })?;

        Ok((text, end + 2))
    }
}

/// Consume `N;` at `offset`. See [`Consumer::consume_null`].
pub fn consume_null(data: &[u8], offset: usize) -> Result<usize> {
    Consumer::new(data).consume_null(offset)
}

/// Consume a boolean at `offset`. See [`Consumer::consume_bool`].
pub fn consume_bool(data: &[u8], offset: usize) -> Result<(bool, usize)> {
    Consumer::new(data).consume_bool(offset)
}

/// Consume an integer at `offset`. See [`Consumer::consume_int`].
pub fn consume_int(data: &[u8], offset: usize) -> Result<(i64, usize)> {
    Consumer::new(data).consume_int(offset)
}

/// Consume a float at `offset`. See [`Consumer::consume_float`].
pub fn consume_float(data: &[u8], offset: usize) -> Result<(f64, usize)> {
    Consumer::new(data).consume_float(offset)
}

/// Consume a string at `offset`. See [`Consumer::consume_text`].
pub fn consume_text(data: &[u8], offset: usize) -> Result<(Cow<'_, str>, usize)> {
    Consumer::new(data).consume_text(offset)
}

/// Consume the scalar node at `offset`. See [`Consumer::consume_next`].
#[inline]
pub fn consume_next(data: &[u8], offset: usize) -> Result<(Value<'_>, usize)> {
    Consumer::new(data).consume_next(offset)
}

/// Consume the object node at `offset` into `dest`. See [`Consumer::consume_object`].
#[inline]
pub fn consume_object(data: &[u8], offset: usize, dest: &mut dyn Record) -> Result<usize> {
    Consumer::new(data).consume_object(offset, dest)
}

/// Decode an object payload into `dest` with the default configuration.
///
/// # Example
///
/// ```rust
/// use php_unmarshal_core::{impl_record, unmarshal};
///
/// #[derive(Default)]
/// struct Session {
///     user_id: i64,
///     admin: bool,
/// }
///
/// impl_record!(Session { "UserId" => user_id, "Admin" => admin });
///
/// let mut session = Session::default();
/// unmarshal(br#"O:7:"Session":2:{s:6:"userId";i:42;s:5:"admin";b:1;}"#, &mut session).unwrap();
/// assert_eq!(session.user_id, 42);
/// assert!(session.admin);
/// ```
#[inline]
pub fn unmarshal(data: &[u8], dest: &mut dyn Record) -> Result<()> {
    unmarshal_with_config(data, dest, ConsumeConfig::default())
}

/// Decode an object payload into `dest` with custom configuration.
#[cfg_attr(feature = "tracing", instrument(skip_all, fields(data_len = data.len())))]
pub fn unmarshal_with_config(
    data: &[u8],
    dest: &mut dyn Record,
    config: ConsumeConfig,
) -> Result<()> {
    let buf = if config.auto_unescape {
        preprocess(data)
    } else {
        Cow::Borrowed(data)
    };

    #[cfg(feature = "tracing")]
    if matches!(buf, Cow::Owned(_)) {
        debug!("Input was unescaped before decoding");
    }

    let result = Consumer::with_config(&buf, config).consume_object(0, dest);

    #[cfg(feature = "tracing")]
    if let Err(ref e) = result {
        warn!(error = %e, "Unmarshal failed");
    }

    result.map(|_| ())
}

/// Decode a scalar payload with the default configuration.
///
/// # Example
///
/// ```rust
/// use php_unmarshal_core::unmarshal_value;
///
/// let value = unmarshal_value(b"d:3.5;").unwrap();
/// assert_eq!(value.as_float(), Some(3.5));
/// ```
#[inline]
pub fn unmarshal_value(data: &[u8]) -> Result<Value<'_>> {
    unmarshal_value_with_config(data, ConsumeConfig::default())
}

/// Decode a scalar payload with custom configuration.
#[cfg_attr(feature = "tracing", instrument(skip_all, fields(data_len = data.len())))]
pub fn unmarshal_value_with_config(data: &[u8], config: ConsumeConfig) -> Result<Value<'_>> {
    let buf = if config.auto_unescape {
        preprocess(data)
    } else {
        Cow::Borrowed(data)
    };

    let result = match buf {
        Cow::Borrowed(raw) => Consumer::with_config(raw, config)
            .consume_next(0)
            .map(|(value, _)| value),
        Cow::Owned(owned) => Consumer::with_config(&owned, config)
            .consume_next(0)
            .map(|(value, _)| value.into_owned()),
    };

    #[cfg(feature = "tracing")]
    match &result {
        Ok(value) => debug!(value_type = value.type_name(), "Unmarshal completed"),
        Err(e) => warn!(error = %e, "Unmarshal failed"),
    }

    result
}

/// Whether `tag` starts a node this crate can consume.
#[inline]
fn is_supported_tag(tag: u8) -> bool {
    matches!(tag, b'N' | b'b' | b'i' | b'd' | b's' | b'O')
}

/// Quick check that `data` starts with a supported tag. Does not validate further.
pub fn is_serialized(data: &[u8]) -> bool {
    data.first().copied().is_some_and(is_supported_tag)
}

/// Preprocess data to handle DB-escaped payloads.
///
/// Detects payloads wrapped in `"` whose inner double quotes were escaped as
/// `""`, e.g. `"O:1:""A"":0:{}"`, and unescapes them.
pub fn preprocess(data: &[u8]) -> Cow<'_, [u8]> {
    if data.len() >= 2 && data[0] == b'"' && data[data.len() - 1] == b'"' {
        let inner = &data[1..data.len() - 1];
        if inner.first().copied().is_some_and(is_supported_tag) {
            return Cow::Owned(unescape_double_quotes(inner));
        }
    }

    Cow::Borrowed(data)
}

/// Unescape double quotes (`""` -> `"`).
fn unescape_double_quotes(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        if i + 1 < data.len() && data[i] == b'"' && data[i + 1] == b'"' {
            result.push(b'"');
            i += 2;
        } else {
            result.push(data[i]);
            i += 1;
        }
    }

    result
}
