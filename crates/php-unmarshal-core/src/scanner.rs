//! Byte-level cursor primitives shared by every consumer.

use memchr::memchr;

use crate::error::{ConsumeError, ErrorKind, Result};

/// Find the first occurrence of `byte` at or after `from`.
///
/// Returns `None` when the byte does not occur in the remainder of the buffer,
/// including when `from` is already past the end.
#[inline]
pub fn find_next_delimiter(data: &[u8], byte: u8, from: usize) -> Option<usize> {
    let rest = data.get(from..)?;
    memchr(byte, rest).map(|offset| from + offset)
}

/// Read a decimal `<digits>:` count field starting at `from`.
///
/// Returns the count and the offset just past the `:`.
pub fn read_count_field(data: &[u8], from: usize) -> Result<(usize, usize)> {
    if from >= data.len() {
        return Err(ConsumeError::corrupt(from));
    }

    let end = find_next_delimiter(data, b':', from).ok_or_else(|| {
        ConsumeError::new(
            ErrorKind::MalformedCount(String::from_utf8_lossy(&data[from..]).into_owned()),
            from,
        )
        .with_context("missing ':' delimiter")
        .with_input_preview(data, from)
    })?;

    let digits = &data[from..end];
    let count = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| {
            ConsumeError::new(
                ErrorKind::MalformedCount(String::from_utf8_lossy(digits).into_owned()),
                from,
            )
            .with_input_preview(data, from)
        })?;

    Ok((count, end + 1))
}

/// Return the byte at `offset`, or a [`ErrorKind::CorruptStream`] error.
#[inline(always)]
pub(crate) fn byte_at(data: &[u8], offset: usize) -> Result<u8> {
    data.get(offset)
        .copied()
        .ok_or_else(|| ConsumeError::corrupt(offset))
}

/// Require `expected` at `offset`.
#[inline]
pub(crate) fn expect_byte(data: &[u8], expected: u8, offset: usize) -> Result<()> {
    let found = byte_at(data, offset)?;
    if found != expected {
        return Err(ConsumeError::new(
            ErrorKind::UnexpectedChar {
                expected: expected as char,
                found: found as char,
            },
            offset,
        )
        .with_input_preview(data, offset));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_next_delimiter() {
        let data = b"i:42;i:7;";
        assert_eq!(find_next_delimiter(data, b';', 0), Some(4));
        assert_eq!(find_next_delimiter(data, b';', 4), Some(4));
        assert_eq!(find_next_delimiter(data, b';', 5), Some(8));
        assert_eq!(find_next_delimiter(data, b'x', 0), None);
    }

    #[test]
    fn test_find_next_delimiter_out_of_range() {
        assert_eq!(find_next_delimiter(b"N;", b';', 2), None);
        assert_eq!(find_next_delimiter(b"N;", b';', 10), None);
    }

    #[test]
    fn test_read_count_field() {
        assert_eq!(read_count_field(b"5:\"hello\"", 0).unwrap(), (5, 2));
        assert_eq!(read_count_field(b"s:12:", 2).unwrap(), (12, 5));
    }

    #[test]
    fn test_read_count_field_not_numeric() {
        let err = read_count_field(b"x1:", 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedCount("x1".into()));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn test_read_count_field_negative() {
        let err = read_count_field(b"-1:", 0).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedCount(_)));
    }

    #[test]
    fn test_read_count_field_missing_delimiter() {
        let err = read_count_field(b"123", 0).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedCount(_)));
    }

    #[test]
    fn test_read_count_field_past_end() {
        let err = read_count_field(b"s:", 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptStream);
    }

    #[test]
    fn test_expect_byte() {
        assert!(expect_byte(b"{}", b'{', 0).is_ok());
        let err = expect_byte(b"{}", b'{', 1).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedChar {
                expected: '{',
                found: '}'
            }
        );
        assert_eq!(expect_byte(b"{}", b'}', 2).unwrap_err().kind, ErrorKind::CorruptStream);
    }
}
