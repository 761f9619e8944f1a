//! Text helpers: payload decoding and key normalization.

use std::borrow::Cow;

use bstr::ByteSlice;

/// Decode a raw payload into text.
///
/// In lenient mode invalid UTF-8 sequences are replaced with U+FFFD. In strict
/// mode they are rejected and `None` is returned.
#[inline]
pub fn decode_payload(raw: &[u8], strict_utf8: bool) -> Option<Cow<'_, str>> {
    if strict_utf8 {
        raw.to_str().ok().map(Cow::Borrowed)
    } else {
        Some(raw.to_str_lossy())
    }
}

/// Map a wire key onto the record field naming convention.
///
/// The first character is uppercased; the rest is left untouched, so `name`
/// becomes `Name` and `userID` becomes `UserID`.
pub fn upper_case_first_letter(key: &str) -> Cow<'_, str> {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if !first.to_uppercase().eq(std::iter::once(first)) => {
            let mut out = String::with_capacity(key.len() + 2);
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            Cow::Owned(out)
        }
        _ => Cow::Borrowed(key),
    }
}
