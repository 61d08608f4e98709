//! Percent-encoding shared by path building, signing and matching.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything outside the RFC 3986 unreserved set gets encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode one path segment or query component.
#[must_use]
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, UNRESERVED).to_string()
}

/// Decode one path segment. Invalid UTF-8 is replaced rather than rejected.
#[must_use]
pub fn decode_component(encoded: &str) -> Cow<'_, str> {
    percent_decode_str(encoded).decode_utf8_lossy()
}
