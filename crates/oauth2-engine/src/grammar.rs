//! RFC 6749 appendix A character-class predicates.
//!
//! Pure functions over `&str`; every predicate rejects the empty string.

use std::sync::LazyLock;

use regex::Regex;

/// VSCHAR: any printable ASCII character (%x20-7E).
static VSCHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x20-\x7E]+$").expect("static regex"));

/// NCHAR: ALPHA / DIGIT / "-" / "." / "_" (grant-type and response-type names).
static NCHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-._0-9A-Za-z]+$").expect("static regex"));

/// NQCHAR: %x21 / %x23-5B / %x5D-7E (scope tokens).
static NQCHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x21\x23-\x5B\x5D-\x7E]+$").expect("static regex"));

/// NQSCHAR: %x20-21 / %x23-5B / %x5D-7E (space-delimited scope strings).
static NQSCHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x20-\x21\x23-\x5B\x5D-\x7E]+$").expect("static regex"));

/// UNICODECHARNOCRLF: any Unicode character except CR and LF (credentials).
static UCHAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x09\x20-\x7E\u{80}-\u{D7FF}\u{E000}-\u{FFFD}\u{10000}-\u{10FFFF}]+$")
        .expect("static regex")
});

/// Absolute URI (scheme ":" hier-part), used for extension grant types.
static URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:\S+$").expect("static regex"));

/// Validate a VSCHAR+ value (codes, tokens, client credentials, state).
#[must_use]
pub fn is_vschar(value: &str) -> bool {
    VSCHAR.is_match(value)
}

/// Validate a short name (built-in grant types, response types).
#[must_use]
pub fn is_nchar(value: &str) -> bool {
    NCHAR.is_match(value)
}

/// Validate a single scope token.
#[must_use]
pub fn is_nqchar(value: &str) -> bool {
    NQCHAR.is_match(value)
}

/// Validate a space-delimited scope string.
#[must_use]
pub fn is_nqschar(value: &str) -> bool {
    NQSCHAR.is_match(value)
}

/// Validate a Unicode credential (usernames, passwords).
#[must_use]
pub fn is_uchar(value: &str) -> bool {
    UCHAR.is_match(value)
}

/// Validate an absolute URI (extension grant-type identifiers).
#[must_use]
pub fn is_uri(value: &str) -> bool {
    URI.is_match(value)
}
