//! Cache key encoding
//!
//! Turns a request identifier (normally a full URL with its query string) into
//! a string that can be used as a single filename component. Every encoding
//! here is pure and total: it never fails and always yields the same key for
//! the same input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Error returned when parsing a [`KeyEncoding`] name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key encoding '{0}', expected one of: substitute, escaped, hashed")]
pub struct UnknownEncoding(pub String);

/// Scheme used to derive a cache key from a request identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    /// `:` → `;`, `/` → `#`, `?` → `$`
    ///
    /// Produces the same filenames as existing `cache/` directories, but two
    /// identifiers that differ only in `:`/`;`, `/`/`#` or `?`/`$` share a key.
    Substitute,
    /// Percent-style escaping that also escapes `%`, so distinct identifiers
    /// always map to distinct keys.
    #[default]
    Escaped,
    /// Lowercase hex SHA-256 of the identifier. Fixed width.
    Hashed,
}

impl KeyEncoding {
    /// Encodes `request_id` with this scheme
    pub fn encode(self, request_id: &str) -> String {
        match self {
            KeyEncoding::Substitute => encode(request_id),
            KeyEncoding::Escaped => encode_escaped(request_id),
            KeyEncoding::Hashed => encode_hashed(request_id),
        }
    }

    /// Lowercase name, as accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        match self {
            KeyEncoding::Substitute => "substitute",
            KeyEncoding::Escaped => "escaped",
            KeyEncoding::Hashed => "hashed",
        }
    }
}

impl fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "substitute" => Ok(KeyEncoding::Substitute),
            "escaped" => Ok(KeyEncoding::Escaped),
            "hashed" => Ok(KeyEncoding::Hashed),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

/// Substitutes the three reserved characters, left to right.
///
/// # Example
/// ```
/// use hockeystats::cache::encode;
/// assert_eq!(encode("http://x?a:b"), "http;##x$a;b");
/// ```
pub fn encode(request_id: &str) -> String {
    request_id
        .chars()
        .map(|c| match c {
            ':' => ';',
            '/' => '#',
            '?' => '$',
            other => other,
        })
        .collect()
}

/// Returns true if `c` must be escaped by [`encode_escaped`]
fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '%' | ':' | '/' | '?' | ';' | '#' | '$' | '\\' | '*' | '"' | '<' | '>' | '|'
    ) || c.is_ascii_control()
}

/// Percent-escapes `%`, path and query punctuation, characters reserved on
/// Windows and ASCII control characters. Escapes use uppercase hex.
pub fn encode_escaped(request_id: &str) -> String {
    let mut out = String::with_capacity(request_id.len());
    for c in request_id.chars() {
        if needs_escape(c) {
            // needs_escape only admits ASCII, so one byte is enough
            out.push_str(&format!("%{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Hex-encoded SHA-256 digest of the identifier.
pub fn encode_hashed(request_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request_id.as_bytes());
    hex::encode(hasher.finalize())
}
