//! DID parsing, normalized comparison, and canonical serialization.

use std::fmt;
use std::str::FromStr;

use crate::char_class::{is_id_char, is_method_char};
use crate::error::SyntaxError;
use crate::hex::{decode_hex_pair, parse_hex, HEX_TABLE};

/// URI scheme selection.
pub(crate) const PREFIX: &str = "did:";

/// Both variable attributes of a Decentralized IDentifier.
///
/// # Examples
///
/// ```
/// use did_uri::Did;
///
/// let did = Did::parse("did:example:escaped%F0%9F%A4%96").unwrap();
/// assert_eq!(did.method, "example");
/// assert_eq!(did.spec_id, "escaped🤖".as_bytes());
/// assert_eq!(did.canonical(), "did:example:escaped%F0%9F%A4%96");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Did {
    /// Method identifies the DID scheme in use. The name MUST consist of
    /// one or more letters `a`–`z` and/or digits `0`–`9` exclusively. Any
    /// return from [`Did::parse`] is guaranteed to be valid.
    pub method: String,

    /// The method-specific identifier, percent-decoded, with one or more
    /// octets. None of the applicable standards put any constraints on the
    /// byte content, so the field may or may not hold valid UTF-8.
    pub spec_id: Vec<u8>,
}

impl Did {
    /// Validates `s` in full. It returns the mapping if, and only if `s`
    /// conforms to the DID syntax specification.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError`] on a missing or wrong scheme, an empty
    /// method name, an illegal character in the method or method-specific
    /// identifier, a trailing colon, or a truncated percent-encoding.
    pub fn parse(s: &str) -> Result<Self, SyntaxError> {
        if !s.starts_with(PREFIX) {
            return Err(scheme_error(s));
        }

        let method_end = read_method_name(s)?;
        let method = &s[PREFIX.len()..method_end];
        let spec_start = method_end + 1;

        let bytes = s.as_bytes();
        if spec_start >= bytes.len() {
            return Err(SyntaxError::at(s, spec_start));
        }

        // No-escape fast pass over the method-specific identifier. The
        // identifier must match: *( *idchar ":" ) 1*idchar
        let mut i = spec_start;
        loop {
            if i >= bytes.len() {
                return Ok(Self {
                    method: method.to_string(),
                    spec_id: bytes[spec_start..].to_vec(),
                });
            }
            match bytes[i] {
                b':' if i == bytes.len() - 1 => return Err(SyntaxError::at(s, i)),
                b'%' => break,
                b if is_id_char(b) || b == b':' => i += 1,
                _ => return Err(SyntaxError::at(s, i)),
            }
        }

        // Decoding pass; every 3-byte escape produces 1 byte.
        let mut spec_id = Vec::with_capacity(bytes.len() - spec_start);
        spec_id.extend_from_slice(&bytes[spec_start..i]);
        while i < bytes.len() {
            match bytes[i] {
                b':' if i == bytes.len() - 1 => return Err(SyntaxError::at(s, i)),
                b'%' => {
                    spec_id.push(parse_hex(s, i + 1)?);
                    i += 3;
                }
                b if is_id_char(b) || b == b':' => {
                    spec_id.push(b);
                    i += 1;
                }
                _ => return Err(SyntaxError::at(s, i)),
            }
        }

        Ok(Self {
            method: method.to_string(),
            spec_id,
        })
    }

    /// Returns whether both `self` and `other` are valid, and whether they
    /// are equivalent according to the "Normalization and Comparison" rules
    /// of RFC 3986, section 6.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        if self.method.is_empty() || self.spec_id.is_empty() {
            return false;
        }
        if !self.method.bytes().all(is_method_char) {
            return false;
        }
        *self == *other
    }

    /// Returns whether `s` conforms to the DID syntax, and whether the
    /// reference is equivalent according to [`Did::equivalent`].
    ///
    /// The comparison re-walks `s` directly; no decoded form of `s` is
    /// materialized.
    #[must_use]
    pub fn equivalent_str(&self, s: &str) -> bool {
        if !s.starts_with(PREFIX) {
            return false;
        }
        let Ok(method_end) = read_method_name(s) else {
            return false;
        };
        if s[PREFIX.len()..method_end] != self.method {
            return false;
        }
        if self.spec_id.is_empty() {
            return false;
        }

        let bytes = s.as_bytes();
        let mut i = method_end + 1;
        for (j, &c) in self.spec_id.iter().enumerate() {
            if i >= bytes.len() {
                return false;
            }
            match bytes[i] {
                b':' => {
                    // colon not allowed as last character
                    if c != b':' || j == self.spec_id.len() - 1 {
                        return false;
                    }
                    i += 1;
                }
                b'%' => match decode_hex_pair(bytes, i + 1) {
                    Some(v) if v == c => i += 3,
                    _ => return false,
                },
                b if is_id_char(b) => {
                    if b != c {
                        return false;
                    }
                    i += 1;
                }
                _ => return false,
            }
        }
        i >= bytes.len() // compared all
    }

    /// Returns either the URI, or the empty string when zero. Any and all
    /// colon characters (`:`) in the method-specific identifier are escaped
    /// (with `%3A`). The return is invalid if any of the attributes
    /// (`method` or `spec_id`) are invalid.
    #[must_use]
    pub fn canonical(&self) -> String {
        if self.method.is_empty() && self.spec_id.is_empty() {
            return String::new();
        }

        let escape_n = self.spec_id.iter().filter(|&&b| !is_id_char(b)).count();
        let mut s = String::with_capacity(
            PREFIX.len() + self.method.len() + 1 + self.spec_id.len() + 2 * escape_n,
        );
        s.push_str(PREFIX);
        s.push_str(&self.method);
        s.push(':');

        if escape_n == 0 {
            // the identifier is pure idchar, hence pure ASCII
            for &b in &self.spec_id {
                s.push(b as char);
            }
            return s;
        }

        for &b in &self.spec_id {
            if is_id_char(b) {
                s.push(b as char);
            } else {
                s.push('%');
                s.push(HEX_TABLE[(b >> 4) as usize] as char);
                s.push(HEX_TABLE[(b & 15) as usize] as char);
            }
        }
        s
    }
}

/// Returns whether both `s1` and `s2` conform to the DID syntax, and
/// whether they are equivalent according to the "Normalization and
/// Comparison" rules of RFC 3986, section 6.
#[must_use]
pub fn equal(s1: &str, s2: &str) -> bool {
    Did::parse(s1).map_or(false, |d| d.equivalent_str(s2))
}

/// Locates the method separator, returning the byte offset of the `:` that
/// terminates a non-empty method name.
pub(crate) fn read_method_name(s: &str) -> Result<usize, SyntaxError> {
    let bytes = s.as_bytes();
    for (i, &b) in bytes.iter().enumerate().skip(PREFIX.len()) {
        if is_method_char(b) {
            continue;
        }
        if b == b':' {
            // one or more characters required
            if i == PREFIX.len() {
                return Err(SyntaxError::at(s, PREFIX.len()));
            }
            return Ok(i);
        }
        return Err(SyntaxError::at(s, i));
    }
    // separator ':' not found
    Err(SyntaxError::at(s, s.len()))
}

/// Diagnoses an input that lacks the `did:` prefix. A colon before any
/// other delimiter marks a foreign scheme; otherwise the report points at
/// the first byte diverging from the prefix.
fn scheme_error(s: &str) -> SyntaxError {
    let bytes = s.as_bytes();
    if let Some(i) = bytes
        .iter()
        .position(|&b| matches!(b, b':' | b'/' | b'?' | b'#'))
    {
        if bytes[i] == b':' {
            return SyntaxError::at(s, i);
        }
    }
    let i = PREFIX
        .bytes()
        .zip(bytes.iter().copied())
        .position(|(p, b)| p != b)
        .unwrap_or(bytes.len());
    SyntaxError::at(s, i)
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for Did {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Did {
    type Error = SyntaxError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Did {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.canonical())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Did {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s)
            .map_err(|e| serde::de::Error::custom(format!("JSON string content: {e}")))
    }
}
