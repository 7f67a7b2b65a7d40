//! DID URL parsing, normalized comparison, and path/query/fragment sugar.

use std::fmt;
use std::str::FromStr;

use crate::char_class::{is_path_char, is_query_char, is_unreserved};
use crate::did::{Did, PREFIX};
use crate::error::SyntaxError;
use crate::hex::{decode_hex_pair, parse_hex, HEX_TABLE};
use crate::params::QueryParams;

/// Extends the syntax of a basic DID with the standard URI components path,
/// query, and fragment in order to locate a particular resource — for
/// example, a cryptographic public key inside a DID document, or a resource
/// external to the DID document.
///
/// # Examples
///
/// ```
/// use did_uri::DidUrl;
///
/// let url = DidUrl::parse("did:example:123456/path?versionId=1#key-1").unwrap();
/// assert_eq!(url.did.method, "example");
/// assert_eq!(url.raw_path, "/path");
/// assert_eq!(url.raw_query, "?versionId=1");
/// assert_eq!(url.raw_fragment, "#key-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DidUrl {
    /// The DID part; zero when the URL [is relative](DidUrl::is_relative).
    pub did: Did,

    /// The path is an optional URI component. Its raw (as in unmodified)
    /// string may contain any number of percent-encoded octets. A relative
    /// DID URL may have a rootless path, one not starting with a slash
    /// (`/`) character.
    pub raw_path: String,

    /// The query is an optional URI component. Its raw (as in unmodified)
    /// string may contain any number of percent-encoded octets. The first
    /// character is a question mark (`?`) if present.
    pub raw_query: String,

    /// The fragment is an optional URI component. Its raw (as in
    /// unmodified) string may contain any number of percent-encoded octets.
    /// The first character is a number sign (`#`) if present.
    pub raw_fragment: String,
}

impl DidUrl {
    /// Validates `s` in full, as either an absolute DID URL or a relative
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError`] when the DID part is malformed, when a path,
    /// query or fragment byte falls outside its character class, when a
    /// percent-encoding is truncated or not hex, or when the first segment
    /// of a relative-path reference contains a colon.
    pub fn parse(s: &str) -> Result<Self, SyntaxError> {
        if s.is_empty() {
            return Err(SyntaxError::at("", 0));
        }

        let bytes = s.as_bytes();
        let mut url = Self::default();
        let mut i = 0usize;

        if s.starts_with(PREFIX) {
            match bytes.iter().position(|&b| matches!(b, b'/' | b'?' | b'#')) {
                None => {
                    url.did = Did::parse(s)?;
                    return Ok(url);
                }
                Some(delim) => {
                    // keep the full input in the report
                    url.did = Did::parse(&s[..delim]).map_err(|mut e| {
                        e.input = s.to_string();
                        e
                    })?;
                    i = delim;
                }
            }
        } else {
            // Relative references need an additional check. "A path segment
            // that contains a colon character (e.g., "this:that") cannot be
            // used as the first segment of a relative-path reference, as it
            // would be mistaken for a scheme name." — RFC 3986 §4.2
            for (j, &b) in bytes.iter().enumerate() {
                match b {
                    b':' => return Err(SyntaxError::at(s, j)),
                    b'/' | b'?' | b'#' => break,
                    _ => {}
                }
            }
        }

        // "Path", RFC 3986 §3.3
        let offset = i;
        loop {
            if i >= bytes.len() {
                url.raw_path = s[offset..].to_string();
                return Ok(url);
            }
            match bytes[i] {
                b'%' => {
                    parse_hex(s, i + 1)?;
                    i += 3;
                }
                b'?' | b'#' => {
                    url.raw_path = s[offset..i].to_string();
                    break;
                }
                b if is_path_char(b) => i += 1,
                _ => return Err(SyntaxError::at(s, i)),
            }
        }

        // "Query", RFC 3986 §3.4
        if bytes[i] == b'?' {
            let q_start = i;
            i += 1;
            loop {
                if i >= bytes.len() {
                    url.raw_query = s[q_start..].to_string();
                    return Ok(url);
                }
                match bytes[i] {
                    b'%' => {
                        parse_hex(s, i + 1)?;
                        i += 3;
                    }
                    b'#' => {
                        url.raw_query = s[q_start..i].to_string();
                        break;
                    }
                    b if is_query_char(b) => i += 1,
                    _ => return Err(SyntaxError::at(s, i)),
                }
            }
        }

        // "Fragment", RFC 3986 §3.5
        let f_start = i;
        i += 1;
        while i < bytes.len() {
            match bytes[i] {
                b'%' => {
                    parse_hex(s, i + 1)?;
                    i += 3;
                }
                b if is_query_char(b) => i += 1,
                _ => return Err(SyntaxError::at(s, i)),
            }
        }
        url.raw_fragment = s[f_start..].to_string();
        Ok(url)
    }

    /// Returns whether the URL is a relative URI reference.
    ///
    /// "A relative DID URL is any URL value in a DID document that does not
    /// start with `did:<method-name>:<method-specific-id>`. [...] The URL
    /// is expected to reference a resource in the same DID document."
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.did.method.is_empty() && self.did.spec_id.is_empty()
    }

    /// Returns whether both `self` and `other` are valid, and whether they
    /// are equivalent according to the "Normalization and Comparison" rules
    /// of RFC 3986, section 6. Relative references never compare equal.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        // "Normalization should not remove delimiters when their associated
        // component is empty unless licensed to do so by the scheme
        // specification." — RFC 3986 §6.2.3
        !other.is_relative()
            && other.did.equivalent(&self.did)
            && escaped_with_lead_equal(&other.raw_fragment, &self.raw_fragment, b'#')
            && escaped_with_lead_equal(&other.raw_query, &self.raw_query, b'?')
            && path_equal(&other.raw_path, &self.raw_path)
    }

    /// Returns whether `s` conforms to the DID URL syntax, and whether the
    /// reference is equivalent according to [`DidUrl::equivalent`].
    #[must_use]
    pub fn equivalent_str(&self, s: &str) -> bool {
        Self::parse(s).map_or(false, |o| self.equivalent(&o))
    }

    /// Returns either the DID URL, or the empty string when zero. Any and
    /// all colon characters (`:`) in the method-specific identifier are
    /// escaped (with `%3A`). The return is invalid if any of the attributes
    /// are invalid.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut s = self.did.canonical();
        s.reserve(self.raw_path.len() + self.raw_query.len() + self.raw_fragment.len());
        s.push_str(&self.raw_path);
        s.push_str(&self.raw_query);
        s.push_str(&self.raw_fragment);
        s
    }

    /// Decodes the raw path into a human-visible form where `escape` marks
    /// the octets that would otherwise be ambiguous: a `%2F` escape becomes
    /// `<escape>/` to keep it distinguishable from a literal separator, and
    /// the escape byte itself doubles. Malformed percent-encodings simply
    /// pass as is.
    #[must_use]
    pub fn path_with_escape(&self, escape: u8) -> Vec<u8> {
        let s = self.raw_path.as_bytes();
        let mut i = 0;
        while i < s.len() {
            if s[i] == escape || s[i] == b'%' {
                break;
            }
            i += 1;
        }
        if i >= s.len() {
            return s.to_vec(); // fast path
        }

        let mut out = Vec::with_capacity(s.len() + 2);
        out.extend_from_slice(&s[..i]);
        while i < s.len() {
            match s[i] {
                b'%' => match decode_hex_pair(s, i + 1) {
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                    Some(c) => {
                        match c {
                            _ if c == escape => out.extend_from_slice(&[escape, escape]),
                            b'/' => out.extend_from_slice(&[escape, b'/']),
                            _ => out.push(c),
                        }
                        i += 3;
                    }
                },
                c if c == escape => {
                    out.extend_from_slice(&[escape, escape]);
                    i += 1;
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }
        out
    }

    /// Returns the decoded path segments: `None` without a path, and an
    /// empty vector for the root path `/`. A trailing slash is dropped;
    /// empty segments in between are preserved. Decoding is on best-effort
    /// basis, so the segments may or may not hold valid UTF-8.
    #[must_use]
    pub fn path_segments(&self) -> Option<Vec<Vec<u8>>> {
        if self.raw_path.is_empty() {
            return None;
        }

        let s = self
            .raw_path
            .strip_prefix('/')
            .unwrap_or(&self.raw_path)
            .as_bytes();
        let mut segs = Vec::with_capacity(s.iter().filter(|&&b| b == b'/').count() + 1);

        let mut rest = s;
        while let Some(i) = rest.iter().position(|&b| b == b'/') {
            segs.push(best_effort_decode(&rest[..i]));
            rest = &rest[i + 1..];
        }
        if !rest.is_empty() {
            segs.push(best_effort_decode(rest));
        }
        Some(segs)
    }

    /// Replaces the raw path with the given segments, percent-encoded with
    /// uppercase hex. An empty iterator clears the path. The round-trip
    /// through [`DidUrl::path_segments`] is lossless for any byte content,
    /// because separators embedded in a segment encode as `%2F`.
    ///
    /// ```
    /// use did_uri::DidUrl;
    ///
    /// let mut url = DidUrl::default();
    /// url.set_path_segments(["plain", "and/or", "escaped ✨"]);
    /// assert_eq!(url.raw_path, "/plain/and%2For/escaped%20%E2%9C%A8");
    /// ```
    pub fn set_path_segments<I, S>(&mut self, segs: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut raw = String::new();
        let mut last_empty = false;
        for seg in segs {
            let seg = seg.as_ref();
            raw.push('/');
            encode_path_segment(seg, &mut raw);
            last_empty = seg.is_empty();
        }
        if last_empty {
            raw.push('/');
        }
        self.raw_path = raw;
    }

    /// Returns the decoded value from the raw query, if any. Decoding is on
    /// best-effort basis: malformed percent-encodings simply pass as is.
    ///
    /// None of the applicable standards put any constraints on the byte
    /// content. The return may or may not be a valid UTF-8 string.
    #[must_use]
    pub fn query(&self) -> Vec<u8> {
        match self.raw_query.as_bytes() {
            [b'?', rest @ ..] => best_effort_decode(rest),
            _ => Vec::new(),
        }
    }

    /// Sets the raw query to a normalized encoding of `s`, which may or may
    /// not be a valid UTF-8 string.
    pub fn set_query(&mut self, s: &[u8]) {
        self.raw_query = encode_with_lead(s, '?');
    }

    /// Returns the decoded value from the raw fragment, if any, on the same
    /// best-effort basis as [`DidUrl::query`].
    #[must_use]
    pub fn fragment(&self) -> Vec<u8> {
        match self.raw_fragment.as_bytes() {
            [b'#', rest @ ..] => best_effort_decode(rest),
            _ => Vec::new(),
        }
    }

    /// Sets the raw fragment to a normalized encoding of `s`.
    pub fn set_fragment(&mut self, s: &[u8]) {
        self.raw_fragment = encode_with_lead(s, '#');
    }

    /// Parses the raw query into an `application/x-www-form-urlencoded`
    /// style parameter map.
    #[must_use]
    pub fn query_params(&self) -> QueryParams {
        match self.raw_query.strip_prefix('?') {
            Some(rest) => QueryParams::parse(rest),
            None => QueryParams::new(),
        }
    }

    /// Replaces the raw query with the encoding of `params`; an empty map
    /// clears the query.
    pub fn set_query_params(&mut self, params: &QueryParams) {
        if params.is_empty() {
            self.raw_query = String::new();
        } else {
            self.raw_query = format!("?{params}");
        }
    }
}

/// Returns whether both `s1` and `s2` conform to the DID URL syntax, and
/// whether they are equivalent according to [`DidUrl::equivalent`].
#[must_use]
pub fn url_equal(s1: &str, s2: &str) -> bool {
    DidUrl::parse(s1).map_or(false, |u| u.equivalent_str(s2))
}

impl fmt::Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for DidUrl {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for DidUrl {
    type Error = SyntaxError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DidUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.canonical())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DidUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s)
            .map_err(|e| serde::de::Error::custom(format!("JSON string content: {e}")))
    }
}

/// Decodes the next octet of a raw component against `class`, advancing
/// `i`. The second value tells whether the octet arrived percent-encoded.
/// `None` on an illegal byte or a broken escape.
fn next_octet(s: &[u8], i: &mut usize, class: fn(u8) -> bool) -> Option<(u8, bool)> {
    match s[*i] {
        b'%' => {
            let v = decode_hex_pair(s, *i + 1)?;
            *i += 3;
            Some((v, true))
        }
        b if class(b) => {
            *i += 1;
            Some((b, false))
        }
        _ => None,
    }
}

/// Returns whether `a` and `b` both have `lead` as their first character,
/// if non-empty, and whether their remainders represent the same octet
/// sequence. Invalid encodings never compare equal.
fn escaped_with_lead_equal(a: &str, b: &str, lead: u8) -> bool {
    if a == b {
        return true; // fast path
    }
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.is_empty() || b.is_empty() {
        return false; // one empty, the other not
    }
    if a[0] != lead || b[0] != lead {
        return false; // invalid prefix in a raw field
    }

    let (mut ai, mut bi) = (1, 1);
    loop {
        if ai >= a.len() {
            return bi >= b.len();
        }
        if bi >= b.len() {
            return false;
        }
        let Some((ac, _)) = next_octet(a, &mut ai, is_query_char) else {
            return false;
        };
        let Some((bc, _)) = next_octet(b, &mut bi, is_query_char) else {
            return false;
        };
        if ac != bc {
            return false; // payload mismatch
        }
    }
}

/// Returns whether `a` and `b` represent the same path when normalized.
/// Invalid encodings never compare equal.
fn path_equal(a: &str, b: &str) -> bool {
    if a == b {
        return true; // fast path
    }
    if a.is_empty() || b.is_empty() {
        return false; // one empty, the other not
    }
    let a = remove_dot_segments(a);
    let b = remove_dot_segments(b);

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut ai, mut bi) = (0, 0);
    loop {
        if ai >= a.len() {
            return bi >= b.len();
        }
        if bi >= b.len() {
            return false;
        }
        let Some((ac, a_esc)) = next_octet(a, &mut ai, is_path_char) else {
            return false;
        };
        let Some((bc, b_esc)) = next_octet(b, &mut bi, is_path_char) else {
            return false;
        };
        // an escaped slash is payload, not a separator
        if ac != bc || (ac == b'/' && a_esc != b_esc) {
            return false; // path mismatch
        }
    }
}

/// Removes dot segments per RFC 3986 §5.2.4, on a `/`-rooted form with the
/// root stripped back off. Prepending the root forces the absolute branch
/// for rootless paths too; generic URL code is avoided on purpose, as it
/// tends to decode or re-encode along the way.
fn remove_dot_segments(path: &str) -> String {
    let mut rooted = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        rooted.push('/');
    }
    rooted.push_str(path);

    let mut input = rooted.as_str();
    let mut output = String::with_capacity(input.len());
    while !input.is_empty() {
        if input == "/." {
            input = "/";
        } else if input == "/.." {
            input = "/";
            truncate_last_segment(&mut output);
        } else if input.starts_with("/./") {
            input = &input[2..];
        } else if input.starts_with("/../") {
            input = &input[3..];
            truncate_last_segment(&mut output);
        } else {
            // move the leading slash and its segment over to the output
            let end = input[1..].find('/').map_or(input.len(), |i| i + 1);
            output.push_str(&input[..end]);
            input = &input[end..];
        }
    }
    output.remove(0); // the artificial root
    output
}

fn truncate_last_segment(output: &mut String) {
    let end = output.rfind('/').unwrap_or(0);
    output.truncate(end);
}

/// Malformed percent-encodings simply pass as is.
fn best_effort_decode(s: &[u8]) -> Vec<u8> {
    let Some(first) = s.iter().position(|&b| b == b'%') else {
        return s.to_vec(); // fast path
    };

    let mut out = Vec::with_capacity(s.len());
    out.extend_from_slice(&s[..first]);
    let mut i = first;
    while i < s.len() {
        if s[i] == b'%' {
            if let Some(v) = decode_hex_pair(s, i + 1) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(s[i]);
        i += 1;
    }
    out
}

fn encode_path_segment(seg: &[u8], out: &mut String) {
    for &b in seg {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX_TABLE[(b >> 4) as usize] as char);
            out.push(HEX_TABLE[(b & 15) as usize] as char);
        }
    }
}

/// Returns `s` prefixed by `lead`, percent-encoded where needed.
fn encode_with_lead(s: &[u8], lead: char) -> String {
    let mut out = String::with_capacity(1 + s.len());
    out.push(lead);
    for &b in s {
        if is_query_char(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX_TABLE[(b >> 4) as usize] as char);
            out.push(HEX_TABLE[(b & 15) as usize] as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(method: &str, spec_id: &[u8], path: &str, query: &str, fragment: &str) -> DidUrl {
        DidUrl {
            did: Did {
                method: method.to_string(),
                spec_id: spec_id.to_vec(),
            },
            raw_path: path.to_string(),
            raw_query: query.to_string(),
            raw_fragment: fragment.to_string(),
        }
    }

    fn relative(path: &str, query: &str, fragment: &str) -> DidUrl {
        url("", b"", path, query, fragment)
    }

    // the W3C DID core examples, among others
    fn golden_urls() -> Vec<(&'static str, DidUrl)> {
        vec![
            (
                "did:example:123456789abcdefghi",
                url("example", b"123456789abcdefghi", "", "", ""),
            ),
            ("did:example:123456/path", url("example", b"123456", "/path", "", "")),
            (
                "did:example:123456?versionId=1",
                url("example", b"123456", "", "?versionId=1", ""),
            ),
            (
                "did:example:123#public-key-0",
                url("example", b"123", "", "", "#public-key-0"),
            ),
            ("did:example:123#agent", url("example", b"123", "", "", "#agent")),
            (
                "did:example:123?service=agent&relativeRef=/credentials#degree",
                url(
                    "example",
                    b"123",
                    "",
                    "?service=agent&relativeRef=/credentials",
                    "#degree",
                ),
            ),
            (
                "did:example:123?versionTime=2021-05-10T17:00:00Z",
                url("example", b"123", "", "?versionTime=2021-05-10T17:00:00Z", ""),
            ),
            (
                "did:example:123?service=files&relativeRef=/resume.pdf",
                url("example", b"123", "", "?service=files&relativeRef=/resume.pdf", ""),
            ),
            ("did:foo:bar:baz", url("foo", b"bar:baz", "", "", "")),
            ("?", relative("", "?", "")),
            ("#", relative("", "", "#")),
            ("?#", relative("", "?", "#")),
            (".", relative(".", "", "")),
            ("./", relative("./", "", "")),
            ("./..", relative("./..", "", "")),
            ("./../", relative("./../", "", "")),
            ("./../...", relative("./../...", "", "")),
            (".#", relative(".", "", "#")),
            ("./#", relative("./", "", "#")),
            ("./..#", relative("./..", "", "#")),
            ("./../#", relative("./../", "", "#")),
            ("./../...#", relative("./../...", "", "#")),
            (".?", relative(".", "?", "")),
            ("./?", relative("./", "?", "")),
            ("./..?", relative("./..", "?", "")),
            ("./../?", relative("./../", "?", "")),
            ("./../...?", relative("./../...", "?", "")),
            ("did", relative("did", "", "")),
            ("did/", relative("did/", "", "")),
            ("did/a", relative("did/a", "", "")),
            ("/did:a", relative("/did:a", "", "")),
            ("/did:a/", relative("/did:a/", "", "")),
            ("/did:a/did", relative("/did:a/did", "", "")),
            ("?foo=bar", relative("", "?foo=bar", "")),
            ("#foo", relative("", "", "#foo")),
            ("%BE?%DE#%AD", relative("%BE", "?%DE", "#%AD")),
        ]
    }

    #[test]
    fn parse_golden_urls() {
        for (s, want) in golden_urls() {
            let got = DidUrl::parse(s).unwrap_or_else(|e| panic!("{s} got error: {e}"));
            assert_eq!(got, want, "{s}");
        }
    }

    #[test]
    fn parse_golden_url_errors() {
        let golden = [
            ("", "empty DID string"),
            ("did:foo:bar/%", "invalid DID \"did:foo:bar/%\": end incomplete"),
            ("did:foo:bar?%", "invalid DID \"did:foo:bar?%\": end incomplete"),
            ("did:foo:bar#%", "invalid DID \"did:foo:bar#%\": end incomplete"),
            (
                "did:foo:bar/%X0",
                "invalid DID \"did:foo:bar/%X0\": illegal 'X' at byte № 14",
            ),
            (
                "did:foo:bar?%X0",
                "invalid DID \"did:foo:bar?%X0\": illegal 'X' at byte № 14",
            ),
            (
                "did:foo:bar#%X0",
                "invalid DID \"did:foo:bar#%X0\": illegal 'X' at byte № 14",
            ),
            ("this:that", "invalid DID \"this:that\": no \"did:\" scheme"),
        ];
        for (s, want) in golden {
            match DidUrl::parse(s) {
                Ok(got) => panic!("{s:?} got {got:?}, want error {want:?}"),
                Err(e) => assert_eq!(e.to_string(), want, "{s:?}"),
            }
        }
    }

    #[test]
    fn parse_forwards_did_errors_with_full_input() {
        // the DID part ends at the first delimiter; the report keeps all of s
        let err = DidUrl::parse("did:foo:/path").unwrap_err();
        assert_eq!(err.input, "did:foo:/path");
        assert_eq!(err.index, Some(8));
    }

    #[test]
    fn relative_first_segment_rejects_colon() {
        let err = DidUrl::parse("this:that").unwrap_err();
        assert_eq!(err.index, Some(4));
        // a colon after the first slash is plain pchar
        assert!(DidUrl::parse("/this:that").is_ok());
        assert!(DidUrl::parse("x/this:that").is_ok());
        assert!(DidUrl::parse("x?this:that").is_ok());
        assert!(DidUrl::parse("x#this:that").is_ok());
    }

    #[test]
    fn canonical_round_trips_golden_urls() {
        assert_eq!(DidUrl::default().canonical(), "");

        for (_, gold) in golden_urls() {
            let s = gold.canonical();
            let back = DidUrl::parse(&s)
                .unwrap_or_else(|e| panic!("{gold:?} canonical {s:?}: {e}"));
            assert_eq!(back, gold, "canonical {s:?}");
        }
    }

    #[test]
    fn equivalent_str_matches_golden_urls() {
        for (s, gold) in golden_urls() {
            let got = gold.equivalent_str(s);
            assert_eq!(got, !gold.is_relative(), "{s:?}");
        }
    }

    // equivalent DID URL tails; composed with the DID equality groups below
    fn select_equals() -> Vec<Vec<&'static str>> {
        vec![
            vec![
                "/escaped%F0%9F%A4%96",
                "/%65scaped%F0%9F%A4%96",
                "/escap%65d%f0%9F%a4%96",
            ],
            vec![
                "?escaped%F0%9F%A4%96",
                "?%65scaped%F0%9F%A4%96",
                "?escap%65d%f0%9f%a4%96",
            ],
            vec![
                "#escaped%F0%9F%A4%96",
                "#%65scaped%F0%9F%A4%96",
                "#escap%65d%f0%9f%a4%96",
            ],
            vec![
                "/%ee?%aa=%bb#%ff",
                "/%eE?%aA=%bB#%fF",
                "/%Ee?%Aa=%Bb#%Ff",
                "/%EE?%AA=%BB#%FF",
            ],
        ]
    }

    fn did_equals() -> Vec<Vec<&'static str>> {
        vec![
            vec![
                "did:example:escaped%F0%9F%A4%96",
                "did:example:%65scaped%F0%9F%A4%96",
            ],
            vec!["did:tricky:%3Afoo%2F", "did:tricky:%3A%66%6F%6F%2F"],
        ]
    }

    #[test]
    fn equivalence_groups() {
        // compile equality groups from the DID and selection groups
        let mut groups: Vec<Vec<String>> = Vec::new();
        for dids in did_equals() {
            for selects in select_equals() {
                let mut equals = Vec::with_capacity(dids.len() * selects.len());
                for d in &dids {
                    for sel in &selects {
                        equals.push(format!("{d}{sel}"));
                    }
                }
                groups.push(equals);
            }
        }

        for (i, group) in groups.iter().enumerate() {
            for s in group {
                let u = DidUrl::parse(s).unwrap_or_else(|e| panic!("{s}: {e}"));
                for (j, others) in groups.iter().enumerate() {
                    let want = i == j;
                    for o in others {
                        assert_eq!(u.equivalent_str(o), want, "{s:?} vs {o:?}");
                        assert_eq!(url_equal(s, o), want, "{s:?} vs {o:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn relative_never_equals() {
        assert!(!url_equal("did:a:b", "/did:a"));
        assert!(!url_equal("/did:a", "/did:a"));
        let rel = DidUrl::parse("/did:a").unwrap();
        assert!(!rel.equivalent(&rel));
    }

    #[test]
    fn path_equal_normalizes_dot_segments() {
        assert!(url_equal("did:a:b/x/./y", "did:a:b/x/y"));
        assert!(url_equal("did:a:b/x/../y", "did:a:b/y"));
        assert!(url_equal("did:a:b/x", "did:a:b/%78"));
        assert!(!url_equal("did:a:b/x/y", "did:a:b/x%2Fy"));
        assert!(!url_equal("did:a:b/x//y", "did:a:b/x/y"));
        assert!(!url_equal("did:a:b/x/", "did:a:b/x"));
    }

    #[test]
    fn query_and_fragment_keep_their_delimiters() {
        assert!(!url_equal("did:a:b?", "did:a:b"));
        assert!(!url_equal("did:a:b#", "did:a:b"));
        assert!(url_equal("did:a:b?", "did:a:b?"));
        assert!(!url_equal("did:a:b?x", "did:a:b#x"));
    }

    #[test]
    fn remove_dot_segments_table() {
        let tests = [
            ("", ""),
            ("/", ""),
            ("x", "x"),
            ("/x", "x"),
            ("/x/./y", "x/y"),
            ("/x/../y", "y"),
            ("/a/b/c/./../../g", "a/g"),
            ("mid/content=5/../6", "mid/6"),
            ("/..", ""),
            ("/../..", ""),
            ("/a/..", ""),
            ("/a/../", ""),
            ("/a//b", "a//b"),
            ("/a/b/", "a/b/"),
            ("/.", ""),
            ("./x", "x"),
        ];
        for (path, want) in tests {
            assert_eq!(remove_dot_segments(path), want, "{path:?}");
        }
    }

    #[test]
    fn path_with_escape_table() {
        let tests: [(u8, &str, &[u8]); 25] = [
            (b'\\', "", b""),
            (b'\\', "/", b"/"),
            (b'\\', "//", b"//"),
            (b'\\', "/foo", b"/foo"),
            (b'\\', "/f%6Fo", b"/foo"),
            (b'\\', "%66%6F%6F", b"foo"),
            // percent-encoded path separator
            (b'\\', "%2F", b"\\/"),
            (b'\\', "%a2", b"\xa2"),
            (b'\\', "%2F%2F", b"\\/\\/"),
            (b'\\', "%fF%Ff", b"\xff\xff"),
            (b'\\', "%2Ffoo", b"\\/foo"),
            (b'\\', "/foo%2F", b"/foo\\/"),
            (b'\\', "%2F%66%6F%6F%2F", b"\\/foo\\/"),
            (b'%', "%2F", b"%/"),
            (b'%', "%a2", b"\xa2"),
            (b'%', "%2F%2F", b"%/%/"),
            (b'%', "%2Ffoo", b"%/foo"),
            (b'%', "/foo%2F", b"/foo%/"),
            // percent-encoded escape
            (b'\\', "%5C", b"\\\\"),
            (b'\\', "/%5C", b"/\\\\"),
            (b'\\', "%5C/", b"\\\\/"),
            (b'%', "%25", b"%%"),
            (b'%', "/%25", b"/%%"),
            // broken encodings
            (b'\\', "/mis1%1", b"/mis1%1"),
            (b'%', "/mi%ss", b"/mi%ss"),
        ];
        for (escape, raw, want) in tests {
            let u = relative(raw, "", "");
            assert_eq!(
                u.path_with_escape(escape),
                want,
                "raw path {raw:?} with escape {:?}",
                escape as char,
            );
        }
    }

    #[test]
    fn path_segments_table() {
        let tests: [(&str, Option<Vec<&[u8]>>); 10] = [
            ("", None),
            ("/", Some(vec![])),
            ("//", Some(vec![b""])),
            ("/a", Some(vec![b"a"])),
            ("/a/", Some(vec![b"a"])),
            ("/a//", Some(vec![b"a", b""])),
            ("//b/", Some(vec![b"", b"b"])),
            ("///", Some(vec![b"", b""])),
            ("/%AB/%ba/", Some(vec![b"\xab", b"\xba"])),
            ("/%cD/%Dc/", Some(vec![b"\xcd", b"\xdc"])),
        ];
        for (raw, want) in tests {
            let got = relative(raw, "", "").path_segments();
            let want: Option<Vec<Vec<u8>>> =
                want.map(|segs| segs.into_iter().map(<[u8]>::to_vec).collect());
            assert_eq!(got, want, "raw path {raw:?}");
        }
    }

    #[test]
    fn path_segment_round_trip() {
        let cases: [&[&[u8]]; 6] = [
            &[b"plain", b"and/or", b"escaped \xE2\x9C\xA8"],
            &[b""],
            &[b"", b""],
            &[b"a", b""],
            &[b"", b"b"],
            &[b"%2F", b"%"],
        ];
        for segs in cases {
            let mut u = DidUrl::default();
            u.set_path_segments(segs.iter().copied());
            let got = u.path_segments().unwrap();
            assert_eq!(got, segs, "raw path {:?}", u.raw_path);
        }

        let mut u = relative("/stale", "", "");
        u.set_path_segments::<_, &[u8]>([]);
        assert_eq!(u.raw_path, "");
        assert_eq!(u.path_segments(), None);
    }

    #[test]
    fn set_path_segments_escapes_separators() {
        let mut u = DidUrl::default();
        u.set_path_segments(["plain", "and/or", "escaped ✨"]);
        assert_eq!(u.raw_path, "/plain/and%2For/escaped%20%E2%9C%A8");
        let segs = u.path_segments().unwrap();
        assert_eq!(segs[1], b"and/or");
    }

    #[test]
    fn query_and_fragment_accessors() {
        let u = relative("", "?a%20b", "#c%2Fd");
        assert_eq!(u.query(), b"a b");
        assert_eq!(u.fragment(), b"c/d");

        // absent or malformed prefixes read as empty
        assert_eq!(relative("", "", "").query(), b"");
        assert_eq!(relative("", "a", "b").query(), b"");
        assert_eq!(relative("", "a", "b").fragment(), b"");

        let mut u = DidUrl::default();
        u.set_query(b"a b");
        assert_eq!(u.raw_query, "?a%20b");
        u.set_fragment(b"c#d");
        assert_eq!(u.raw_fragment, "#c%23d");
        assert_eq!(u.query(), b"a b");
        assert_eq!(u.fragment(), b"c#d");
    }

    #[test]
    fn query_params_round_trip() {
        let u = DidUrl::parse("did:example:123456?versionId=1&x=a%20b").unwrap();
        let params = u.query_params();
        assert_eq!(params.get("versionId"), Some("1"));
        assert_eq!(params.get("x"), Some("a b"));

        let mut back = DidUrl::parse("did:example:123456").unwrap();
        back.set_query_params(&params);
        assert_eq!(back.query_params(), params);

        back.set_query_params(&QueryParams::new());
        assert_eq!(back.raw_query, "");
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn round_trips_canonical_json_string() {
        let u = DidUrl::parse("did:example:123456/path?versionId=1#key-1").unwrap();
        let json = serde_json::to_string(&u).unwrap();
        assert_eq!(json, "\"did:example:123456/path?versionId=1#key-1\"");
        let back: DidUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, u);
    }

    #[test]
    fn deserialize_error_carries_content_prefix() {
        let err = serde_json::from_str::<DidUrl>("\"this:that\"").unwrap_err();
        assert!(err.to_string().contains("JSON string content:"), "{err}");
    }
}
