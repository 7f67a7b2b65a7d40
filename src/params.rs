//! Query-parameter map with the standardised version selection.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::char_class::is_unreserved;
use crate::hex::{decode_hex_pair, HEX_TABLE};

/// Query parameters in `application/x-www-form-urlencoded` style.
///
/// Keys map to one or more values, ordered lexicographically for a
/// deterministic encoding.
///
/// # Examples
///
/// ```
/// use did_uri::QueryParams;
///
/// let params = QueryParams::parse("versionId=1&service=files");
/// assert_eq!(params.get("versionId"), Some("1"));
/// assert_eq!(params.to_string(), "service=files&versionId=1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a query string (without the leading `?`). Pairs split on `&`
    /// and `=`; percent-encodings decode on best-effort basis, with `+` as
    /// space. Repeated names collect in order of appearance.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for pair in input.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = match pair.split_once('=') {
                Some((name, value)) => (name, value),
                None => (pair, ""),
            };
            params
                .entry(form_decode(name))
                .or_default()
                .push(form_decode(value));
        }
        Self { params }
    }

    /// Returns the first value for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Returns all values for `name`, in order of appearance.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.params.get(name).map_or(&[], Vec::as_slice)
    }

    /// Replaces all values for `name` with the single `value`.
    pub fn set(&mut self, name: &str, value: &str) {
        self.params.insert(name.to_string(), vec![value.to_string()]);
    }

    /// Appends `value` to the values for `name`.
    pub fn add(&mut self, name: &str, value: &str) {
        self.params
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Drops `name` with all its values.
    pub fn remove(&mut self, name: &str) {
        self.params.remove(name);
    }

    /// Returns whether the map holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the number of distinct parameter names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Iterates over all name–value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Returns the standardised `versionId` and `versionTime` parameters.
    /// Either may be absent.
    ///
    /// # Errors
    ///
    /// Both parameters are at-most-single-valued; a repeat yields the
    /// matching [`VersionParamError`] duplicate kind. A `versionTime` value
    /// that does not parse as RFC 3339 yields
    /// [`VersionParamError::InvalidVersionTime`] with the cause attached.
    pub fn version_params(
        &self,
    ) -> Result<(Option<String>, Option<DateTime<Utc>>), VersionParamError> {
        let id = match self.get_all("versionId") {
            [] => None,
            [v] => Some(v.clone()),
            _ => return Err(VersionParamError::DuplicateVersionId),
        };

        let time = match self.get_all("versionTime") {
            [] => None,
            [v] => Some(
                DateTime::parse_from_rfc3339(v)
                    .map_err(VersionParamError::InvalidVersionTime)?
                    .with_timezone(&Utc),
            ),
            _ => return Err(VersionParamError::DuplicateVersionTime),
        };

        Ok((id, time))
    }

    /// Installs the standardised `versionId` and `versionTime` parameters.
    /// `None` (or an empty identifier) clears the respective parameter.
    ///
    /// The moment is normalized to UTC without sub-second precision, as
    /// required for JSON production by subsection 6.2.1 of the W3C DID v1
    /// specification.
    pub fn set_version_params(&mut self, id: Option<&str>, time: Option<DateTime<Utc>>) {
        match id {
            Some(id) if !id.is_empty() => self.set("versionId", id),
            _ => self.remove("versionId"),
        }

        match time {
            Some(t) => {
                let t = t.round_subsecs(0);
                self.set(
                    "versionTime",
                    &t.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
            }
            None => self.remove("versionTime"),
        }
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                f.write_char('&')?;
            }
            first = false;
            write_form_encoded(f, name)?;
            if !value.is_empty() {
                f.write_char('=')?;
                write_form_encoded(f, value)?;
            }
        }
        Ok(())
    }
}

fn write_form_encoded(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for b in s.bytes() {
        if is_unreserved(b) {
            f.write_char(b as char)?;
        } else if b == b' ' {
            f.write_char('+')?;
        } else {
            f.write_char('%')?;
            f.write_char(HEX_TABLE[(b >> 4) as usize] as char)?;
            f.write_char(HEX_TABLE[(b & 15) as usize] as char)?;
        }
    }
    Ok(())
}

fn form_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => match decode_hex_pair(bytes, i + 1) {
                Some(v) => {
                    out.push(v);
                    i += 3;
                }
                None => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Denies the version parameters of a DID URL.
#[derive(Debug)]
pub enum VersionParamError {
    /// More than one `versionId` parameter is present.
    DuplicateVersionId,
    /// More than one `versionTime` parameter is present.
    DuplicateVersionTime,
    /// The `versionTime` value did not parse as RFC 3339.
    InvalidVersionTime(chrono::ParseError),
}

impl fmt::Display for VersionParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateVersionId => f.write_str("duplicate versionId in DID URL"),
            Self::DuplicateVersionTime => f.write_str("duplicate versionTime in DID URL"),
            Self::InvalidVersionTime(e) => write!(f, "versionTime in DID URL: {e}"),
        }
    }
}

impl Error for VersionParamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidVersionTime(e) => Some(e),
            _ => None,
        }
    }
}
