//! Syntax error shared by the DID and DID URL parsers.

use std::error::Error;
use std::fmt;
use std::fmt::Write as _;

/// Denies a DID string on a validation constraint.
///
/// All diagnostics derive from the two fields; the textual form is stable
/// and test-visible.
///
/// # Examples
///
/// ```
/// use did_uri::Did;
///
/// let err = Did::parse("did:foo:bar:").unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "invalid DID \"did:foo:bar:\": illegal ':' at byte № 12",
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// The original input as provided to the parser.
    pub input: String,
    /// Byte offset of the first illegal byte in `input`. An offset at or
    /// past the input length signals an unexpected end of input. `None`
    /// means the location is unknown, which should not happen in practice.
    pub index: Option<usize>,
}

impl SyntaxError {
    pub(crate) fn at(input: &str, index: usize) -> Self {
        Self {
            input: input.to_string(),
            index: Some(index),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.input.is_empty() {
            return f.write_str("empty DID string");
        }

        f.write_str("invalid DID \"")?;
        if self.input.len() <= 200 {
            f.write_str(&self.input)?;
            f.write_str("\": ")?;
        } else {
            let mut end = 199;
            while !self.input.is_char_boundary(end) {
                end -= 1;
            }
            f.write_str(&self.input[..end])?;
            f.write_str("…\" [truncated]: ")?;
        }

        match self.index {
            None => f.write_str("reason unknown"),
            Some(i) if i >= self.input.len() => f.write_str("end incomplete"),
            Some(i) => {
                let c = self.input.as_bytes()[i];
                if c == b':' && !self.input.starts_with("did:") {
                    return f.write_str("no \"did:\" scheme");
                }
                f.write_str("illegal '")?;
                for esc in std::ascii::escape_default(c) {
                    f.write_char(esc as char)?;
                }
                write!(f, "' at byte № {}", i + 1)
            }
        }
    }
}

impl Error for SyntaxError {}
