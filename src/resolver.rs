//! Resolution contract between this crate and DID document fetchers.
//!
//! Implementations own transport and document-schema concerns. This module
//! only fixes the URL syntax they accept, the metadata they report, and the
//! error kinds their callers observe.

use std::error::Error;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::SyntaxError;
use crate::url::DidUrl;

/// Upper boundary for document byte sizes. The default of 64 KiB provides
/// good protection for most use-cases.
pub const DOWNLOAD_MAX_DEFAULT: usize = 1 << 16;

/// A retrieved DID document with its resolution metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The document payload in the negotiated representation.
    pub document: Vec<u8>,
    /// Facts recorded during retrieval.
    pub metadata: DocumentMetadata,
}

/// Facts recorded while retrieving a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentMetadata {
    /// Media type of the document representation.
    pub media_type: String,
    /// Last update moment, when the source discloses one.
    pub updated: Option<DateTime<Utc>>,
}

/// Denies a resolution request.
#[derive(Debug)]
pub enum ResolveError {
    /// The DID URL is malformed.
    Syntax(SyntaxError),
    /// No DID document exists for the identifier.
    NotFound,
    /// The document failed DID-document schema validation.
    Invalid,
    /// The source offered no acceptable content type.
    MediaType,
    /// The download hit the byte-count guard before completion.
    SizeExceeded {
        /// The boundary that was hit, in bytes.
        limit: usize,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(e) => e.fmt(f),
            Self::NotFound => f.write_str("DID document not found"),
            Self::Invalid => f.write_str("invalid DID document"),
            Self::MediaType => f.write_str("DID document media type not acceptable"),
            Self::SizeExceeded { limit } => {
                write!(f, "DID download abort on size constraints ({limit} bytes)")
            }
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Syntax(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SyntaxError> for ResolveError {
    fn from(e: SyntaxError) -> Self {
        Self::Syntax(e)
    }
}

/// Fetches the DID documents that DID URLs address.
///
/// Multiple threads may invoke `resolve` on a shared instance
/// simultaneously.
pub trait Resolver: Send + Sync {
    /// Retrieves the document addressed by `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when no document exists for the
    /// identifier, [`ResolveError::Invalid`] when the payload fails schema
    /// validation, [`ResolveError::MediaType`] when content negotiation
    /// fails, and [`ResolveError::SizeExceeded`] when the byte-count guard
    /// trips.
    fn resolve(&self, url: &DidUrl) -> Result<Resolution, ResolveError>;
}
