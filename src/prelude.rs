//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use did_uri::prelude::*;
//!
//! let url = DidUrl::parse("did:example:123456#key-1").unwrap();
//! assert_eq!(url.fragment(), b"key-1");
//! ```

pub use crate::{
    // Core types
    Did, DidUrl, QueryParams,
    // Resolution contract
    DocumentMetadata, Resolution, Resolver,
    // Errors
    ResolveError, SyntaxError, VersionParamError,
    // Free-standing comparators
    equal, url_equal,
    // Constants
    DOWNLOAD_MAX_DEFAULT,
};
