//! Parser, comparator, and canonical serializer for Decentralized
//! IDentifiers.
//!
//! This crate implements the W3C DID syntax together with the RFC 3986
//! generic URI rules it inherits: strict byte-by-byte validation, equality
//! under percent-encoding normalization, and canonical re-encoding with
//! uppercase hex and minimal escaping.
//!
//! # Overview
//!
//! A DID names a subject through a method and a method-specific
//! identifier:
//!
//! ```text
//! did:<method>:<method-specific-id>[/path][?query][#fragment]
//! ```
//!
//! [`Did`] covers the bare identifier; [`DidUrl`] adds the path, query,
//! and fragment components used to address a resource in or near a DID
//! document.
//!
//! # Quick Start
//!
//! ```rust
//! use did_uri::{Did, DidUrl};
//!
//! // Parse a DID; the method-specific identifier is stored decoded.
//! let did = Did::parse("did:example:escaped%F0%9F%A4%96").unwrap();
//! assert_eq!(did.method, "example");
//! assert_eq!(did.spec_id, "escaped🤖".as_bytes());
//! assert_eq!(did.canonical(), "did:example:escaped%F0%9F%A4%96");
//!
//! // Equality follows RFC 3986 §6 normalization.
//! assert!(did_uri::equal("did:a:b:c", "did:a:b%3Ac"));
//!
//! // DID URLs carry their extra components raw, with decoding sugar.
//! let url = DidUrl::parse("did:example:123456/path%2Fesc?versionId=1").unwrap();
//! assert_eq!(url.raw_path, "/path%2Fesc");
//! assert_eq!(url.path_with_escape(b'\\'), b"/path\\/esc");
//! assert_eq!(url.query_params().get("versionId"), Some("1"));
//! ```
//!
//! # Design
//!
//! Parsing is a single pass over the input bytes with 256-entry
//! character-class tables. The method-specific identifier takes a
//! no-escape fast pass and switches to a decoding pass on the first `%`,
//! so the common case performs no intermediate allocation. The comparison
//! routines walk raw components directly and never materialize decoded
//! forms.
//!
//! All values are plain data: nothing in the crate is stateful or
//! concurrent, and any function may be called from multiple threads
//! without synchronization.
//!
//! # Feature Flags
//!
//! - `serde`: [`Did`] and [`DidUrl`] serialize to and deserialize from
//!   their canonical string form.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod char_class;
mod did;
mod error;
mod hex;
mod params;
pub mod prelude;
mod resolver;
mod url;

pub use did::{equal, Did};
pub use error::SyntaxError;
pub use params::{QueryParams, VersionParamError};
pub use resolver::{
    DocumentMetadata, Resolution, ResolveError, Resolver, DOWNLOAD_MAX_DEFAULT,
};
pub use url::{url_equal, DidUrl};
