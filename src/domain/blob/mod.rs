//! Keybox blob domain types and field extraction.
//!
//! Provides structured access to the binary records stored in a keybox file:
//! - Owned blob images with typed accessors
//! - Bounds-checked decoding of the fixed header, serial number and user-ID table
//! - Pure match predicates used by the search engine
//!
//! Every accessor is total over malformed input: structural problems surface as
//! `false`/`None` (or a `BlobError` for the header-level accessors), never as a
//! panic or an out-of-bounds read.

mod image;
pub mod layout;

pub use image::{Blob, BlobHeader, BlobType};

/// Structural errors raised by header-level blob accessors.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob too short ({length} bytes, minimum 40)")]
    TooShort { length: usize },
    #[error("certificate data out of range (offset {offset}, length {cert_length}, blob {blob_length} bytes)")]
    CertificateOutOfBounds {
        offset: usize,
        cert_length: usize,
        blob_length: usize,
    },
}
