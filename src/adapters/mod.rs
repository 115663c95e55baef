//! Adapter layer modules for external system integration.
//!
//! Provides adapters for:
//! - Sequential reading of keybox files from disk
//! - `x509-cert` certificates exposed through the certificate object contract

pub mod blob_reader;
pub mod x509;

pub use blob_reader::{BlobReader, DEFAULT_MAX_BLOB_SIZE};
pub use x509::{decode_certificate, load_certificate};
