//! Keybox Certificate Check Library
//!
//! Reads keybox files (the blob store used by GnuPG), finds X.509
//! certificates by issuer, issuer and serial number or subject, and checks
//! the RSA signature of a certificate against its issuer's public key.

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;


// Re-export the infrastructure modules at the crate root
pub use infra::{config, error};

pub use adapters::{load_certificate, BlobReader};
pub use domain::blob::{Blob, BlobHeader, BlobType};
pub use domain::certificate::{CertificateObject, HashScope};
pub use domain::crypto::{DigestBytes, HashAlgorithm};
pub use domain::search::{SearchDescriptor, SearchMode};
pub use domain::types::SerialNumber;
pub use error::{KeyboxError, KeyboxResult};
pub use services::{verify_signature, KeyboxHandle, SearchOutcome, SearchState};
