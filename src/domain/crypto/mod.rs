//! Foundational cryptographic domain types.
//!
//! Provides strongly-typed wrappers for the artifacts of certificate
//! signature checking:
//! - Hash algorithms with their PKCS#1 `DigestInfo` prefixes and RSA OIDs
//! - Finalized digest values with size validation
//! - Raw certificate signature values
//! - PKCS#1 v1.5 signature frame construction
//!
//! The service layer combines these with OpenSSL big-number arithmetic to
//! verify signatures.

mod digest_bytes;
mod frame;
mod hash;
mod signature;

pub use digest_bytes::{DigestBytes, DigestBytesError};
pub use frame::encode_digest_frame;
pub use hash::HashAlgorithm;
pub use signature::SignatureValue;
