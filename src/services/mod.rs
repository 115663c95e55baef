//! Service layer module root.
//! Contains the keybox search engine and certificate signature checking.

pub mod certcheck;
pub mod search;

pub use certcheck::{certificate_fingerprint, compute_digest, verify_digest, verify_signature};
pub use search::{KeyboxHandle, SearchOutcome, SearchState};
