//! Error handling types and result definitions for keybox and certificate operations.

use thiserror::Error;

use crate::domain::blob::BlobError;
use crate::domain::crypto::DigestBytesError;
use crate::domain::search::SearchMode;

/// Result type for keybox operations
pub type KeyboxResult<T> = Result<T, KeyboxError>;

/// Comprehensive error types for keybox search and certificate checking.
///
/// The type is `Clone` so a search handle can hand out its sticky error more
/// than once.
#[derive(Error, Debug, Clone, PartialEq, Eq, miette::Diagnostic)]
pub enum KeyboxError {
    #[error("Failed to open keybox file: {0}")]
    FileOpenError(String),

    #[error("Keybox read error: {0}")]
    ReadError(String),

    #[error("Blob too short: {0}")]
    BlobTooShort(String),

    #[error("Blob too large: {0} bytes")]
    BlobTooLarge(usize),

    #[error("Nothing found")]
    NothingFound,

    #[error("Wrong blob type: {0}")]
    WrongBlobType(String),

    #[error("Search mode not implemented: {0}")]
    #[diagnostic(help("only issuer, issuer+serial, subject, first and next searches are supported"))]
    NotImplemented(SearchMode),

    #[error("ASN.1 encoding/decoding error: {0}")]
    Asn1Error(String),

    #[error("Failed to open digest context: {0}")]
    DigestOpenFailed(String),

    #[error("Failed to hash certificate: {0}")]
    HashFailed(String),

    #[error("Invalid signature encoding: {0}")]
    BadSignatureEncoding(String),

    #[error("Invalid public key encoding: {0}")]
    BadKeyEncoding(String),

    #[error("Can't encode a {digest_bits} bit digest into a {frame_bits} bit frame")]
    FrameTooSmall { digest_bits: usize, frame_bits: usize },

    #[error("Bad signature")]
    BadSignature,

    #[error("Cryptographic error: {0}")]
    CryptographicError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl KeyboxError {
    /// True for the ordinary "signature does not verify" outcome, as opposed
    /// to encoding, I/O or crypto-library failures.
    #[must_use]
    pub fn is_bad_signature(&self) -> bool {
        matches!(self, KeyboxError::BadSignature)
    }
}

impl From<BlobError> for KeyboxError {
    fn from(error: BlobError) -> Self {
        KeyboxError::BlobTooShort(error.to_string())
    }
}

impl From<DigestBytesError> for KeyboxError {
    fn from(error: DigestBytesError) -> Self {
        KeyboxError::HashFailed(error.to_string())
    }
}

impl From<der::Error> for KeyboxError {
    fn from(error: der::Error) -> Self {
        KeyboxError::Asn1Error(error.to_string())
    }
}

impl From<openssl::error::ErrorStack> for KeyboxError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        KeyboxError::CryptographicError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = KeyboxError::FileOpenError("/nonexistent: not found".to_string());
        assert_eq!(
            error.to_string(),
            "Failed to open keybox file: /nonexistent: not found"
        );

        let error = KeyboxError::FrameTooSmall {
            digest_bits: 512,
            frame_bits: 512,
        };
        assert_eq!(
            error.to_string(),
            "Can't encode a 512 bit digest into a 512 bit frame"
        );
    }

    #[test]
    fn test_bad_signature_is_distinct() {
        assert!(KeyboxError::BadSignature.is_bad_signature());
        assert!(!KeyboxError::CryptographicError("boom".into()).is_bad_signature());
        assert!(!KeyboxError::BadKeyEncoding("not rsa".into()).is_bad_signature());
    }

    #[test]
    fn test_error_conversion() {
        let err: KeyboxError = BlobError::TooShort { length: 12 }.into();
        match err {
            KeyboxError::BlobTooShort(msg) => assert!(msg.contains("12")),
            _ => panic!("Wrong error type"),
        }
    }
}
