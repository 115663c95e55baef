use std::fmt;

use crate::infra::error::{KeyboxError, KeyboxResult};

/// Raw RSA signature octets taken from a certificate's `signatureValue`
/// BIT STRING, read as an unsigned big-endian integer.
///
/// Invariant: never empty.
#[derive(Clone, Eq, PartialEq)]
pub struct SignatureValue(Box<[u8]>);

impl SignatureValue {
    pub fn new(bytes: Vec<u8>) -> KeyboxResult<Self> {
        if bytes.is_empty() {
            return Err(KeyboxError::BadSignatureEncoding(
                "empty signature value".to_string(),
            ));
        }
        Ok(Self(bytes.into_boxed_slice()))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SignatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureValue(len={})", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_signature_rejected() {
        assert!(matches!(
            SignatureValue::new(Vec::new()),
            Err(KeyboxError::BadSignatureEncoding(_))
        ));
        assert_eq!(SignatureValue::new(vec![0, 1]).unwrap().as_slice(), &[0, 1]);
    }
}
