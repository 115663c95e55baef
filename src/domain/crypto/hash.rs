//! Hash algorithm domain type.
//!
//! Provides the `HashAlgorithm` enumeration for the digests used by RSA
//! certificate signatures (MD5, SHA-1 and the SHA-2 family), with the PKCS#1
//! `DigestInfo` prefix, the matching `*WithRSAEncryption` OID and a factory
//! for RustCrypto digest contexts.

use std::fmt;
use std::str::FromStr;

use der::asn1::ObjectIdentifier;
use md5::Md5;
use sha1::Sha1;
use sha2::digest::DynDigest;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::domain::constants::{
    MD5_DIGEST_INFO_PREFIX, MD5_WITH_RSA_OID, SHA1_DIGEST_INFO_PREFIX, SHA1_WITH_RSA_OID,
    SHA256_DIGEST_INFO_PREFIX, SHA256_WITH_RSA_OID, SHA384_DIGEST_INFO_PREFIX,
    SHA384_WITH_RSA_OID, SHA512_DIGEST_INFO_PREFIX, SHA512_WITH_RSA_OID,
};

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// Legacy; only accepted for verifying existing certificates.
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// DER `DigestInfo` bytes preceding the digest in a PKCS#1 v1.5 frame.
    #[must_use]
    pub fn digest_info_prefix(&self) -> &'static [u8] {
        match self {
            HashAlgorithm::Md5 => MD5_DIGEST_INFO_PREFIX,
            HashAlgorithm::Sha1 => SHA1_DIGEST_INFO_PREFIX,
            HashAlgorithm::Sha256 => SHA256_DIGEST_INFO_PREFIX,
            HashAlgorithm::Sha384 => SHA384_DIGEST_INFO_PREFIX,
            HashAlgorithm::Sha512 => SHA512_DIGEST_INFO_PREFIX,
        }
    }

    #[must_use]
    pub fn rsa_signature_oid(&self) -> ObjectIdentifier {
        match self {
            HashAlgorithm::Md5 => MD5_WITH_RSA_OID,
            HashAlgorithm::Sha1 => SHA1_WITH_RSA_OID,
            HashAlgorithm::Sha256 => SHA256_WITH_RSA_OID,
            HashAlgorithm::Sha384 => SHA384_WITH_RSA_OID,
            HashAlgorithm::Sha512 => SHA512_WITH_RSA_OID,
        }
    }

    /// Map a certificate `signatureAlgorithm` OID to its digest.
    #[must_use]
    pub fn from_signature_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.rsa_signature_oid() == *oid)
    }

    /// Fresh digest context for this algorithm.
    #[must_use]
    pub fn new_context(&self) -> Box<dyn DynDigest> {
        match self {
            HashAlgorithm::Md5 => Box::new(Md5::new()),
            HashAlgorithm::Sha1 => Box::new(Sha1::new()),
            HashAlgorithm::Sha256 => Box::new(Sha256::new()),
            HashAlgorithm::Sha384 => Box::new(Sha384::new()),
            HashAlgorithm::Sha512 => Box::new(Sha512::new()),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(format!("unsupported hash algorithm: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_algorithm_properties() {
        assert_eq!(HashAlgorithm::Sha256.as_str(), "sha256");
        assert_eq!(HashAlgorithm::Sha256.digest_size(), 32);

        assert_eq!(HashAlgorithm::Sha384.as_str(), "sha384");
        assert_eq!(HashAlgorithm::Sha384.digest_size(), 48);

        assert_eq!(HashAlgorithm::Sha512.as_str(), "sha512");
        assert_eq!(HashAlgorithm::Sha512.digest_size(), 64);

        assert_eq!(HashAlgorithm::Sha1.digest_size(), 20);
        assert_eq!(HashAlgorithm::Md5.digest_size(), 16);
    }

    #[test]
    fn test_context_output_size() {
        for algo in HashAlgorithm::ALL {
            let mut ctx = algo.new_context();
            ctx.update(b"abc");
            assert_eq!(ctx.finalize().len(), algo.digest_size());
            assert_eq!(
                algo.digest_info_prefix()[algo.digest_info_prefix().len() - 1] as usize,
                algo.digest_size()
            );
        }
    }

    #[test]
    fn test_signature_oid_mapping() {
        let oid = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
        assert_eq!(
            HashAlgorithm::from_signature_oid(&oid),
            Some(HashAlgorithm::Sha384)
        );
        let sha1 = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
        assert_eq!(
            HashAlgorithm::from_signature_oid(&sha1),
            Some(HashAlgorithm::Sha1)
        );
        let md5 = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.4");
        assert_eq!(
            HashAlgorithm::from_signature_oid(&md5),
            Some(HashAlgorithm::Md5)
        );
        // md2WithRSAEncryption is not supported
        let md2 = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.2");
        assert_eq!(HashAlgorithm::from_signature_oid(&md2), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("SHA-256".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha256));
        assert_eq!("SHA1".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha1));
        assert!("md2".parse::<HashAlgorithm>().is_err());
    }
}
