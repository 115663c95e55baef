//! Certificate object contract consumed by signature checking.
//!
//! The verifier never walks certificate ASN.1 itself. It asks the certificate
//! which signature algorithm it claims, lets it feed the covered bytes into a
//! digest context, and reads back the signature value and public key.

use der::asn1::ObjectIdentifier;
use sha2::digest::DynDigest;

use crate::infra::error::KeyboxResult;

/// Which bytes a certificate feeds into a digest context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScope {
    /// The complete DER encoding; used for fingerprints.
    WholeCertificate,
    /// The `tbsCertificate` part covered by the issuer's signature.
    SignedPortion,
}

pub trait CertificateObject {
    /// OID of the `signatureAlgorithm` the certificate was signed with.
    fn signature_algorithm(&self) -> ObjectIdentifier;

    /// Feed the bytes selected by `scope` into `context`.
    ///
    /// Errors are reported as `KeyboxError::HashFailed`.
    fn hash(&self, scope: HashScope, context: &mut dyn DynDigest) -> KeyboxResult<()>;

    /// Raw signature octets.
    ///
    /// Errors are reported as `KeyboxError::BadSignatureEncoding`.
    fn signature_value(&self) -> KeyboxResult<Vec<u8>>;

    /// DER `SubjectPublicKeyInfo` of the certified key.
    ///
    /// Errors are reported as `KeyboxError::BadKeyEncoding`.
    fn public_key_der(&self) -> KeyboxResult<Vec<u8>>;
}
