//! `x509-cert` backed implementation of the certificate object contract.

use der::asn1::ObjectIdentifier;
use der::{Decode, DecodePem, Encode};
use sha2::digest::DynDigest;
use x509_cert::Certificate;

use crate::domain::certificate::{CertificateObject, HashScope};
use crate::infra::error::{KeyboxError, KeyboxResult};

impl CertificateObject for Certificate {
    fn signature_algorithm(&self) -> ObjectIdentifier {
        self.signature_algorithm.oid
    }

    fn hash(&self, scope: HashScope, context: &mut dyn DynDigest) -> KeyboxResult<()> {
        let der = match scope {
            HashScope::WholeCertificate => self.to_der(),
            HashScope::SignedPortion => self.tbs_certificate.to_der(),
        }
        .map_err(|e| KeyboxError::HashFailed(format!("Failed to encode certificate: {e}")))?;
        context.update(&der);
        Ok(())
    }

    fn signature_value(&self) -> KeyboxResult<Vec<u8>> {
        let bytes = self.signature.as_bytes().ok_or_else(|| {
            KeyboxError::BadSignatureEncoding(
                "signature BIT STRING has unused bits".to_string(),
            )
        })?;
        if bytes.is_empty() {
            return Err(KeyboxError::BadSignatureEncoding(
                "empty signature value".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }

    fn public_key_der(&self) -> KeyboxResult<Vec<u8>> {
        self.tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| KeyboxError::BadKeyEncoding(e.to_string()))
    }
}

/// Decode a DER certificate.
pub fn decode_certificate(der: &[u8]) -> KeyboxResult<Certificate> {
    Certificate::from_der(der)
        .map_err(|e| KeyboxError::Asn1Error(format!("Failed to decode certificate: {e}")))
}

/// Decode a PEM or DER certificate, trying PEM first.
pub fn load_certificate(data: &[u8]) -> KeyboxResult<Certificate> {
    if let Ok(pem_str) = std::str::from_utf8(data) {
        if let Ok(cert) = Certificate::from_pem(pem_str) {
            return Ok(cert);
        }
    }
    decode_certificate(data)
}
