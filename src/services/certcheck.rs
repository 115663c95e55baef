//! Certificate signature checking.
//!
//! Checks only the cryptographic signature of a certificate against its
//! issuer's RSA key: the subject's signed portion is hashed, wrapped into a
//! PKCS#1 v1.5 frame as wide as the issuer's modulus, and compared with the
//! signature raised to the public exponent. Chain building, validity periods,
//! revocation and policy are the caller's business.

use std::cmp::Ordering;

use openssl::bn::{BigNum, BigNumContext, BigNumRef};
use openssl::pkey::{PKey, Public};
use openssl::rsa::Rsa;

use crate::domain::certificate::{CertificateObject, HashScope};
use crate::domain::crypto::{encode_digest_frame, DigestBytes, HashAlgorithm, SignatureValue};
use crate::infra::error::{KeyboxError, KeyboxResult};

/// Verify that `issuer`'s key produced the signature on `subject`.
///
/// Returns `Err(KeyboxError::BadSignature)` when the signature simply does
/// not verify; every other error means the inputs or the crypto library
/// could not be used.
pub fn verify_signature<I, S>(issuer: &I, subject: &S) -> KeyboxResult<()>
where
    I: CertificateObject + ?Sized,
    S: CertificateObject + ?Sized,
{
    let oid = subject.signature_algorithm();
    let algo = HashAlgorithm::from_signature_oid(&oid).ok_or_else(|| {
        KeyboxError::DigestOpenFailed(format!("unsupported signature algorithm {oid}"))
    })?;

    let digest = compute_digest(subject, HashScope::SignedPortion, algo)?;
    log::debug!("certificate digest ({algo}): {}", hex::encode(digest.as_slice()));

    let signature = SignatureValue::new(subject.signature_value()?)?;
    log::debug!("signature: {}", hex::encode(signature.as_slice()));

    let key_der = issuer.public_key_der()?;
    log::debug!("issuer public key: {}", hex::encode(&key_der));

    let result = verify_digest(&digest, &signature, &key_der);
    match &result {
        Ok(()) => log::debug!("signature verification: good"),
        Err(e) => log::debug!("signature verification: {e}"),
    }
    result
}

/// Verify a raw RSA signature over an already computed digest.
///
/// `public_key_der` is a DER `SubjectPublicKeyInfo` holding an RSA key.
pub fn verify_digest(
    digest: &DigestBytes,
    signature: &SignatureValue,
    public_key_der: &[u8],
) -> KeyboxResult<()> {
    let rsa = parse_rsa_public_key(public_key_der)?;
    let nbits = usize::try_from(rsa.n().num_bits())
        .map_err(|_| KeyboxError::BadKeyEncoding("negative modulus size".to_string()))?;

    let frame = encode_digest_frame(digest, nbits)?;
    let frame = BigNum::from_slice(&frame)?;

    verify_frame(signature, &frame, &rsa)
}

/// Hash the bytes of `cert` selected by `scope`.
pub fn compute_digest<C>(cert: &C, scope: HashScope, algo: HashAlgorithm) -> KeyboxResult<DigestBytes>
where
    C: CertificateObject + ?Sized,
{
    let mut context = algo.new_context();
    cert.hash(scope, context.as_mut())?;
    Ok(DigestBytes::finalize(algo, context)?)
}

/// Fingerprint over the complete certificate encoding.
pub fn certificate_fingerprint<C>(cert: &C, algo: HashAlgorithm) -> KeyboxResult<DigestBytes>
where
    C: CertificateObject + ?Sized,
{
    compute_digest(cert, HashScope::WholeCertificate, algo)
}

fn parse_rsa_public_key(der: &[u8]) -> KeyboxResult<Rsa<Public>> {
    let pkey = PKey::public_key_from_der(der)
        .map_err(|e| KeyboxError::BadKeyEncoding(format!("Failed to parse public key: {e}")))?;
    pkey.rsa()
        .map_err(|_| KeyboxError::BadKeyEncoding("issuer key is not an RSA key".to_string()))
}

/// RSA verification primitive: `signature^e mod n == frame`.
fn verify_frame(
    signature: &SignatureValue,
    frame: &BigNumRef,
    rsa: &Rsa<Public>,
) -> KeyboxResult<()> {
    let s = BigNum::from_slice(signature.as_slice())?;
    if s.ucmp(rsa.n()) != Ordering::Less {
        return Err(KeyboxError::BadSignature);
    }

    let mut ctx = BigNumContext::new()?;
    let mut recovered = BigNum::new()?;
    recovered.mod_exp(&s, rsa.e(), rsa.n(), &mut ctx)?;

    if recovered.ucmp(frame) == Ordering::Equal {
        Ok(())
    } else {
        Err(KeyboxError::BadSignature)
    }
}
