//! OpenSSL-generated RSA certificates for signature tests.

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509Name, X509NameBuilder};

/// A certificate together with the key it certifies.
pub struct TestCert {
    pub der: Vec<u8>,
    pub key: PKey<Private>,
    pub name: X509Name,
}

fn build_name(cn: &str) -> X509Name {
    let mut name = X509NameBuilder::new().expect("Should create name builder");
    name.append_entry_by_text("O", "Keybox Test")
        .expect("Should add O");
    name.append_entry_by_text("CN", cn).expect("Should add CN");
    name.build()
}

fn generate_key(bits: u32) -> PKey<Private> {
    let rsa = Rsa::generate(bits).expect("Should generate RSA key");
    PKey::from_rsa(rsa).expect("Should create PKey")
}

fn build_cert(
    subject_cn: &str,
    serial: u32,
    key: &PKey<Private>,
    issuer: Option<&TestCert>,
    digest: MessageDigest,
) -> Vec<u8> {
    let subject = build_name(subject_cn);

    let mut builder = X509Builder::new().expect("Should create X509 builder");
    builder.set_version(2).expect("Should set version");
    let serial = BigNum::from_u32(serial)
        .expect("Should create serial")
        .to_asn1_integer()
        .expect("Should convert serial");
    builder
        .set_serial_number(&serial)
        .expect("Should set serial");
    builder
        .set_subject_name(&subject)
        .expect("Should set subject");
    builder
        .set_issuer_name(issuer.map_or(&subject, |ca| &ca.name))
        .expect("Should set issuer");

    let not_before = Asn1Time::days_from_now(0).expect("Should create not_before");
    let not_after = Asn1Time::days_from_now(1).expect("Should create not_after");
    builder
        .set_not_before(&not_before)
        .expect("Should set not_before");
    builder
        .set_not_after(&not_after)
        .expect("Should set not_after");
    builder.set_pubkey(key).expect("Should set pubkey");

    let signing_key = issuer.map_or(key, |ca| &ca.key);
    builder.sign(signing_key, digest).expect("Should sign");

    builder.build().to_der().expect("Should convert to DER")
}

/// Self-signed CA certificate with a fresh RSA key.
pub fn create_ca(cn: &str, bits: u32) -> TestCert {
    let key = generate_key(bits);
    let der = build_cert(cn, 1, &key, None, MessageDigest::sha256());
    TestCert {
        der,
        key,
        name: build_name(cn),
    }
}

/// Certificate for `cn` signed by `ca` with `digest`.
pub fn create_signed(cn: &str, serial: u32, ca: &TestCert, digest: MessageDigest) -> TestCert {
    let key = generate_key(2048);
    let der = build_cert(cn, serial, &key, Some(ca), digest);
    TestCert {
        der,
        key,
        name: build_name(cn),
    }
}
