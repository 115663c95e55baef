use std::fmt;
use std::ops::Range;

use super::layout;
use super::BlobError;
use crate::domain::types::SerialNumber;

/// Record variants distinguished by the type byte at offset 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobType {
    /// Free slot left behind by a deleted record.
    Empty,
    /// File header blob.
    First,
    OpenPgp,
    X509,
    Other(u8),
}

impl BlobType {
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => BlobType::Empty,
            1 => BlobType::First,
            2 => BlobType::OpenPgp,
            3 => BlobType::X509,
            other => BlobType::Other(other),
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            BlobType::Empty => 0,
            BlobType::First => 1,
            BlobType::OpenPgp => 2,
            BlobType::X509 => 3,
            BlobType::Other(code) => code,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BlobType::Empty => "empty",
            BlobType::First => "header",
            BlobType::OpenPgp => "openpgp",
            BlobType::X509 => "x509",
            BlobType::Other(_) => "unknown",
        }
    }
}

impl fmt::Display for BlobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobType::Other(code) => write!(f, "unknown({code})"),
            known => f.write_str(known.as_str()),
        }
    }
}

/// Decoded view of the fixed part of a blob header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHeader {
    pub blob_type: BlobType,
    pub version: u8,
    pub flags: u16,
    /// Certificate byte range, `None` when it points outside the blob.
    pub certificate: Option<Range<usize>>,
    pub key_count: usize,
    pub key_info_len: usize,
    /// `None` when the user-ID table is malformed.
    pub user_id_count: Option<usize>,
}

/// One keybox record image, including its 4-byte length prefix.
///
/// Invariant: when produced by the blob reader, the declared length at
/// offset 0 equals `len()`.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    image: Box<[u8]>,
}

impl Blob {
    /// Wrap raw image bytes. No validation is performed; every accessor is
    /// bounds checked.
    #[must_use]
    pub fn from_image(image: Vec<u8>) -> Self {
        Self {
            image: image.into_boxed_slice(),
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.image
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.image.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn blob_type(&self) -> Result<BlobType, BlobError> {
        layout::blob_type(&self.image)
    }

    pub fn header(&self) -> Result<BlobHeader, BlobError> {
        let raw = layout::raw_header(&self.image)?;
        Ok(BlobHeader {
            blob_type: BlobType::from_code(raw.blob_type),
            version: raw.version,
            flags: raw.flags,
            certificate: layout::certificate_range(&self.image).ok(),
            key_count: raw.key_count,
            key_info_len: raw.key_info_len,
            user_id_count: layout::user_id_count(&self.image),
        })
    }

    /// DER bytes of the embedded certificate.
    pub fn certificate_der(&self) -> Result<&[u8], BlobError> {
        let range = layout::certificate_range(&self.image)?;
        Ok(&self.image[range])
    }

    #[must_use]
    pub fn serial_number(&self) -> Option<&[u8]> {
        layout::serial_bytes(&self.image)
    }

    #[must_use]
    pub fn user_id(&self, index: usize) -> Option<&[u8]> {
        layout::user_id(&self.image, index)
    }

    #[must_use]
    pub fn match_serial(&self, serial: &SerialNumber) -> bool {
        layout::match_serial(&self.image, serial)
    }

    #[must_use]
    pub fn match_user_id(&self, index: usize, name: &[u8]) -> bool {
        layout::match_user_id(&self.image, index, name)
    }

    /// True for X.509 blobs whose issuer DN equals `name`.
    #[must_use]
    pub fn has_issuer(&self, name: &str) -> bool {
        self.is_x509() && self.match_user_id(layout::ISSUER_UID_INDEX, name.as_bytes())
    }

    /// True for X.509 blobs matching both serial number and issuer DN.
    #[must_use]
    pub fn has_issuer_serial(&self, name: &str, serial: &SerialNumber) -> bool {
        self.is_x509()
            && self.match_serial(serial)
            && self.match_user_id(layout::ISSUER_UID_INDEX, name.as_bytes())
    }

    /// True for X.509 blobs whose subject DN equals `name`.
    #[must_use]
    pub fn has_subject(&self, name: &str) -> bool {
        self.is_x509() && self.match_user_id(layout::SUBJECT_UID_INDEX, name.as_bytes())
    }

    fn is_x509(&self) -> bool {
        self.blob_type() == Ok(BlobType::X509)
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob(len={})", self.image.len())
    }
}
