//! Keybox blob layout decoding.
//!
//! All multi-byte integers are big-endian and are read through `get16`/`get32`,
//! which return `None` instead of reading past the end of the image. Offsets
//! are combined with checked arithmetic so hostile length fields cannot wrap.

use std::ops::Range;

use super::{BlobError, BlobType};
use crate::domain::types::SerialNumber;

/// Size of the fixed blob header. Shorter blobs are never interpreted.
pub const BLOB_HEADER_LEN: usize = 40;

/// Smallest valid key-info record.
pub const MIN_KEYINFO_LEN: usize = 28;

/// Smallest valid user-ID record (offset, length, flags, validity).
pub const MIN_UIDINFO_LEN: usize = 12;

/// User-ID slot holding the issuer DN of an X.509 blob.
pub const ISSUER_UID_INDEX: usize = 0;

/// User-ID slot holding the subject DN of an X.509 blob.
pub const SUBJECT_UID_INDEX: usize = 1;

const TYPE_OFFSET: usize = 4;
const VERSION_OFFSET: usize = 5;
const FLAGS_OFFSET: usize = 6;
const CERT_OFFSET_OFFSET: usize = 8;
const CERT_LENGTH_OFFSET: usize = 12;
const NKEYS_OFFSET: usize = 16;
const KEYINFOLEN_OFFSET: usize = 18;
const KEY_TABLE_OFFSET: usize = 20;

fn get16(buffer: &[u8], pos: usize) -> Option<usize> {
    let end = pos.checked_add(2)?;
    let bytes: [u8; 2] = buffer.get(pos..end)?.try_into().ok()?;
    Some(u16::from_be_bytes(bytes) as usize)
}

fn get32(buffer: &[u8], pos: usize) -> Option<usize> {
    let end = pos.checked_add(4)?;
    let bytes: [u8; 4] = buffer.get(pos..end)?.try_into().ok()?;
    usize::try_from(u32::from_be_bytes(bytes)).ok()
}

fn require_header(image: &[u8]) -> Result<(), BlobError> {
    if image.len() < BLOB_HEADER_LEN {
        return Err(BlobError::TooShort {
            length: image.len(),
        });
    }
    Ok(())
}

/// Return the type code stored at offset 4.
pub fn blob_type(image: &[u8]) -> Result<BlobType, BlobError> {
    require_header(image)?;
    Ok(BlobType::from_code(image[TYPE_OFFSET]))
}

/// Byte range of the embedded certificate (offset/length at bytes 8 and 12).
pub fn certificate_range(image: &[u8]) -> Result<Range<usize>, BlobError> {
    require_header(image)?;
    let offset = get32(image, CERT_OFFSET_OFFSET).unwrap_or(usize::MAX);
    let cert_length = get32(image, CERT_LENGTH_OFFSET).unwrap_or(usize::MAX);
    match offset.checked_add(cert_length) {
        Some(end) if end <= image.len() => Ok(offset..end),
        _ => Err(BlobError::CertificateOutOfBounds {
            offset,
            cert_length,
            blob_length: image.len(),
        }),
    }
}

/// Position of the serial-number length field, i.e. just past the key table.
///
/// `None` if the header is missing, `keyinfolen < 28`, or the length field
/// would not fit in the image.
fn serial_table_pos(image: &[u8]) -> Option<usize> {
    if image.len() < BLOB_HEADER_LEN {
        return None;
    }
    let nkeys = get16(image, NKEYS_OFFSET)?;
    let keyinfolen = get16(image, KEYINFOLEN_OFFSET)?;
    if keyinfolen < MIN_KEYINFO_LEN {
        return None;
    }
    let pos = keyinfolen
        .checked_mul(nkeys)?
        .checked_add(KEY_TABLE_OFFSET)?;
    if pos.checked_add(2)? > image.len() {
        return None;
    }
    Some(pos)
}

/// Stored serial-number bytes, bounds checked.
pub fn serial_bytes(image: &[u8]) -> Option<&[u8]> {
    let pos = serial_table_pos(image)?;
    let nserial = get16(image, pos)?;
    let off = pos + 2;
    image.get(off..off.checked_add(nserial)?)
}

/// True iff the blob's serial number equals `serial` byte for byte.
pub fn match_serial(image: &[u8], serial: &SerialNumber) -> bool {
    serial_bytes(image).is_some_and(|stored| stored == serial.as_bytes())
}

/// Start of the user-ID table plus `(nuids, uidinfolen)`, after validating
/// the stride and that the whole table lies inside the image.
fn user_id_table(image: &[u8]) -> Option<(usize, usize, usize)> {
    let pos = serial_table_pos(image)?;
    let nserial = get16(image, pos)?;
    let pos = pos.checked_add(2)?.checked_add(nserial)?;
    if pos.checked_add(4)? > image.len() {
        return None;
    }
    let nuids = get16(image, pos)?;
    let uidinfolen = get16(image, pos + 2)?;
    let pos = pos + 4;
    if uidinfolen < MIN_UIDINFO_LEN {
        return None;
    }
    if pos.checked_add(uidinfolen.checked_mul(nuids)?)? > image.len() {
        return None;
    }
    Some((pos, nuids, uidinfolen))
}

/// Number of user-ID records, if the table is well formed.
pub fn user_id_count(image: &[u8]) -> Option<usize> {
    user_id_table(image).map(|(_, nuids, _)| nuids)
}

/// Name bytes of user ID `index`.
///
/// The stored length is the name length plus one. A stored length below two
/// leaves no name bytes, so the user ID is treated as absent and yields
/// `None`; an empty name never matches.
pub fn user_id(image: &[u8], index: usize) -> Option<&[u8]> {
    let (table, nuids, uidinfolen) = user_id_table(image)?;
    if index >= nuids {
        return None;
    }
    let pos = table.checked_add(index.checked_mul(uidinfolen)?)?;
    let off = get32(image, pos)?;
    let len = get32(image, pos.checked_add(4)?)?;
    if off.checked_add(len)? > image.len() {
        return None;
    }
    if len < 2 {
        return None;
    }
    image.get(off..off + len - 1)
}

/// True iff user ID `index` is present and equals `name` exactly.
pub fn match_user_id(image: &[u8], index: usize, name: &[u8]) -> bool {
    user_id(image, index).is_some_and(|stored| stored == name)
}

/// Raw header fields, decoded without interpretation.
pub(super) struct RawHeader {
    pub blob_type: u8,
    pub version: u8,
    pub flags: u16,
    pub key_count: usize,
    pub key_info_len: usize,
}

pub(super) fn raw_header(image: &[u8]) -> Result<RawHeader, BlobError> {
    require_header(image)?;
    Ok(RawHeader {
        blob_type: image[TYPE_OFFSET],
        version: image[VERSION_OFFSET],
        flags: u16::from_be_bytes([image[FLAGS_OFFSET], image[FLAGS_OFFSET + 1]]),
        key_count: get16(image, NKEYS_OFFSET).unwrap_or_default(),
        key_info_len: get16(image, KEYINFOLEN_OFFSET).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal X.509 blob: no keys beyond one 28-byte key-info record,
    /// serial `01 02 03`, user IDs "CA-A" (issuer) and "subject".
    fn sample_image() -> Vec<u8> {
        let mut image = vec![0u8; 20];
        image[4] = 3;
        image[5] = 1;
        image[16..18].copy_from_slice(&1u16.to_be_bytes());
        image[18..20].copy_from_slice(&28u16.to_be_bytes());
        image.extend_from_slice(&[0u8; 28]);
        image.extend_from_slice(&3u16.to_be_bytes());
        image.extend_from_slice(&[1, 2, 3]);
        image.extend_from_slice(&2u16.to_be_bytes());
        image.extend_from_slice(&12u16.to_be_bytes());
        let table_pos = image.len();
        image.extend_from_slice(&[0u8; 24]);
        let issuer_off = image.len();
        image.extend_from_slice(b"CA-A\0");
        let subject_off = image.len();
        image.extend_from_slice(b"subject\0");
        let entries = [(issuer_off, 5u32), (subject_off, 8u32)];
        for (i, (off, len)) in entries.iter().enumerate() {
            let p = table_pos + i * 12;
            image[p..p + 4].copy_from_slice(&u32::try_from(*off).unwrap().to_be_bytes());
            image[p + 4..p + 8].copy_from_slice(&len.to_be_bytes());
        }
        let total = u32::try_from(image.len()).unwrap();
        image[0..4].copy_from_slice(&total.to_be_bytes());
        image
    }

    #[test]
    fn test_get16_get32_bounds() {
        let buf = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(get16(&buf, 0), Some(0x1234));
        assert_eq!(get16(&buf, 3), None);
        assert_eq!(get32(&buf, 0), Some(0x1234_5678));
        assert_eq!(get32(&buf, 1), None);
        assert_eq!(get16(&buf, usize::MAX), None);
    }

    #[test]
    fn test_blob_type_requires_header() {
        assert_eq!(
            blob_type(&[0u8; 39]),
            Err(BlobError::TooShort { length: 39 })
        );
        assert_eq!(blob_type(&sample_image()), Ok(BlobType::X509));
    }

    #[test]
    fn test_user_ids() {
        let image = sample_image();
        assert_eq!(user_id_count(&image), Some(2));
        assert_eq!(user_id(&image, ISSUER_UID_INDEX), Some(&b"CA-A"[..]));
        assert_eq!(user_id(&image, SUBJECT_UID_INDEX), Some(&b"subject"[..]));
        assert!(match_user_id(&image, 0, b"CA-A"));
        assert!(!match_user_id(&image, 0, b"CA-"));
        assert!(!match_user_id(&image, 0, b"ca-a"));
        assert!(!match_user_id(&image, 2, b"CA-A"));
    }

    #[test]
    fn test_one_byte_user_id_is_absent() {
        let mut image = sample_image();
        // shrink the issuer entry to just its terminator
        let table_pos = image.len() - 5 - 8 - 24;
        image[table_pos + 4..table_pos + 8].copy_from_slice(&1u32.to_be_bytes());
        assert_eq!(user_id(&image, ISSUER_UID_INDEX), None);
        assert!(!match_user_id(&image, ISSUER_UID_INDEX, b""));
        assert_eq!(user_id(&image, SUBJECT_UID_INDEX), Some(&b"subject"[..]));
    }

    #[test]
    fn test_serial() {
        let image = sample_image();
        assert_eq!(serial_bytes(&image), Some(&[1u8, 2, 3][..]));
        assert!(match_serial(&image, &SerialNumber::new(vec![1, 2, 3])));
        assert!(!match_serial(&image, &SerialNumber::new(vec![1, 2])));
        assert!(!match_serial(&image, &SerialNumber::new(vec![1, 2, 3, 4])));
    }

    #[test]
    fn test_key_info_stride_too_small() {
        let mut image = sample_image();
        image[18..20].copy_from_slice(&27u16.to_be_bytes());
        assert!(serial_bytes(&image).is_none());
        assert!(!match_user_id(&image, 0, b"CA-A"));
    }

    #[test]
    fn test_key_count_overflowing_image() {
        let mut image = sample_image();
        image[16..18].copy_from_slice(&u16::MAX.to_be_bytes());
        image[18..20].copy_from_slice(&u16::MAX.to_be_bytes());
        assert!(serial_bytes(&image).is_none());
        assert!(user_id(&image, 0).is_none());
    }

    #[test]
    fn test_certificate_range_checks_bounds() {
        let mut image = sample_image();
        image[8..12].copy_from_slice(&20u32.to_be_bytes());
        image[12..16].copy_from_slice(&10u32.to_be_bytes());
        assert_eq!(certificate_range(&image), Ok(20..30));

        image[12..16].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            certificate_range(&image),
            Err(BlobError::CertificateOutOfBounds { .. })
        ));
    }
}
