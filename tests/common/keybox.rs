//! Keybox image builder.
//!
//! Produces blob images with the on-disk layout: 20-byte fixed part, key
//! table, serial number, user-ID table, then the user-ID strings and the
//! certificate. Images are padded to the 40-byte minimum header size.

use std::io::Write;

use tempfile::NamedTempFile;

pub const BLOB_TYPE_EMPTY: u8 = 0;
pub const BLOB_TYPE_OPENPGP: u8 = 2;
pub const BLOB_TYPE_X509: u8 = 3;

#[derive(Debug, Clone)]
pub struct BlobBuilder {
    blob_type: u8,
    key_count: u16,
    key_info_len: u16,
    serial: Vec<u8>,
    user_ids: Vec<Option<Vec<u8>>>,
    uid_info_len: u16,
    certificate: Vec<u8>,
}

impl BlobBuilder {
    pub fn new(blob_type: u8) -> Self {
        Self {
            blob_type,
            key_count: 1,
            key_info_len: 28,
            serial: Vec::new(),
            user_ids: Vec::new(),
            uid_info_len: 12,
            certificate: Vec::new(),
        }
    }

    /// X.509 blob with issuer and subject user IDs.
    pub fn x509(issuer: &str, subject: &str) -> Self {
        Self::new(BLOB_TYPE_X509)
            .user_id(Some(issuer))
            .user_id(Some(subject))
    }

    pub fn serial(mut self, serial: &[u8]) -> Self {
        self.serial = serial.to_vec();
        self
    }

    /// Append a user ID; `None` stores a zero length (absent).
    pub fn user_id(mut self, name: Option<&str>) -> Self {
        self.user_ids.push(name.map(|n| n.as_bytes().to_vec()));
        self
    }

    pub fn uid_info_len(mut self, len: u16) -> Self {
        self.uid_info_len = len;
        self
    }

    pub fn key_info(mut self, count: u16, len: u16) -> Self {
        self.key_count = count;
        self.key_info_len = len;
        self
    }

    pub fn certificate(mut self, der: &[u8]) -> Self {
        self.certificate = der.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = vec![0u8; 20];
        image[4] = self.blob_type;
        image[5] = 1;
        image[16..18].copy_from_slice(&self.key_count.to_be_bytes());
        image[18..20].copy_from_slice(&self.key_info_len.to_be_bytes());
        image.resize(
            image.len() + usize::from(self.key_count) * usize::from(self.key_info_len),
            0,
        );

        image.extend_from_slice(&u16::try_from(self.serial.len()).unwrap().to_be_bytes());
        image.extend_from_slice(&self.serial);

        let nuids = u16::try_from(self.user_ids.len()).unwrap();
        image.extend_from_slice(&nuids.to_be_bytes());
        image.extend_from_slice(&self.uid_info_len.to_be_bytes());
        let table = image.len();
        image.resize(table + self.user_ids.len() * usize::from(self.uid_info_len), 0);
        if image.len() < 40 {
            image.resize(40, 0);
        }

        for (i, uid) in self.user_ids.iter().enumerate() {
            let (off, len) = match uid {
                Some(name) => {
                    let off = image.len();
                    image.extend_from_slice(name);
                    image.push(0);
                    (off, name.len() + 1)
                }
                None => (0, 0),
            };
            let entry = table + i * usize::from(self.uid_info_len);
            // a stride below 8 cannot hold the entry at all
            if usize::from(self.uid_info_len) >= 8 {
                image[entry..entry + 4].copy_from_slice(&be32(off));
                image[entry + 4..entry + 8].copy_from_slice(&be32(len));
            }
        }

        let cert_off = image.len();
        image.extend_from_slice(&self.certificate);
        image[8..12].copy_from_slice(&be32(cert_off));
        image[12..16].copy_from_slice(&be32(self.certificate.len()));

        let total = image.len();
        image[..4].copy_from_slice(&be32(total));
        image
    }
}

fn be32(value: usize) -> [u8; 4] {
    u32::try_from(value).unwrap().to_be_bytes()
}

/// Bare image of `len` bytes with only the length prefix and type set.
pub fn raw_image(blob_type: u8, len: usize) -> Vec<u8> {
    let mut image = vec![0u8; len];
    image[..4].copy_from_slice(&be32(len));
    image[4] = blob_type;
    image
}

/// Write the images back to back into a temporary keybox file.
pub fn keybox_file(images: &[Vec<u8>]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Should create temp file");
    for image in images {
        file.write_all(image).expect("Should write blob");
    }
    file.flush().expect("Should flush keybox");
    file
}
