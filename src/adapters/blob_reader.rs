//! Sequential reader for keybox files.
//!
//! A keybox file is a plain concatenation of blob images. Each image starts
//! with its own 4-byte big-endian length (the length field included), so the
//! reader only needs that prefix to frame records. Anything the reader cannot
//! frame is reported as an error and ends the scan; content-level problems are
//! left to the field extractor.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

use crate::domain::blob::{Blob, BlobType};
use crate::infra::error::{KeyboxError, KeyboxResult};

/// Upper bound on a single blob image.
pub const DEFAULT_MAX_BLOB_SIZE: usize = 500_000;

/// Smallest image that still carries a type byte.
const MIN_IMAGE_LEN: usize = 5;

pub struct BlobReader<R> {
    inner: R,
    max_blob_size: usize,
    blobs_read: usize,
}

impl BlobReader<BufReader<File>> {
    /// Open a keybox file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> KeyboxResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            KeyboxError::FileOpenError(format!("{}: {e}", path.display()))
        })?;
        log::debug!("Opened keybox {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> BlobReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
            blobs_read: 0,
        }
    }

    #[must_use]
    pub fn with_max_blob_size(mut self, max_blob_size: usize) -> Self {
        self.max_blob_size = max_blob_size;
        self
    }

    /// Number of blobs handed out so far (empty blobs excluded).
    #[must_use]
    pub fn blobs_read(&self) -> usize {
        self.blobs_read
    }

    /// Read the next non-empty blob.
    ///
    /// Returns `Ok(None)` at a clean end of file. A truncated length prefix or
    /// body, an image shorter than 5 bytes or larger than the configured
    /// maximum is an error.
    pub fn read_next(&mut self) -> KeyboxResult<Option<Blob>> {
        loop {
            let mut prefix = [0u8; 4];
            match read_full(&mut self.inner, &mut prefix)? {
                0 => return Ok(None),
                4 => {}
                n => {
                    return Err(KeyboxError::ReadError(format!(
                        "truncated blob length field ({n} of 4 bytes)"
                    )))
                }
            }

            let image_len = usize::try_from(u32::from_be_bytes(prefix))
                .map_err(|_| KeyboxError::BlobTooLarge(usize::MAX))?;
            if image_len < MIN_IMAGE_LEN {
                return Err(KeyboxError::BlobTooShort(format!(
                    "declared image length {image_len}"
                )));
            }
            if image_len > self.max_blob_size {
                return Err(KeyboxError::BlobTooLarge(image_len));
            }

            let mut image = vec![0u8; image_len];
            image[..4].copy_from_slice(&prefix);
            let got = read_full(&mut self.inner, &mut image[4..])?;
            if got != image_len - 4 {
                return Err(KeyboxError::ReadError(format!(
                    "truncated blob ({} of {image_len} bytes)",
                    got + 4
                )));
            }

            if BlobType::from_code(image[4]) == BlobType::Empty {
                log::trace!("Skipping empty blob of {image_len} bytes");
                continue;
            }

            self.blobs_read += 1;
            return Ok(Some(Blob::from_image(image)));
        }
    }

    /// Release the underlying reader.
    pub fn close(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for BlobReader<R> {
    type Item = KeyboxResult<Blob>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Fill `buf` as far as the stream allows; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> KeyboxResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(read_error(&e)),
        }
    }
    Ok(filled)
}

fn read_error(error: &io::Error) -> KeyboxError {
    KeyboxError::ReadError(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn image(blob_type: u8, len: usize) -> Vec<u8> {
        let mut image = vec![0u8; len];
        image[..4].copy_from_slice(&u32::try_from(len).unwrap().to_be_bytes());
        image[4] = blob_type;
        image
    }

    #[test]
    fn test_reads_consecutive_blobs() {
        let mut data = image(3, 40);
        data.extend(image(2, 64));
        let mut reader = BlobReader::new(Cursor::new(data));

        let first = reader.read_next().unwrap().unwrap();
        assert_eq!(first.len(), 40);
        assert_eq!(first.blob_type(), Ok(BlobType::X509));
        let second = reader.read_next().unwrap().unwrap();
        assert_eq!(second.len(), 64);
        assert!(reader.read_next().unwrap().is_none());
        assert!(reader.read_next().unwrap().is_none());
        assert_eq!(reader.blobs_read(), 2);
    }

    #[test]
    fn test_skips_empty_blobs() {
        let mut data = image(0, 48);
        data.extend(image(3, 40));
        let blobs: Vec<_> = BlobReader::new(Cursor::new(data))
            .collect::<KeyboxResult<_>>()
            .unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].len(), 40);
    }

    #[test]
    fn test_truncated_length_prefix() {
        let mut reader = BlobReader::new(Cursor::new(vec![0, 0]));
        assert!(matches!(reader.read_next(), Err(KeyboxError::ReadError(_))));
    }

    #[test]
    fn test_truncated_body() {
        let mut data = image(3, 40);
        data.truncate(30);
        let mut reader = BlobReader::new(Cursor::new(data));
        assert!(matches!(reader.read_next(), Err(KeyboxError::ReadError(_))));
    }

    #[test]
    fn test_declared_length_too_short() {
        let mut reader = BlobReader::new(Cursor::new(vec![0, 0, 0, 4]));
        assert!(matches!(
            reader.read_next(),
            Err(KeyboxError::BlobTooShort(_))
        ));
    }

    #[test]
    fn test_declared_length_too_large() {
        let data = image(3, 1024);
        let mut reader = BlobReader::new(Cursor::new(data)).with_max_blob_size(512);
        assert_eq!(reader.read_next(), Err(KeyboxError::BlobTooLarge(1024)));
    }

    #[test]
    fn test_open_missing_file() {
        let err = BlobReader::open("/nonexistent/pubring.kbx").err().unwrap();
        assert!(matches!(err, KeyboxError::FileOpenError(_)));
    }
}
