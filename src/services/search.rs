//! Keybox search service.
//!
//! A [`KeyboxHandle`] is a cursor over one keybox file. Each `search` call
//! continues reading where the previous one stopped and returns the first
//! blob accepted by the descriptor list. End of file and read errors are
//! sticky until `reset`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use x509_cert::Certificate;

use crate::adapters::blob_reader::{BlobReader, DEFAULT_MAX_BLOB_SIZE};
use crate::adapters::x509::decode_certificate;
use crate::domain::blob::{Blob, BlobType};
use crate::domain::search::{SearchDescriptor, SearchMode};
use crate::infra::config::KeyboxConfiguration;
use crate::infra::error::{KeyboxError, KeyboxResult};

/// Observable state of a search handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No file open and no result held.
    Idle,
    /// File open, cursor somewhere inside it.
    Scanning,
    /// A result is held.
    Found,
    /// End of file reached; sticky until reset.
    Exhausted,
    /// A read or open error occurred; sticky until reset.
    Failed,
}

/// Successful outcome of a search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found,
    NoMoreResults,
}

impl SearchOutcome {
    #[must_use]
    pub fn is_found(self) -> bool {
        self == SearchOutcome::Found
    }
}

/// Search cursor over one keybox file.
pub struct KeyboxHandle {
    path: PathBuf,
    max_blob_size: usize,
    reader: Option<BlobReader<BufReader<File>>>,
    found: Option<Blob>,
    error: Option<KeyboxError>,
    eof: bool,
    need_words: bool,
}

impl KeyboxHandle {
    /// Create a handle for `path`. The file is opened by the first search.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
            reader: None,
            found: None,
            error: None,
            eof: false,
            need_words: false,
        }
    }

    /// Create a handle for the configured keybox.
    #[must_use]
    pub fn from_config(config: &KeyboxConfiguration) -> Self {
        Self::new(&config.keybox_path).with_max_blob_size(config.max_blob_size)
    }

    #[must_use]
    pub fn with_max_blob_size(mut self, max_blob_size: usize) -> Self {
        self.max_blob_size = max_blob_size;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        if self.error.is_some() {
            SearchState::Failed
        } else if self.eof {
            SearchState::Exhausted
        } else if self.found.is_some() {
            SearchState::Found
        } else if self.reader.is_some() {
            SearchState::Scanning
        } else {
            SearchState::Idle
        }
    }

    /// Blob returned by the last successful search.
    #[must_use]
    pub fn found_blob(&self) -> Option<&Blob> {
        self.found.as_ref()
    }

    /// True if a previous search asked for a word index over user IDs.
    #[must_use]
    pub fn needs_words(&self) -> bool {
        self.need_words
    }

    /// Return to the start: drop the held result, close the file and clear
    /// the end-of-file and error flags.
    pub fn reset(&mut self) {
        self.found = None;
        self.reader = None;
        self.error = None;
        self.eof = false;
    }

    /// Continue the scan and stop at the first blob matched by any
    /// descriptor and not skipped by any descriptor's skip predicate.
    ///
    /// A sticky error or end of file is reported before the descriptors are
    /// looked at; only `reset` clears it. Otherwise a `First` descriptor
    /// anywhere in the list restarts the scan, and modes without an
    /// implementation are rejected before any I/O.
    pub fn search(&mut self, descriptors: &[SearchDescriptor]) -> KeyboxResult<SearchOutcome> {
        self.found = None;

        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.eof {
            return Ok(SearchOutcome::NoMoreResults);
        }

        for desc in descriptors {
            match desc.mode() {
                SearchMode::First => self.reset(),
                mode if mode.needs_words() => self.need_words = true,
                _ => {}
            }
        }

        if let Some(unsupported) = descriptors
            .iter()
            .map(SearchDescriptor::mode)
            .find(|mode| !mode.is_implemented())
        {
            log::warn!("Search mode '{unsupported}' is not implemented");
            return Err(KeyboxError::NotImplemented(unsupported.clone()));
        }

        if self.reader.is_none() {
            match BlobReader::open(&self.path) {
                Ok(reader) => {
                    self.reader = Some(reader.with_max_blob_size(self.max_blob_size));
                }
                Err(e) => {
                    log::error!("Can't open keybox: {e}");
                    self.error = Some(e.clone());
                    return Err(e);
                }
            }
        }

        let any_skip = descriptors.iter().any(SearchDescriptor::has_skip);

        loop {
            let next = match self.reader.as_mut() {
                Some(reader) => reader.read_next(),
                None => Ok(None),
            };
            let blob = match next {
                Ok(Some(blob)) => blob,
                Ok(None) => {
                    log::debug!("End of keybox {}", self.path.display());
                    self.eof = true;
                    return Ok(SearchOutcome::NoMoreResults);
                }
                Err(e) => {
                    log::error!("Error reading keybox {}: {e}", self.path.display());
                    self.error = Some(e.clone());
                    return Err(e);
                }
            };

            if !Self::matches_any(&blob, descriptors)? {
                continue;
            }

            if any_skip && descriptors.iter().any(|desc| desc.should_skip(&blob)) {
                log::trace!("Skipping matched blob");
                continue;
            }

            self.found = Some(blob);
            return Ok(SearchOutcome::Found);
        }
    }

    fn matches_any(blob: &Blob, descriptors: &[SearchDescriptor]) -> KeyboxResult<bool> {
        for desc in descriptors {
            if desc.mode().matches(blob)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Decode the certificate embedded in the last found blob.
    pub fn get_certificate(&self) -> KeyboxResult<Certificate> {
        let blob = self.found.as_ref().ok_or(KeyboxError::NothingFound)?;

        let blob_type = blob.blob_type()?;
        if blob_type != BlobType::X509 {
            return Err(KeyboxError::WrongBlobType(blob_type.to_string()));
        }

        let der = blob.certificate_der()?;
        decode_certificate(der)
    }
}

impl std::fmt::Debug for KeyboxHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboxHandle")
            .field("path", &self.path)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
