//! Search descriptors for keybox lookups.
//!
//! A search is an ordered list of [`SearchDescriptor`]s. The mode set is
//! closed; modes the engine cannot evaluate yet are kept so callers built
//! against the full set keep compiling, and they are rejected with
//! `KeyboxError::NotImplemented` before any I/O happens.

use std::fmt;
use std::sync::Arc;

use crate::domain::blob::Blob;
use crate::domain::types::SerialNumber;
use crate::infra::error::{KeyboxError, KeyboxResult};

/// Predicate deciding whether an otherwise matching blob must be skipped.
pub type SkipFn = Arc<dyn Fn(&Blob) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    Exact(String),
    Substring(String),
    Mail(String),
    MailSubstring(String),
    MailEnd(String),
    Words(String),
    /// X.509 issuer DN, compared byte-exact.
    Issuer(String),
    /// X.509 issuer DN plus certificate serial number.
    IssuerSerial {
        issuer: String,
        serial: SerialNumber,
    },
    /// X.509 subject DN, compared byte-exact.
    Subject(String),
    ShortKeyId(u32),
    LongKeyId(u64),
    Fingerprint(Vec<u8>),
    /// Restart at the beginning of the file and match anything.
    First,
    /// Match anything, continuing from the cursor.
    Next,
}

impl SearchMode {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SearchMode::Exact(_) => "exact",
            SearchMode::Substring(_) => "substring",
            SearchMode::Mail(_) => "mail",
            SearchMode::MailSubstring(_) => "mail-substring",
            SearchMode::MailEnd(_) => "mail-end",
            SearchMode::Words(_) => "words",
            SearchMode::Issuer(_) => "issuer",
            SearchMode::IssuerSerial { .. } => "issuer-serial",
            SearchMode::Subject(_) => "subject",
            SearchMode::ShortKeyId(_) => "short-keyid",
            SearchMode::LongKeyId(_) => "long-keyid",
            SearchMode::Fingerprint(_) => "fingerprint",
            SearchMode::First => "first",
            SearchMode::Next => "next",
        }
    }

    #[must_use]
    pub fn is_implemented(&self) -> bool {
        matches!(
            self,
            SearchMode::Issuer(_)
                | SearchMode::IssuerSerial { .. }
                | SearchMode::Subject(_)
                | SearchMode::First
                | SearchMode::Next
        )
    }

    /// Modes that would need a word index over user IDs.
    #[must_use]
    pub fn needs_words(&self) -> bool {
        matches!(self, SearchMode::Words(_))
    }

    /// Evaluate this mode against one blob.
    pub fn matches(&self, blob: &Blob) -> KeyboxResult<bool> {
        match self {
            SearchMode::Issuer(name) => Ok(blob.has_issuer(name)),
            SearchMode::IssuerSerial { issuer, serial } => Ok(blob.has_issuer_serial(issuer, serial)),
            SearchMode::Subject(name) => Ok(blob.has_subject(name)),
            SearchMode::First | SearchMode::Next => Ok(true),
            reserved => Err(KeyboxError::NotImplemented(reserved.clone())),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a search request.
#[derive(Clone)]
pub struct SearchDescriptor {
    mode: SearchMode,
    skip: Option<SkipFn>,
}

impl SearchDescriptor {
    #[must_use]
    pub fn new(mode: SearchMode) -> Self {
        Self { mode, skip: None }
    }

    #[must_use]
    pub fn first() -> Self {
        Self::new(SearchMode::First)
    }

    #[must_use]
    pub fn next() -> Self {
        Self::new(SearchMode::Next)
    }

    #[must_use]
    pub fn issuer(name: impl Into<String>) -> Self {
        Self::new(SearchMode::Issuer(name.into()))
    }

    #[must_use]
    pub fn issuer_serial(name: impl Into<String>, serial: SerialNumber) -> Self {
        Self::new(SearchMode::IssuerSerial {
            issuer: name.into(),
            serial,
        })
    }

    #[must_use]
    pub fn subject(name: impl Into<String>) -> Self {
        Self::new(SearchMode::Subject(name.into()))
    }

    /// Attach a skip predicate; a blob for which it returns `true` is passed
    /// over even when some descriptor matched it.
    #[must_use]
    pub fn with_skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&Blob) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(skip));
        self
    }

    #[must_use]
    pub fn mode(&self) -> &SearchMode {
        &self.mode
    }

    #[must_use]
    pub fn has_skip(&self) -> bool {
        self.skip.is_some()
    }

    #[must_use]
    pub fn should_skip(&self, blob: &Blob) -> bool {
        self.skip.as_ref().is_some_and(|skip| skip(blob))
    }
}

impl fmt::Debug for SearchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchDescriptor")
            .field("mode", &self.mode)
            .field("skip", &self.skip.is_some())
            .finish()
    }
}
