//! Type-safe wrappers using the new-type pattern.

use std::fmt;
use std::str::FromStr;

use crate::infra::error::{KeyboxError, KeyboxResult};

/// Certificate serial number as stored in a keybox blob (raw big-endian
/// INTEGER content octets).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SerialNumber(Box<[u8]>);

impl SerialNumber {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        SerialNumber(bytes.into_boxed_slice())
    }

    /// Parse the wire form used by keybox search requests: a 4-byte
    /// big-endian length followed by that many serial bytes.
    ///
    /// Trailing bytes after the declared length are ignored.
    #[must_use]
    pub fn from_length_prefixed(buffer: &[u8]) -> Option<Self> {
        let prefix: [u8; 4] = buffer.get(..4)?.try_into().ok()?;
        let len = usize::try_from(u32::from_be_bytes(prefix)).ok()?;
        let bytes = buffer.get(4..4usize.checked_add(len)?)?;
        Some(SerialNumber(bytes.into()))
    }

    /// Parse a hex string, optionally with `:` separators (`01:A2:...`).
    pub fn from_hex(hex_str: &str) -> KeyboxResult<Self> {
        let cleaned: String = hex_str
            .trim()
            .chars()
            .filter(|c| *c != ':' && !c.is_whitespace())
            .collect();
        let bytes = hex::decode(&cleaned).map_err(|e| {
            KeyboxError::ConfigurationError(format!("Invalid serial number '{hex_str}': {e}"))
        })?;
        Ok(SerialNumber::new(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for SerialNumber {
    type Err = KeyboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl fmt::Debug for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerialNumber({self})")
    }
}
