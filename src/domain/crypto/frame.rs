//! PKCS#1 v1.5 signature frame (EMSA-PKCS1-v1_5) construction.
//!
//! Layout, for a frame as wide as the signer's modulus:
//!
//! ```text
//! 00 01 FF .. FF 00 || DigestInfo prefix || digest
//! ```

use super::DigestBytes;
use crate::domain::constants::{PKCS1_BLOCK_TYPE_SIGNATURE, PKCS1_PADDING_BYTE};
use crate::infra::error::{KeyboxError, KeyboxResult};

/// Build the encoded message for `digest` inside a frame of `nbits` bits.
///
/// Fails with `FrameTooSmall` unless at least two padding bytes fit.
pub fn encode_digest_frame(digest: &DigestBytes, nbits: usize) -> KeyboxResult<Vec<u8>> {
    let nframe = nbits.div_ceil(8);
    let prefix = digest.algorithm().digest_info_prefix();
    let too_small = || KeyboxError::FrameTooSmall {
        digest_bits: digest.len() * 8,
        frame_bits: nbits,
    };

    let pad_len = nframe
        .checked_sub(digest.len() + prefix.len() + 3)
        .ok_or_else(too_small)?;
    if pad_len <= 1 {
        return Err(too_small());
    }

    let mut frame = Vec::with_capacity(nframe);
    frame.push(0x00);
    frame.push(PKCS1_BLOCK_TYPE_SIGNATURE);
    frame.resize(2 + pad_len, PKCS1_PADDING_BYTE);
    frame.push(0x00);
    frame.extend_from_slice(prefix);
    frame.extend_from_slice(digest.as_slice());
    debug_assert_eq!(frame.len(), nframe);
    Ok(frame)
}
