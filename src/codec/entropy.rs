//! The entropy-codec seam.
//!
//! A general-purpose LZ-family byte-stream coder, treated as a black box by
//! the rest of the crate. The identity (LZ4 block format) is fixed for a
//! whole stream and is not recorded in the record header; both sides of a
//! stream must agree on it.

use lz4_flex::block;

use crate::error::{GvcError, Result};

/// Entropy-encodes `src` into a fresh buffer.
pub fn encode(src: &[u8]) -> Result<Vec<u8>> {
    let mut dst = vec![0u8; block::get_maximum_output_size(src.len())];
    let written = block::compress_into(src, &mut dst)
        .map_err(|e| GvcError::Compression(e.to_string()))?;
    dst.truncate(written);
    Ok(dst)
}

/// Entropy-decodes `src` into a buffer of at most `max_out` bytes.
///
/// A stream that does not fit `max_out`, or that the coder rejects, is a
/// `Malformed` error: on the decode side a rejected payload means a corrupt
/// record, not a codec misuse.
pub fn decode(src: &[u8], max_out: usize) -> Result<Vec<u8>> {
    let mut dst = vec![0u8; max_out];
    let written = block::decompress_into(src, &mut dst)
        .map_err(|e| GvcError::Malformed(format!("entropy stream rejected: {e}")))?;
    dst.truncate(written);
    Ok(dst)
}
