//! Whole-frame compressor: the flat pixel buffer, entropy-coded.
//!
//! Ported from compression.c lines 163–228 (`compress_frame_raw` /
//! `decompress_frame_raw`); the checksum moves to the record layer, and a
//! decoded-length mismatch is reported as an integrity failure instead of
//! the C code's generic compression error.

use crate::config::FrameGeometry;
use crate::error::{GvcError, Result};
use crate::frame::types::{CompressionType, FrameRecord, RawFrame};

use super::entropy;

/// Encodes a frame as entropy-coded pixel bytes (`compression_type = 0`).
pub fn compress(input: &RawFrame, frame_number: u32) -> Result<FrameRecord> {
    let payload = entropy::encode(input.pixels())?;
    Ok(FrameRecord::new(
        frame_number,
        input.geometry(),
        CompressionType::Raw,
        payload,
    ))
}

/// Decodes a raw-typed record into a frame of exactly the stream geometry.
/// A decoded length other than W·H·C is an integrity failure.
pub fn decompress(record: &FrameRecord, geometry: FrameGeometry) -> Result<RawFrame> {
    let pixel_count = geometry.pixel_count();
    let pixels = entropy::decode(&record.payload, pixel_count)?;
    if pixels.len() != pixel_count {
        return Err(GvcError::Integrity(format!(
            "raw payload decoded to {} bytes, expected {pixel_count}",
            pixels.len()
        )));
    }
    RawFrame::new(geometry, pixels)
}
