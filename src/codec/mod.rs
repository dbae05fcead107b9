//! Frame compressors and the entropy-codec seam.
//!
//! Two payload modes: `raw` entropy-codes the whole pixel buffer; `delta`
//! entropy-codes a run-length stream of same/different runs against the
//! previously decoded frame. Mode selection and decode dispatch live here.

pub mod delta;
pub mod entropy;
pub mod raw;

use crate::config::FrameGeometry;
use crate::error::Result;
use crate::frame::types::{CompressionType, FrameRecord, RawFrame};

/// Compresses a frame, choosing the mode: raw when there is no reference
/// (frame 0), delta against `previous` otherwise.
pub fn compress_frame(
    current: &RawFrame,
    previous: Option<&RawFrame>,
    frame_number: u32,
) -> Result<FrameRecord> {
    match previous {
        Some(prev) => delta::compress(current, prev, frame_number),
        None => raw::compress(current, frame_number),
    }
}

/// Decompresses a record against an optional reference frame.
///
/// A delta-typed record with no reference available (stream restart) is
/// passed through the raw path; this is the only cross-mode coercion.
pub fn decompress_frame(
    record: &FrameRecord,
    previous: Option<&RawFrame>,
    geometry: FrameGeometry,
) -> Result<RawFrame> {
    match (record.header.compression_type, previous) {
        (CompressionType::Raw, _) => raw::decompress(record, geometry),
        (CompressionType::Delta, Some(prev)) => delta::decompress(record, prev, geometry),
        (CompressionType::Delta, None) => raw::decompress(record, geometry),
    }
}
