//! Delta compressor: run-length segments of same/different bytes against a
//! reference frame, entropy-coded.
//!
//! Migrated from compression.c lines 6–161 (`compress_frame_delta` /
//! `decompress_frame_delta`).
//!
//! Migration decisions:
//! - The malloc'd 2×P scratch buffers become `Vec`s; the decoder's scratch
//!   stays bounded at 2×P through the entropy seam.
//! - The C decoder silently tolerated truncated streams, unknown tags and
//!   partial coverage; `apply_rle` tightens all of those into `Malformed`
//!   errors, since a well-formed stream covers exactly P bytes.
//! - Seeding the output with the reference (a memcpy there, `to_vec` here)
//!   is kept, so identical runs cost nothing.
//!
//! The pre-entropy stream is a sequence of segments covering exactly W·H·C
//! pixel bytes:
//!
//! - `0x00, len`: the next `len` bytes equal the reference;
//! - `0x01, len, d0..d(len-1)`: the next `len` bytes differ; each signed
//!   byte delta reconstructs as `clamp(ref + d, 0, 255)`.
//!
//! `len` is 1..=255; zero-length segments are never emitted and are rejected
//! on decode, as is any other tag value. Two identical-run segments never
//! appear back to back: the encoder fuses runs up to 255 bytes per segment.

use crate::config::FrameGeometry;
use crate::error::{GvcError, Result};
use crate::frame::types::{CompressionType, FrameRecord, RawFrame};

use super::entropy;

/// Segment tag: the covered bytes equal the reference.
const TAG_IDENTICAL: u8 = 0x00;
/// Segment tag: the covered bytes differ; signed deltas follow.
const TAG_DIFFERENT: u8 = 0x01;
/// Longest run a single segment can cover.
const MAX_RUN: usize = 255;

// ---------------------------------------------------------------------------
// RLE build / apply
// ---------------------------------------------------------------------------

/// Builds the run-length stream for `current` against `previous`.
/// Both slices must have the same length.
fn build_rle(current: &[u8], previous: &[u8]) -> Vec<u8> {
    debug_assert_eq!(current.len(), previous.len());
    let total = current.len();
    // Worst case is every byte different: 2 header bytes + 255 deltas per
    // 255-byte run, < 2 bytes per pixel byte.
    let mut out = Vec::with_capacity(total / 4);

    let mut i = 0;
    while i < total {
        let mut same = 0;
        while i + same < total && same < MAX_RUN && current[i + same] == previous[i + same] {
            same += 1;
        }
        if same > 0 {
            out.push(TAG_IDENTICAL);
            out.push(same as u8);
            i += same;
            continue;
        }

        let mut diff = 0;
        while i + diff < total && diff < MAX_RUN && current[i + diff] != previous[i + diff] {
            diff += 1;
        }
        out.push(TAG_DIFFERENT);
        out.push(diff as u8);
        for k in 0..diff {
            out.push(current[i + k].wrapping_sub(previous[i + k]));
        }
        i += diff;
    }
    out
}

/// Applies a run-length stream to `out`, which the caller has seeded with
/// the reference bytes. Validates full coverage: both the segment stream and
/// the pixel cursor must terminate at exactly `out.len()`.
fn apply_rle(rle: &[u8], out: &mut [u8]) -> Result<()> {
    let total = out.len();
    let mut pos = 0; // cursor into rle
    let mut pixel = 0; // cursor into out

    while pos < rle.len() {
        if pos + 2 > rle.len() {
            return Err(GvcError::Malformed(
                "delta stream ends inside a segment header".to_owned(),
            ));
        }
        let tag = rle[pos];
        let len = rle[pos + 1] as usize;
        pos += 2;

        if len == 0 {
            return Err(GvcError::Malformed("zero-length delta segment".to_owned()));
        }
        if pixel + len > total {
            return Err(GvcError::Malformed(format!(
                "delta segment overruns frame: {} + {len} > {total}",
                pixel
            )));
        }

        match tag {
            TAG_IDENTICAL => {
                // Bytes already hold the reference values.
                pixel += len;
            }
            TAG_DIFFERENT => {
                if pos + len > rle.len() {
                    return Err(GvcError::Malformed(
                        "delta stream ends inside a difference run".to_owned(),
                    ));
                }
                for k in 0..len {
                    let delta = rle[pos + k] as i8;
                    let value = i16::from(out[pixel + k]) + i16::from(delta);
                    out[pixel + k] = value.clamp(0, 255) as u8;
                }
                pos += len;
                pixel += len;
            }
            other => {
                return Err(GvcError::Malformed(format!(
                    "unknown delta segment tag {other:#04x}"
                )));
            }
        }
    }

    if pixel != total {
        return Err(GvcError::Malformed(format!(
            "delta stream covers {pixel} of {total} pixel bytes"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// compress / decompress
// ---------------------------------------------------------------------------

/// Encodes `current` against `previous` (`compression_type = 1`). Both frames
/// must share the stream geometry.
pub fn compress(
    current: &RawFrame,
    previous: &RawFrame,
    frame_number: u32,
) -> Result<FrameRecord> {
    if current.geometry() != previous.geometry() {
        return Err(GvcError::Malformed(format!(
            "delta reference geometry {:?} does not match frame {:?}",
            previous.geometry(),
            current.geometry()
        )));
    }
    let rle = build_rle(current.pixels(), previous.pixels());
    let payload = entropy::encode(&rle)?;
    Ok(FrameRecord::new(
        frame_number,
        current.geometry(),
        CompressionType::Delta,
        payload,
    ))
}

/// Decodes a delta-typed record against `previous`.
///
/// The output is seeded with the reference before segments are applied, so
/// identical runs need no work and the result is independent of any prior
/// buffer contents. The decoded run-length stream is bounded at 2·W·H·C.
pub fn decompress(
    record: &FrameRecord,
    previous: &RawFrame,
    geometry: FrameGeometry,
) -> Result<RawFrame> {
    if previous.geometry() != geometry {
        return Err(GvcError::Malformed(format!(
            "delta reference geometry {:?} does not match stream {:?}",
            previous.geometry(),
            geometry
        )));
    }
    let pixel_count = geometry.pixel_count();
    let rle = entropy::decode(&record.payload, pixel_count * 2)?;

    let mut pixels = previous.pixels().to_vec();
    apply_rle(&rle, &mut pixels)?;
    RawFrame::new(geometry, pixels)
}
