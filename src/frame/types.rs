//! In-memory frame types: decoded frames, record headers, records.
//!
//! Corresponds to the `frame_header_t` / `frame_t` / `raw_frame_t` structs
//! of git_vid_codec.h; the raw `uint8_t*` buffers become owned `Vec<u8>`s
//! freed by drop rather than `free_frame` / `free_raw_frame`.

use std::fmt;

use crate::config::FrameGeometry;
use crate::error::{GvcError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// CompressionType
// ─────────────────────────────────────────────────────────────────────────────

/// Payload encoding of a frame record. Values other than the two below are
/// reserved and rejected on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    /// Whole frame, entropy-coded pixel bytes.
    Raw = 0,
    /// Run-length segments of same/different bytes against the previous
    /// frame, entropy-coded.
    Delta = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::Raw),
            1 => Some(CompressionType::Delta),
            _ => None,
        }
    }

    /// Label used in commit messages and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            CompressionType::Raw => "raw",
            CompressionType::Delta => "delta",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RawFrame
// ─────────────────────────────────────────────────────────────────────────────

/// A decoded frame: exactly W·H·C pixel bytes, row-major, top-left origin.
///
/// Frames have a single owner at any time and move along the pipeline
/// (decoder → ring slot → display).
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    width: u32,
    height: u32,
    channels: u32,
    pixels: Vec<u8>,
}

impl RawFrame {
    /// Wraps an existing pixel buffer. The buffer length must equal the
    /// geometry's pixel count.
    pub fn new(geometry: FrameGeometry, pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != geometry.pixel_count() {
            return Err(GvcError::Malformed(format!(
                "pixel buffer is {} bytes, geometry requires {}",
                pixels.len(),
                geometry.pixel_count()
            )));
        }
        Ok(RawFrame {
            width: geometry.width,
            height: geometry.height,
            channels: geometry.channels,
            pixels,
        })
    }

    /// A frame with every pixel byte set to `value`.
    pub fn filled(geometry: FrameGeometry, value: u8) -> Self {
        RawFrame {
            width: geometry.width,
            height: geometry.height,
            channels: geometry.channels,
            pixels: vec![value; geometry.pixel_count()],
        }
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.width, self.height, self.channels)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("pixels", &format_args!("[{} bytes]", self.pixels.len()))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FrameHeader / FrameRecord
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed header of a serialized frame record (wire layout in `frame::format`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Zero-based monotonic frame index within the stream.
    pub frame_number: u32,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    /// Payload length in bytes.
    pub compressed_size: u32,
    /// CRC-32/IEEE of the payload only.
    pub checksum: u32,
    pub compression_type: CompressionType,
}

impl FrameHeader {
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.width, self.height, self.channels)
    }
}

/// A serialized frame: header plus entropy-coded payload. This is the unit
/// written to (and read from) the store, one blob per commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

impl FrameRecord {
    /// Builds a record for `payload`, computing its size and checksum.
    pub fn new(
        frame_number: u32,
        geometry: FrameGeometry,
        compression_type: CompressionType,
        payload: Vec<u8>,
    ) -> Self {
        let checksum = crc32fast::hash(&payload);
        FrameRecord {
            header: FrameHeader {
                frame_number,
                width: geometry.width,
                height: geometry.height,
                channels: geometry.channels,
                compressed_size: payload.len() as u32,
                checksum,
                compression_type,
            },
            payload,
        }
    }
}
