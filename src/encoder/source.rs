//! Raw-frame sources for the encoder.
//!
//! Ported from encoder_lib.c (`read_raw_frame` line 7, `generate_test_frame`
//! line 46) and the filename helpers of frame_format.c
//! (`parse_frame_number_from_filename` line 167). The C generator's plain
//! modulo-256 ramp is replaced with triangle waves so consecutive frames
//! stay within the signed-delta range of the delta codec.
//!
//! [`DirSource`] feeds `frame_NNNNNN.rgb` files from a directory, ordered by
//! the six-digit frame number in the name; [`TestPatternSource`] synthesizes
//! a moving-gradient sequence for demonstrations and tests.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::FrameGeometry;
use crate::error::{GvcError, Result};
use crate::frame::types::RawFrame;
use crate::notify;

/// Something that yields raw frames in stream order.
pub trait FrameSource {
    /// The next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<RawFrame>>;

    /// Total frame count when known up front.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

// ---------------------------------------------------------------------------
// Filename handling
// ---------------------------------------------------------------------------

/// Parses `frame_NNNNNN.rgb` (exactly six digits) into the frame number.
/// Anything else yields `None`.
pub fn parse_frame_number(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("frame_")?.strip_suffix(".rgb")?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Renders the canonical filename for a frame number.
pub fn frame_filename(frame_number: u32) -> String {
    format!("frame_{frame_number:06}.rgb")
}

// ---------------------------------------------------------------------------
// DirSource
// ---------------------------------------------------------------------------

/// Reads raw RGB files from a directory, in frame-number order.
pub struct DirSource {
    geometry: FrameGeometry,
    files: Vec<PathBuf>,
    next: usize,
}

impl DirSource {
    /// Scans `dir` (non-recursively) for `frame_NNNNNN.rgb` entries. Files
    /// with other names are ignored. An empty match set is an `Io` error.
    pub fn open(dir: &Path, geometry: FrameGeometry) -> Result<Self> {
        let mut numbered: Vec<(u32, PathBuf)> = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                GvcError::Io(std::io::Error::other(format!(
                    "scanning {}: {e}",
                    dir.display()
                )))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else { continue };
            if let Some(number) = parse_frame_number(name) {
                numbered.push((number, entry.into_path()));
            }
        }
        if numbered.is_empty() {
            return Err(GvcError::Io(std::io::Error::other(format!(
                "no frame_NNNNNN.rgb files in {}",
                dir.display()
            ))));
        }
        numbered.sort_by_key(|(number, _)| *number);
        notify!(2, "found {} input frames in {}\n", numbered.len(), dir.display());

        Ok(DirSource {
            geometry,
            files: numbered.into_iter().map(|(_, path)| path).collect(),
            next: 0,
        })
    }
}

impl FrameSource for DirSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        read_raw_frame(path, self.geometry).map(Some)
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.files.len())
    }
}

/// Reads one `.rgb` file of exactly W·H·C bytes.
pub fn read_raw_frame(path: &Path, geometry: FrameGeometry) -> Result<RawFrame> {
    let expected = geometry.pixel_count();
    let mut file = File::open(path)?;
    let actual = file.metadata()?.len();
    if actual != expected as u64 {
        return Err(GvcError::Malformed(format!(
            "{} is {actual} bytes, expected {expected}",
            path.display()
        )));
    }
    let mut pixels = vec![0u8; expected];
    file.read_exact(&mut pixels)?;
    RawFrame::new(geometry, pixels)
}

// ---------------------------------------------------------------------------
// TestPatternSource
// ---------------------------------------------------------------------------

/// Synthesizes a moving gradient. Channel values follow triangle waves over
/// position plus frame index, so consecutive frames differ by at most one
/// per pixel byte and delta-code tightly.
pub struct TestPatternSource {
    geometry: FrameGeometry,
    count: u32,
    next: u32,
}

impl TestPatternSource {
    pub fn new(geometry: FrameGeometry, count: u32) -> Self {
        TestPatternSource { geometry, count, next: 0 }
    }

    fn generate(&self, frame_number: u32) -> Result<RawFrame> {
        let g = self.geometry;
        let mut pixels = vec![0u8; g.pixel_count()];
        let channels = g.channels as usize;
        let n = frame_number as usize;

        // Triangle wave over 0..510 keeps per-frame steps at ±1 without the
        // discontinuity a plain modulo-256 ramp would introduce.
        fn tri(t: usize) -> u8 {
            let t = t % 510;
            if t < 255 { t as u8 } else { (510 - t) as u8 }
        }

        for y in 0..g.height as usize {
            for x in 0..g.width as usize {
                let base = (y * g.width as usize + x) * channels;
                pixels[base] = tri(x + n);
                if channels > 1 {
                    pixels[base + 1] = tri(y + n / 2);
                }
                if channels > 2 {
                    pixels[base + 2] = tri(x + y + n);
                }
                for c in 3..channels {
                    pixels[base + c] = tri(c * 37 + x + n);
                }
            }
        }

        RawFrame::new(g, pixels)
    }
}

impl FrameSource for TestPatternSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        if self.next >= self.count {
            return Ok(None);
        }
        let frame = self.generate(self.next)?;
        self.next += 1;
        Ok(Some(frame))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn filename_parse_accepts_canonical_names() {
        assert_eq!(parse_frame_number("frame_000000.rgb"), Some(0));
        assert_eq!(parse_frame_number("frame_000123.rgb"), Some(123));
        assert_eq!(parse_frame_number(&frame_filename(42)), Some(42));
    }

    #[test]
    fn filename_parse_rejects_variants() {
        assert_eq!(parse_frame_number("frame_123.rgb"), None); // not 6 digits
        assert_eq!(parse_frame_number("frame_0000123.rgb"), None); // 7 digits
        assert_eq!(parse_frame_number("frame_00012x.rgb"), None);
        assert_eq!(parse_frame_number("frame_000123.raw"), None);
        assert_eq!(parse_frame_number("Frame_000123.rgb"), None);
    }

    #[test]
    fn dir_source_orders_by_frame_number() {
        let g = FrameGeometry::new(2, 2, 1);
        let dir = TempDir::new().expect("tempdir");
        // Written out of order; also drop in a file that must be ignored.
        for (n, fill) in [(2u32, 2u8), (0, 0), (1, 1)] {
            fs::write(dir.path().join(frame_filename(n)), vec![fill; 4]).expect("write");
        }
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("write");

        let mut source = DirSource::open(dir.path(), g).expect("open");
        assert_eq!(source.len_hint(), Some(3));
        for expected in 0u8..3 {
            let frame = source.next_frame().expect("read").expect("frame");
            assert_eq!(frame.pixels()[0], expected);
        }
        assert!(source.next_frame().expect("read").is_none());
    }

    #[test]
    fn dir_source_rejects_empty_directory() {
        let dir = TempDir::new().expect("tempdir");
        assert!(DirSource::open(dir.path(), FrameGeometry::new(2, 2, 1)).is_err());
    }

    #[test]
    fn short_rgb_file_is_malformed() {
        let g = FrameGeometry::new(2, 2, 1);
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(frame_filename(0));
        fs::write(&path, vec![0u8; 3]).expect("write");
        let err = read_raw_frame(&path, g).unwrap_err();
        assert!(matches!(err, GvcError::Malformed(_)));
    }

    #[test]
    fn test_pattern_steps_stay_small() {
        let g = FrameGeometry::new(64, 4, 3);
        let mut source = TestPatternSource::new(g, 3);
        let f0 = source.next_frame().expect("ok").expect("frame");
        let f1 = source.next_frame().expect("ok").expect("frame");
        for (a, b) in f0.pixels().iter().zip(f1.pixels()) {
            let diff = (i16::from(*a) - i16::from(*b)).abs();
            assert!(diff <= 1, "step of {diff} between consecutive frames");
        }
    }
}
