#![no_main]
use libfuzzer_sys::fuzz_target;

use gitvid::codec::{compress_frame, decompress_frame};
use gitvid::frame::types::RawFrame;
use gitvid::FrameGeometry;

const GEOMETRY: FrameGeometry = FrameGeometry::new(16, 4, 3);
const PIXELS: usize = 16 * 4 * 3;

/// Builds a frame from `data` starting at `offset`, zero-padded.
fn frame_from(data: &[u8], offset: usize) -> RawFrame {
    let mut pixels = vec![0u8; PIXELS];
    for (i, px) in pixels.iter_mut().enumerate() {
        *px = data.get(offset + i).copied().unwrap_or(0);
    }
    RawFrame::new(GEOMETRY, pixels).expect("fuzz frame geometry")
}

fuzz_target!(|data: &[u8]| {
    let previous = frame_from(data, 0);
    let current = frame_from(data, PIXELS);

    // Raw mode must be byte-exact for any frame content.
    let record = compress_frame(&current, None, 0).expect("raw compress");
    let recovered = decompress_frame(&record, None, GEOMETRY).expect("raw decompress");
    assert_eq!(recovered, current, "raw round-trip mismatch");

    // Delta mode reconstructs through the saturating signed-delta rule, so
    // the oracle is that rule applied per byte, not the input frame itself
    // (per-byte differences beyond the signed-byte range saturate).
    let record = compress_frame(&current, Some(&previous), 1).expect("delta compress");
    let recovered =
        decompress_frame(&record, Some(&previous), GEOMETRY).expect("delta decompress");
    for (i, ((out, cur), prev)) in recovered
        .pixels()
        .iter()
        .zip(current.pixels())
        .zip(previous.pixels())
        .enumerate()
    {
        let delta = cur.wrapping_sub(*prev) as i8;
        let expected = (i16::from(*prev) + i16::from(delta)).clamp(0, 255) as u8;
        assert_eq!(
            *out, expected,
            "delta reconstruction mismatch at byte {i}: prev {prev}, cur {cur}"
        );
    }
});
