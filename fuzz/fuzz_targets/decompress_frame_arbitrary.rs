#![no_main]
use libfuzzer_sys::fuzz_target;

use gitvid::codec::decompress_frame;
use gitvid::frame::types::{CompressionType, FrameRecord, RawFrame};
use gitvid::FrameGeometry;

const GEOMETRY: FrameGeometry = FrameGeometry::new(16, 4, 3);

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a record payload must never panic the decoders:
    // they either decode (saturating on wild deltas) or return an error.
    let previous = RawFrame::filled(GEOMETRY, 128);

    for compression in [CompressionType::Raw, CompressionType::Delta] {
        let record = FrameRecord::new(0, GEOMETRY, compression, data.to_vec());
        // With and without a reference, covering the delta-to-raw coercion.
        let _ = decompress_frame(&record, Some(&previous), GEOMETRY);
        let _ = decompress_frame(&record, None, GEOMETRY);
    }
});
