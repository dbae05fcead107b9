#![no_main]
use libfuzzer_sys::fuzz_target;

use gitvid::frame::format::{deserialize, serialize};
use gitvid::frame::types::{CompressionType, FrameRecord};
use gitvid::FrameGeometry;

const GEOMETRY: FrameGeometry = FrameGeometry::new(16, 4, 3);

fuzz_target!(|data: &[u8]| {
    // First byte selects the compression type and doubles as the frame
    // number; the rest becomes the payload.
    let (selector, payload) = match data.split_first() {
        Some(split) => split,
        None => return,
    };
    let compression = if selector & 1 == 0 {
        CompressionType::Raw
    } else {
        CompressionType::Delta
    };

    let record = FrameRecord::new(
        u32::from(*selector),
        GEOMETRY,
        compression,
        payload.to_vec(),
    );
    let bytes = serialize(&record);

    // A record we serialized ourselves must always parse back.
    let recovered = match deserialize(&bytes, GEOMETRY) {
        Ok(r) => r,
        Err(e) => panic!(
            "record round-trip: self-serialized record rejected \
             (payload {} bytes): {e}",
            payload.len()
        ),
    };

    assert_eq!(
        recovered,
        record,
        "record round-trip mismatch for a {}-byte payload",
        payload.len()
    );
});
