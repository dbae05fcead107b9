#![no_main]
use libfuzzer_sys::fuzz_target;

use gitvid::frame::format::deserialize;
use gitvid::FrameGeometry;

const GEOMETRY: FrameGeometry = FrameGeometry::new(16, 4, 3);

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes through the record parser. Err results are
    // expected and fine; what we verify is no panics and no wild reads.
    let _ = deserialize(data, GEOMETRY);

    // The parser must also hold up under a disagreeing stream geometry.
    let _ = deserialize(data, FrameGeometry::new(8, 8, 1));
});
