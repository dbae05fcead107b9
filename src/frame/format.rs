//! Wire format of a frame record.
//!
//! Translated from frame_format.c lines 1–90 (`FRAME_MAGIC`,
//! `serialize_frame`, `deserialize_frame`).
//!
//! Port decisions:
//! - The C code memcpys the packed `frame_header_t` struct; here every field
//!   is written and read as an explicit little-endian integer, so the layout
//!   no longer rides on compiler struct padding.
//! - `deserialize_frame` verified the payload CRC on read but the
//!   decompressors skipped their own copy of the check "for performance";
//!   verification now happens unconditionally in [`deserialize`], the only
//!   parsing path.
//!
//! Layout, all integers little-endian:
//!
//! | offset | size | field |
//! |-------:|-----:|-------|
//! | 0      | 4    | magic `0x47564346` ("GVCF") |
//! | 4      | 4    | frame_number |
//! | 8      | 4    | width |
//! | 12     | 4    | height |
//! | 16     | 4    | channels |
//! | 20     | 4    | compressed_size |
//! | 24     | 4    | checksum (CRC-32/IEEE of the payload only) |
//! | 28     | 1    | compression_type (0 = raw, 1 = delta) |
//! | 29     | 3    | reserved, written zero, ignored on read |
//! | 32     | compressed_size | payload |

use crate::config::FrameGeometry;
use crate::error::{GvcError, Result};
use crate::frame::types::{CompressionType, FrameHeader, FrameRecord};

/// Record magic: the four ASCII characters "GVCF".
pub const FRAME_MAGIC: u32 = 0x4756_4346;

/// Size of the fixed header following the magic.
pub const HEADER_SIZE: usize = 28;

/// Magic plus header; the payload starts at this offset.
pub const PREAMBLE_SIZE: usize = 4 + HEADER_SIZE;

// ---------------------------------------------------------------------------
// LE helpers
// ---------------------------------------------------------------------------

#[inline]
fn write_le32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn read_le32(buf: &[u8], offset: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(b)
}

// ---------------------------------------------------------------------------
// serialize / deserialize
// ---------------------------------------------------------------------------

/// Serializes a record into a fresh buffer of `PREAMBLE_SIZE + payload` bytes.
/// The checksum is taken from the header as-is; `FrameRecord::new` computes it.
pub fn serialize(record: &FrameRecord) -> Vec<u8> {
    let h = &record.header;
    let mut buf = vec![0u8; PREAMBLE_SIZE + record.payload.len()];
    write_le32(&mut buf, 0, FRAME_MAGIC);
    write_le32(&mut buf, 4, h.frame_number);
    write_le32(&mut buf, 8, h.width);
    write_le32(&mut buf, 12, h.height);
    write_le32(&mut buf, 16, h.channels);
    write_le32(&mut buf, 20, h.compressed_size);
    write_le32(&mut buf, 24, h.checksum);
    buf[28] = h.compression_type as u8;
    // bytes 29..32 stay zero (reserved)
    buf[PREAMBLE_SIZE..].copy_from_slice(&record.payload);
    buf
}

/// Parses and validates a serialized record against the stream geometry.
///
/// Rejects short buffers, a bad magic, a geometry mismatch, a reserved
/// compression type and a truncated payload as `Malformed`; a payload whose
/// CRC-32 does not match the header checksum as `Integrity`. Trailing bytes
/// past the payload are ignored.
pub fn deserialize(bytes: &[u8], geometry: FrameGeometry) -> Result<FrameRecord> {
    if bytes.len() < PREAMBLE_SIZE {
        return Err(GvcError::Malformed(format!(
            "record is {} bytes, shorter than the {PREAMBLE_SIZE}-byte preamble",
            bytes.len()
        )));
    }
    let magic = read_le32(bytes, 0);
    if magic != FRAME_MAGIC {
        return Err(GvcError::Malformed(format!(
            "bad magic {magic:#010x}, expected {FRAME_MAGIC:#010x}"
        )));
    }

    let frame_number = read_le32(bytes, 4);
    let width = read_le32(bytes, 8);
    let height = read_le32(bytes, 12);
    let channels = read_le32(bytes, 16);
    let compressed_size = read_le32(bytes, 20);
    let checksum = read_le32(bytes, 24);
    let type_byte = bytes[28];

    if width != geometry.width || height != geometry.height || channels != geometry.channels {
        return Err(GvcError::Malformed(format!(
            "record geometry {width}x{height}x{channels} does not match stream \
             {}x{}x{}",
            geometry.width, geometry.height, geometry.channels
        )));
    }
    let compression_type = CompressionType::from_u8(type_byte).ok_or_else(|| {
        GvcError::Malformed(format!("reserved compression type {type_byte}"))
    })?;
    let payload_end = PREAMBLE_SIZE + compressed_size as usize;
    if payload_end > bytes.len() {
        return Err(GvcError::Malformed(format!(
            "payload of {compressed_size} bytes truncated at {} record bytes",
            bytes.len()
        )));
    }

    let payload = bytes[PREAMBLE_SIZE..payload_end].to_vec();
    let actual = crc32fast::hash(&payload);
    if actual != checksum {
        return Err(GvcError::Integrity(format!(
            "payload checksum {actual:#010x} does not match header {checksum:#010x}"
        )));
    }

    Ok(FrameRecord {
        header: FrameHeader {
            frame_number,
            width,
            height,
            channels,
            compressed_size,
            checksum,
            compression_type,
        },
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> (FrameRecord, FrameGeometry) {
        let g = FrameGeometry::new(8, 4, 3);
        let payload: Vec<u8> = (0u8..96).collect();
        (FrameRecord::new(3, g, CompressionType::Delta, payload), g)
    }

    #[test]
    fn roundtrip_preserves_record() {
        let (rec, g) = sample_record();
        let bytes = serialize(&rec);
        assert_eq!(bytes.len(), PREAMBLE_SIZE + rec.payload.len());
        let back = deserialize(&bytes, g).expect("roundtrip");
        assert_eq!(back, rec);
    }

    #[test]
    fn magic_bytes_are_little_endian_gvcf() {
        let (rec, _) = sample_record();
        let bytes = serialize(&rec);
        assert_eq!(&bytes[0..4], &FRAME_MAGIC.to_le_bytes());
    }

    #[test]
    fn reserved_bytes_written_zero_and_ignored() {
        let (rec, g) = sample_record();
        let mut bytes = serialize(&rec);
        assert_eq!(&bytes[29..32], &[0, 0, 0]);
        bytes[29] = 0xAA;
        bytes[31] = 0x55;
        // Reserved bytes carry no meaning; the record still parses.
        assert!(deserialize(&bytes, g).is_ok());
    }

    #[test]
    fn short_buffer_is_malformed() {
        let (rec, g) = sample_record();
        let bytes = serialize(&rec);
        let err = deserialize(&bytes[..PREAMBLE_SIZE - 1], g).unwrap_err();
        assert!(matches!(err, GvcError::Malformed(_)));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let (rec, g) = sample_record();
        let bytes = serialize(&rec);
        let err = deserialize(&bytes[..bytes.len() - 1], g).unwrap_err();
        assert!(matches!(err, GvcError::Malformed(_)));
    }

    #[test]
    fn corrupt_payload_is_integrity_failure() {
        let (rec, g) = sample_record();
        let mut bytes = serialize(&rec);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let err = deserialize(&bytes, g).unwrap_err();
        assert!(matches!(err, GvcError::Integrity(_)));
    }

    #[test]
    fn geometry_mismatch_is_malformed() {
        let (rec, _) = sample_record();
        let bytes = serialize(&rec);
        let err = deserialize(&bytes, FrameGeometry::new(8, 4, 4)).unwrap_err();
        assert!(matches!(err, GvcError::Malformed(_)));
    }

    #[test]
    fn reserved_compression_type_is_malformed() {
        let (rec, g) = sample_record();
        let mut bytes = serialize(&rec);
        bytes[28] = 2;
        let err = deserialize(&bytes, g).unwrap_err();
        assert!(matches!(err, GvcError::Malformed(_)));
    }
}
