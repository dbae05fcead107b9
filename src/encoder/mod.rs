//! Encoder driver: compress each incoming raw frame, wrap it in a record,
//! commit it, and chain it to the previous frame's commit.
//!
//! Migrated from encoder_lib.c (`encode_frame_to_commit` lines 74–139,
//! `encode_video_sequence` lines 141–241); the per-frame commit step and the
//! sequence loop split into `EncodeSession::push` and [`encode_sequence`].
//!
//! Any I/O, compression or store failure aborts the run and propagates; the
//! DAG is append-only, so an aborted encode leaves a valid playable prefix
//! (HEAD is advanced after every commit).

pub mod source;

use std::time::Instant;

use crate::codec;
use crate::config::{FrameGeometry, PROGRESS_INTERVAL};
use crate::error::{GvcError, Result};
use crate::frame::format;
use crate::frame::types::RawFrame;
use crate::notify;
use crate::store::{FrameStore, Oid, TreeEntry};

use source::FrameSource;

// ─────────────────────────────────────────────────────────────────────────────
// Options and stats
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub geometry: FrameGeometry,
    /// A progress notification is emitted every this many frames.
    pub progress_interval: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            geometry: FrameGeometry::broadcast(),
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

/// Outcome of an encode run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeStats {
    pub frames: u32,
    /// Uncompressed pixel bytes consumed.
    pub raw_bytes: u64,
    /// Serialized record bytes written to the store.
    pub stored_bytes: u64,
    /// The last commit written, which HEAD points at.
    pub head: Option<Oid>,
}

impl EncodeStats {
    /// Stored size as a percentage of the raw input.
    pub fn ratio(&self) -> f64 {
        if self.raw_bytes > 0 {
            self.stored_bytes as f64 / self.raw_bytes as f64 * 100.0
        } else {
            0.0
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EncodeSession
// ─────────────────────────────────────────────────────────────────────────────

/// Incremental encoder: one [`push`](EncodeSession::push) per frame, in
/// stream order. Retains the previous raw frame as the delta reference and
/// the previous commit as the parent.
pub struct EncodeSession<'a, S: FrameStore> {
    store: &'a S,
    geometry: FrameGeometry,
    frame_number: u32,
    previous: Option<RawFrame>,
    parent: Option<Oid>,
    stats: EncodeStats,
}

impl<'a, S: FrameStore> EncodeSession<'a, S> {
    pub fn new(store: &'a S, geometry: FrameGeometry) -> Self {
        EncodeSession {
            store,
            geometry,
            frame_number: 0,
            previous: None,
            parent: None,
            stats: EncodeStats::default(),
        }
    }

    /// Encodes one frame and commits it. Returns the commit id.
    ///
    /// Frame 0 is compressed raw; every later frame as a delta against the
    /// retained previous frame. The incoming frame becomes the next
    /// reference; the prior reference is released.
    pub fn push(&mut self, frame: RawFrame) -> Result<Oid> {
        if frame.geometry() != self.geometry {
            return Err(GvcError::Malformed(format!(
                "frame {} geometry {:?} does not match stream {:?}",
                self.frame_number,
                frame.geometry(),
                self.geometry
            )));
        }

        let record =
            codec::compress_frame(&frame, self.previous.as_ref(), self.frame_number)?;
        let compression = record.header.compression_type;
        let compressed_size = record.header.compressed_size;
        let bytes = format::serialize(&record);

        let blob = self.store.put_blob(&bytes)?;
        let tree = self.store.put_tree(&[TreeEntry::frame_blob(blob)])?;
        let message = format!(
            "Frame {:06} ({}, {} bytes)",
            self.frame_number,
            compression.label(),
            compressed_size
        );
        let commit = self.store.put_commit(tree, self.parent, &message)?;
        self.store.set_head(commit)?;

        notify!(
            3,
            "encoded frame {:06}: {} compression, {} bytes\n",
            self.frame_number,
            compression.label(),
            compressed_size
        );

        self.stats.frames += 1;
        self.stats.raw_bytes += self.geometry.pixel_count() as u64;
        self.stats.stored_bytes += bytes.len() as u64;
        self.stats.head = Some(commit);

        self.previous = Some(frame);
        self.parent = Some(commit);
        self.frame_number += 1;
        Ok(commit)
    }

    pub fn stats(&self) -> EncodeStats {
        self.stats
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequence driver
// ─────────────────────────────────────────────────────────────────────────────

/// Drains `frames` into `store`, reporting progress along the way.
pub fn encode_sequence<S: FrameStore>(
    frames: &mut dyn FrameSource,
    store: &S,
    options: &EncodeOptions,
) -> Result<EncodeStats> {
    let total = frames.len_hint();
    let started = Instant::now();
    let mut session = EncodeSession::new(store, options.geometry);

    while let Some(frame) = frames.next_frame()? {
        session.push(frame)?;

        let done = session.stats().frames;
        if options.progress_interval > 0 && done % options.progress_interval == 0 {
            match total {
                Some(total) if total > 0 => notify!(
                    2,
                    "\rprogress: {done}/{total} frames ({:.1}%)",
                    done as f64 / total as f64 * 100.0
                ),
                _ => notify!(2, "\rprogress: {done} frames"),
            }
        }
    }

    let stats = session.stats();
    notify!(
        2,
        "\rencoded {} frames: {} raw bytes -> {} stored bytes ({:.2}%) in {:.1}s\n",
        stats.frames,
        stats.raw_bytes,
        stats.stored_bytes,
        stats.ratio(),
        started.elapsed().as_secs_f64()
    );
    Ok(stats)
}
