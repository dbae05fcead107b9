//! Playback pipeline: ordered decode producer, bounded frame ring, display
//! consumer, with a blob cache and an optional background prefetcher.
//!
//! Migrated from player.c (`decoder_thread` line 139, the `play_from_repo`
//! pacing loop lines 443–530) and player_metal.c (the 16 ms semaphore
//! timeout on the display wait). The file-static frame buffer, `should_exit`
//! flag and signal handler of the C player become per-run values here.
//!
//! A [`Player`] value owns everything a run needs (store handle, cache,
//! prefetcher, ring and configuration) and is handed a [`DisplaySink`] per
//! run. There is no process-wide state.

pub mod cache;
pub mod display;
pub mod prefetch;
pub mod ring;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::codec;
use crate::config::{
    FrameGeometry, BLOB_CACHE_CAPACITY, FRAME_RING_CAPACITY, TARGET_FPS,
};
use crate::error::{GvcError, Result};
use crate::frame::format;
use crate::frame::types::RawFrame;
use crate::notify;
use crate::store::{FrameStore, Oid};

use cache::BlobCache;
use display::DisplaySink;
use prefetch::Prefetcher;
use ring::{frame_ring, RingProducer, StopFlag};

pub use display::{NullDisplay, ProgressDisplay};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration and stats
// ─────────────────────────────────────────────────────────────────────────────

/// Frame pacing of the display loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep out the remainder of each frame period (`1e9 / fps` ns).
    Fixed(u32),
    /// No pacing: run as fast as the display sink accepts frames.
    MaxThroughput,
}

/// Sizing and behavior of one playback run.
#[derive(Debug, Clone, Copy)]
pub struct PlayerConfig {
    pub geometry: FrameGeometry,
    pub ring_capacity: usize,
    pub cache_capacity: usize,
    /// Warm the blob cache from a background worker.
    pub prefetch: bool,
    pub pacing: Pacing,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            geometry: FrameGeometry::broadcast(),
            ring_capacity: FRAME_RING_CAPACITY,
            cache_capacity: BLOB_CACHE_CAPACITY,
            prefetch: cfg!(feature = "prefetch"),
            pacing: Pacing::Fixed(TARGET_FPS),
        }
    }
}

/// Outcome of a playback run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackStats {
    /// Frames handed to the display sink.
    pub frames_displayed: u64,
    /// Frames dropped because their commit, record or payload was bad.
    pub frames_skipped: u64,
    pub elapsed: Duration,
}

impl PlaybackStats {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames_displayed as f64 / secs
        } else {
            0.0
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Player
// ─────────────────────────────────────────────────────────────────────────────

/// The playback driver. Owns the store handle and per-run resources.
pub struct Player<S: FrameStore> {
    store: Arc<S>,
    config: PlayerConfig,
}

impl<S: FrameStore + 'static> Player<S> {
    pub fn new(store: S, config: PlayerConfig) -> Self {
        Player { store: Arc::new(store), config }
    }

    /// Plays the whole stream: every commit reachable from HEAD, oldest
    /// first.
    pub fn play(&self, display: &mut dyn DisplaySink) -> Result<PlaybackStats> {
        let commits = self.store.list_commits_oldest_first()?;
        self.play_commits(commits, display)
    }

    /// Plays an explicit commit list in the given order.
    ///
    /// An empty list terminates cleanly with zero frames displayed. The
    /// display sink is initialized before the first frame and cleaned up on
    /// every exit path; decoder and prefetcher are joined on every exit path.
    pub fn play_commits(
        &self,
        commits: Vec<Oid>,
        display: &mut dyn DisplaySink,
    ) -> Result<PlaybackStats> {
        if commits.is_empty() {
            notify!(2, "no frames to play\n");
            return Ok(PlaybackStats::default());
        }

        display.init(self.config.geometry)?;
        let result = self.run(commits, display);
        display.cleanup();
        result
    }

    fn run(
        &self,
        commits: Vec<Oid>,
        display: &mut dyn DisplaySink,
    ) -> Result<PlaybackStats> {
        let stop = StopFlag::new();
        let cache = Arc::new(BlobCache::new(self.config.cache_capacity));

        let prefetcher = if self.config.prefetch {
            Some(Prefetcher::start(
                Arc::clone(&self.store),
                Arc::clone(&cache),
                commits.clone(),
            )?)
        } else {
            None
        };

        let (producer, consumer) = frame_ring(self.config.ring_capacity, stop.clone());
        let decoder = {
            let store = Arc::clone(&self.store);
            let cache = Arc::clone(&cache);
            let stop = stop.clone();
            let geometry = self.config.geometry;
            thread::Builder::new()
                .name("gitvid-decode".to_owned())
                .spawn(move || decode_loop(store, cache, commits, geometry, producer, stop))
                .map_err(|e| GvcError::Thread(format!("cannot spawn decoder: {e}")))?
        };

        let loop_result = self.display_loop(consumer, display, &stop);

        // Completion, failure or cancellation: wake and collect both workers.
        stop.set();
        let skipped = decoder
            .join()
            .map_err(|_| GvcError::Thread("decoder worker panicked".to_owned()));
        if let Some(p) = prefetcher {
            p.stop();
        }

        let mut stats = loop_result?;
        stats.frames_skipped = skipped?;
        Ok(stats)
    }

    fn display_loop(
        &self,
        consumer: ring::RingConsumer,
        display: &mut dyn DisplaySink,
        stop: &StopFlag,
    ) -> Result<PlaybackStats> {
        let period = match self.config.pacing {
            Pacing::Fixed(fps) => {
                Some(Duration::from_nanos(1_000_000_000 / u64::from(fps.max(1))))
            }
            Pacing::MaxThroughput => None,
        };

        let started = Instant::now();
        let mut displayed: u64 = 0;
        let mut tick = Instant::now();

        loop {
            if display.should_close() {
                stop.set();
                break;
            }
            let Some(frame) = consumer.pop() else { break };

            if let Err(e) = display.present(&frame) {
                stop.set();
                return Err(e);
            }
            displayed += 1;

            if let Some(period) = period {
                let elapsed = tick.elapsed();
                if elapsed < period {
                    thread::sleep(period - elapsed);
                }
                tick = Instant::now();
            }
        }

        Ok(PlaybackStats {
            frames_displayed: displayed,
            frames_skipped: 0,
            elapsed: started.elapsed(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoder task
// ─────────────────────────────────────────────────────────────────────────────

/// Walks the commit list in order, decoding each frame against the retained
/// previous one and pushing results into the ring. Returns the skip count.
///
/// Bad commits are skipped with a notification and `previous` is retained
/// unchanged; a later delta frame against a stale reference will usually
/// fail its own checks until a raw-typed frame restores synchronization.
fn decode_loop<S: FrameStore>(
    store: Arc<S>,
    cache: Arc<BlobCache>,
    commits: Vec<Oid>,
    geometry: FrameGeometry,
    ring: RingProducer,
    stop: StopFlag,
) -> u64 {
    let mut previous: Option<RawFrame> = None;
    let mut skipped: u64 = 0;

    for oid in commits {
        if stop.is_set() {
            break;
        }

        // Cache first; a miss falls through to a synchronous store read.
        let bytes = match cache.get(&oid) {
            Some(bytes) => bytes,
            None => match store.read_frame_blob(oid) {
                Ok(bytes) => bytes,
                Err(e) => {
                    notify!(1, "skipping commit {oid}: {e}\n");
                    skipped += 1;
                    continue;
                }
            },
        };

        let record = match format::deserialize(&bytes, geometry) {
            Ok(record) => record,
            Err(e) => {
                notify!(1, "skipping commit {oid}: {e}\n");
                skipped += 1;
                continue;
            }
        };

        // Capture header fields into locals; the record is released by the
        // decompress call below and must not be touched afterwards.
        let compression = record.header.compression_type;
        let frame_number = record.header.frame_number;

        let decoded = match codec::decompress_frame(&record, previous.as_ref(), geometry) {
            Ok(frame) => frame,
            Err(e) if e.is_frame_local() => {
                notify!(1, "skipping commit {oid}: {e}\n");
                skipped += 1;
                continue;
            }
            Err(e) => {
                notify!(1, "fatal decode failure at commit {oid}: {e}\n");
                stop.set();
                break;
            }
        };

        notify!(3, "decoded frame {frame_number} ({}) from {oid}\n", compression.label());

        if !ring.push(decoded.clone()) {
            break;
        }
        // The freshly decoded frame becomes the reference; the prior
        // reference is released here.
        previous = Some(decoded);
    }

    skipped
}
