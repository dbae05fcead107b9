//! Integration suite: the playback pipeline over an in-memory store.
//!
//! Covers stream/commit cardinality, display ordering, clean termination on
//! an empty store, per-frame skip of corrupt commits, cancellation through
//! the display sink, and the prefetch-less configuration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gitvid::codec;
use gitvid::encoder::EncodeSession;
use gitvid::frame::format;
use gitvid::notify::set_notification_level;
use gitvid::player::NullDisplay;
use gitvid::store::{FrameStore, MemStore, TreeEntry};
use gitvid::{
    DisplaySink, FrameGeometry, GvcError, Oid, Pacing, Player, PlayerConfig, RawFrame, Result,
};

fn geometry() -> FrameGeometry {
    FrameGeometry::new(32, 8, 3)
}

fn config() -> PlayerConfig {
    PlayerConfig {
        geometry: geometry(),
        pacing: Pacing::MaxThroughput,
        ..PlayerConfig::default()
    }
}

/// Frame filled with a value derived from its index, so the display can
/// verify ordering from pixel content alone.
fn indexed_frame(n: u8) -> RawFrame {
    RawFrame::filled(geometry(), 100 + n)
}

fn encode_stream(store: &MemStore, count: u8) -> Vec<Oid> {
    let mut session = EncodeSession::new(store, geometry());
    for n in 0..count {
        session.push(indexed_frame(n)).expect("encode frame");
    }
    store.list_commits_oldest_first().expect("list")
}

/// Sink that records the first pixel byte of every presented frame.
#[derive(Default)]
struct CollectingDisplay {
    seen: Vec<u8>,
    inited: bool,
    cleaned: bool,
}

impl DisplaySink for CollectingDisplay {
    fn init(&mut self, _geometry: FrameGeometry) -> Result<()> {
        self.inited = true;
        Ok(())
    }

    fn present(&mut self, frame: &RawFrame) -> Result<()> {
        self.seen.push(frame.pixels()[0]);
        Ok(())
    }

    fn cleanup(&mut self) {
        self.cleaned = true;
    }
}

#[test]
fn stream_of_n_frames_yields_n_ordered_commits() {
    set_notification_level(0);
    let store = MemStore::new();
    let commits = encode_stream(&store, 12);
    assert_eq!(commits.len(), 12);

    // Commit messages are not inspectable here, but records are: frame
    // numbers must increase along the chain.
    for (expected, oid) in commits.iter().enumerate() {
        let record = format::deserialize(
            &store.read_frame_blob(*oid).expect("blob"),
            geometry(),
        )
        .expect("record");
        assert_eq!(record.header.frame_number, expected as u32);
    }
}

#[test]
fn playback_presents_every_frame_in_order() {
    set_notification_level(0);
    let store = MemStore::new();
    encode_stream(&store, 10);

    let mut display = CollectingDisplay::default();
    let player = Player::new(store, config());
    let stats = player.play(&mut display).expect("playback");

    assert_eq!(stats.frames_displayed, 10);
    assert_eq!(stats.frames_skipped, 0);
    let expected: Vec<u8> = (0..10).map(|n| 100 + n).collect();
    assert_eq!(display.seen, expected);
    assert!(display.inited && display.cleaned);
}

#[test]
fn empty_store_terminates_cleanly() {
    set_notification_level(0);
    let store = MemStore::new();
    let mut display = CollectingDisplay::default();
    let player = Player::new(store, config());

    let stats = player.play(&mut display).expect("playback");
    assert_eq!(stats.frames_displayed, 0);
    assert!(display.seen.is_empty());
    // No frames means the sink is never initialized.
    assert!(!display.inited);
}

#[test]
fn corrupt_commit_is_skipped_and_playback_continues() {
    set_notification_level(0);
    let g = geometry();
    let store = MemStore::new();

    // Hand-build a four-commit chain: frames 0 and 1 are good, commit 2
    // holds garbage bytes, frame 3 is raw-typed so it resynchronizes.
    fn put(store: &MemStore, bytes: &[u8], parent: Option<Oid>, label: &str) -> Oid {
        let blob = store.put_blob(bytes).expect("blob");
        let tree = store.put_tree(&[TreeEntry::frame_blob(blob)]).expect("tree");
        let commit = store.put_commit(tree, parent, label).expect("commit");
        store.set_head(commit).expect("head");
        commit
    }

    let frames: Vec<RawFrame> = (0..4).map(indexed_frame).collect();
    let mut parent = None;

    let r0 = codec::compress_frame(&frames[0], None, 0).expect("r0");
    parent = Some(put(&store, &format::serialize(&r0), parent, "Frame 000000"));

    let r1 = codec::compress_frame(&frames[1], Some(&frames[0]), 1).expect("r1");
    parent = Some(put(&store, &format::serialize(&r1), parent, "Frame 000001"));

    parent = Some(put(&store, b"not a frame record at all", parent, "Frame 000002"));

    let r3 = codec::compress_frame(&frames[3], None, 3).expect("r3");
    put(&store, &format::serialize(&r3), parent, "Frame 000003");

    let mut display = CollectingDisplay::default();
    let player = Player::new(store, config());
    let stats = player.play(&mut display).expect("playback");

    assert_eq!(stats.frames_displayed, 3);
    assert_eq!(stats.frames_skipped, 1);
    assert_eq!(display.seen, vec![100, 101, 103]);
}

#[test]
fn missing_blob_entry_is_skipped() {
    set_notification_level(0);
    let store = MemStore::new();
    let commits = encode_stream(&store, 2);

    // Append a commit whose tree has no frame.bin entry.
    let blob = store.put_blob(b"stray").expect("blob");
    let tree = store
        .put_tree(&[TreeEntry { name: "stray.bin".to_owned(), mode: 0o100644, oid: blob }])
        .expect("tree");
    let bad = store
        .put_commit(tree, Some(commits[1]), "Frame 000002")
        .expect("commit");
    store.set_head(bad).expect("head");

    let mut display = CollectingDisplay::default();
    let player = Player::new(store, config());
    let stats = player.play(&mut display).expect("playback");

    assert_eq!(stats.frames_displayed, 2);
    assert_eq!(stats.frames_skipped, 1);
}

#[test]
fn display_close_request_stops_playback() {
    set_notification_level(0);

    /// Asks to close after presenting two frames.
    #[derive(Default)]
    struct ClosingDisplay {
        frames: u64,
    }

    impl DisplaySink for ClosingDisplay {
        fn init(&mut self, _geometry: FrameGeometry) -> Result<()> {
            Ok(())
        }
        fn present(&mut self, _frame: &RawFrame) -> Result<()> {
            self.frames += 1;
            Ok(())
        }
        fn should_close(&self) -> bool {
            self.frames >= 2
        }
    }

    let store = MemStore::new();
    encode_stream(&store, 50);

    let mut display = ClosingDisplay::default();
    let player = Player::new(store, config());
    let stats = player.play(&mut display).expect("playback");

    // Cancellation is observed between frames; nothing further is shown.
    assert_eq!(stats.frames_displayed, 2);
}

#[test]
fn display_failure_aborts_with_display_error() {
    set_notification_level(0);

    struct FailingDisplay {
        presented: Arc<AtomicU64>,
    }

    impl DisplaySink for FailingDisplay {
        fn init(&mut self, _geometry: FrameGeometry) -> Result<()> {
            Ok(())
        }
        fn present(&mut self, _frame: &RawFrame) -> Result<()> {
            if self.presented.fetch_add(1, Ordering::SeqCst) >= 3 {
                return Err(GvcError::Display("sink rejected frame".to_owned()));
            }
            Ok(())
        }
    }

    let store = MemStore::new();
    encode_stream(&store, 20);

    let presented = Arc::new(AtomicU64::new(0));
    let mut display = FailingDisplay { presented: Arc::clone(&presented) };
    let player = Player::new(store, config());

    let err = player.play(&mut display).unwrap_err();
    assert!(matches!(err, GvcError::Display(_)));
    assert_eq!(presented.load(Ordering::SeqCst), 4);
}

#[test]
fn pipeline_without_prefetch_is_equivalent() {
    set_notification_level(0);
    let store = MemStore::new();
    encode_stream(&store, 8);

    let mut display = CollectingDisplay::default();
    let player = Player::new(store, PlayerConfig { prefetch: false, ..config() });
    let stats = player.play(&mut display).expect("playback");

    assert_eq!(stats.frames_displayed, 8);
    let expected: Vec<u8> = (0..8).map(|n| 100 + n).collect();
    assert_eq!(display.seen, expected);
}

#[test]
fn small_ring_does_not_deadlock_or_reorder() {
    set_notification_level(0);
    let store = MemStore::new();
    encode_stream(&store, 40);

    let mut display = CollectingDisplay::default();
    let player = Player::new(
        store,
        PlayerConfig { ring_capacity: 2, cache_capacity: 4, ..config() },
    );
    let stats = player.play(&mut display).expect("playback");

    assert_eq!(stats.frames_displayed, 40);
    let expected: Vec<u8> = (0..40).map(|n| 100 + n).collect();
    assert_eq!(display.seen, expected);
}

#[test]
fn null_display_counts_frames() {
    set_notification_level(0);
    let store = MemStore::new();
    encode_stream(&store, 5);

    let mut display = NullDisplay::new();
    let player = Player::new(store, config());
    let stats = player.play(&mut display).expect("playback");

    assert_eq!(stats.frames_displayed, 5);
    assert_eq!(display.frames_presented(), 5);
}
