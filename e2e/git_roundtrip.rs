//! E2E suite: the full encode → store → playback path against a real
//! libgit2 repository in a temporary directory.

use tempfile::TempDir;

use gitvid::encoder::source::TestPatternSource;
use gitvid::encoder::{encode_sequence, EncodeOptions, EncodeSession};
use gitvid::frame::format;
use gitvid::frame::types::CompressionType;
use gitvid::notify::set_notification_level;
use gitvid::player::NullDisplay;
use gitvid::store::{FrameStore, GitStore};
use gitvid::{FrameGeometry, Pacing, Player, PlayerConfig, RawFrame};

fn geometry() -> FrameGeometry {
    FrameGeometry::new(48, 12, 3)
}

fn options() -> EncodeOptions {
    EncodeOptions { geometry: geometry(), ..EncodeOptions::default() }
}

fn player_config() -> PlayerConfig {
    PlayerConfig {
        geometry: geometry(),
        pacing: Pacing::MaxThroughput,
        ..PlayerConfig::default()
    }
}

#[test]
fn init_is_idempotent() {
    set_notification_level(0);
    let dir = TempDir::new().expect("tempdir");
    let _first = GitStore::init(dir.path()).expect("first init");
    // A second init on the same path opens the same repository.
    let second = GitStore::init(dir.path()).expect("second init");
    assert!(second.list_commits_oldest_first().expect("list").is_empty());
}

#[test]
fn empty_repository_lists_and_plays_nothing() {
    set_notification_level(0);
    let dir = TempDir::new().expect("tempdir");
    let store = GitStore::init(dir.path()).expect("init");
    assert!(store.list_commits_oldest_first().expect("list").is_empty());

    let mut display = NullDisplay::new();
    let stats = Player::new(store, player_config())
        .play(&mut display)
        .expect("playback");
    assert_eq!(stats.frames_displayed, 0);
}

#[test]
fn encode_then_play_roundtrip() {
    set_notification_level(0);
    let dir = TempDir::new().expect("tempdir");
    let store = GitStore::init(dir.path()).expect("init");

    let mut frames = TestPatternSource::new(geometry(), 10);
    let stats = encode_sequence(&mut frames, &store, &options()).expect("encode");
    assert_eq!(stats.frames, 10);

    let commits = store.list_commits_oldest_first().expect("list");
    assert_eq!(commits.len(), 10);
    assert_eq!(stats.head, Some(commits[9]));

    // Record headers carry the chain order and the raw/delta split.
    for (n, oid) in commits.iter().enumerate() {
        let record = format::deserialize(
            &store.read_frame_blob(*oid).expect("blob"),
            geometry(),
        )
        .expect("record");
        assert_eq!(record.header.frame_number, n as u32);
        let expected = if n == 0 { CompressionType::Raw } else { CompressionType::Delta };
        assert_eq!(record.header.compression_type, expected);
    }

    let mut display = NullDisplay::new();
    let played = Player::new(store, player_config())
        .play(&mut display)
        .expect("playback");
    assert_eq!(played.frames_displayed, 10);
    assert_eq!(played.frames_skipped, 0);
}

#[test]
fn reopened_store_still_plays() {
    set_notification_level(0);
    let dir = TempDir::new().expect("tempdir");
    {
        let store = GitStore::init(dir.path()).expect("init");
        let mut frames = TestPatternSource::new(geometry(), 4);
        encode_sequence(&mut frames, &store, &options()).expect("encode");
    }

    let store = GitStore::open(dir.path()).expect("open");
    let mut display = NullDisplay::new();
    let stats = Player::new(store, player_config())
        .play(&mut display)
        .expect("playback");
    assert_eq!(stats.frames_displayed, 4);
}

#[test]
fn short_oids_expand_in_batch() {
    set_notification_level(0);
    let dir = TempDir::new().expect("tempdir");
    let store = GitStore::init(dir.path()).expect("init");

    let mut session = EncodeSession::new(&store, geometry());
    for n in 0..3u8 {
        session.push(RawFrame::filled(geometry(), 40 + n)).expect("push");
    }
    let commits = store.list_commits_oldest_first().expect("list");

    let short: Vec<String> = commits.iter().map(|c| c.to_string()[..8].to_owned()).collect();
    let expanded = store.expand_oids(&short).expect("expand");
    assert_eq!(expanded, commits);

    assert!(store.expand_oids(&["deadbeef".to_owned()]).is_err());
}

#[test]
fn expanded_oids_play_in_given_order() {
    set_notification_level(0);
    let dir = TempDir::new().expect("tempdir");
    let store = GitStore::init(dir.path()).expect("init");

    let mut frames = TestPatternSource::new(geometry(), 5);
    encode_sequence(&mut frames, &store, &options()).expect("encode");
    let commits = store.list_commits_oldest_first().expect("list");

    let mut display = NullDisplay::new();
    let stats = Player::new(store, player_config())
        .play_commits(commits, &mut display)
        .expect("playback");
    assert_eq!(stats.frames_displayed, 5);
}

#[test]
fn blob_bytes_are_the_serialized_record() {
    set_notification_level(0);
    let dir = TempDir::new().expect("tempdir");
    let store = GitStore::init(dir.path()).expect("init");

    let mut session = EncodeSession::new(&store, geometry());
    let frame = RawFrame::filled(geometry(), 128);
    let commit = session.push(frame.clone()).expect("push");

    let bytes = store.read_frame_blob(commit).expect("blob");
    let record = format::deserialize(&bytes, geometry()).expect("record");
    assert_eq!(record.header.compression_type, CompressionType::Raw);

    let decoded = gitvid::codec::decompress_frame(&record, None, geometry()).expect("decode");
    assert_eq!(decoded, frame);
}
