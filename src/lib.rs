// gitvid: raw video stored in a Git repository, one commit per frame.

pub mod codec;
pub mod config;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod mp4;
pub mod notify;
pub mod player;
pub mod store;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports for the most common API entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// Crate-wide result alias and error type.
pub use error::{GvcError, Result};

/// Stream geometry (width / height / channel count).
pub use config::FrameGeometry;

/// A decoded frame in memory.
pub use frame::types::RawFrame;

/// Serialized per-frame record and its header.
pub use frame::types::{CompressionType, FrameHeader, FrameRecord};

/// The store-adapter capability surface and the libgit2 binding.
pub use store::{FrameStore, Oid};

/// One-shot encode of a whole frame sequence into a store.
pub use encoder::encode_sequence;

/// The playback pipeline and its display-sink seam.
pub use player::display::DisplaySink;
pub use player::{Pacing, PlaybackStats, Player, PlayerConfig};
