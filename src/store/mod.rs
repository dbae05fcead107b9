//! The store adapter: how a content-addressed commit DAG is used as a
//! sequenced frame archive.
//!
//! One commit per frame; each commit's tree holds a single entry named
//! `frame.bin` whose blob is the serialized frame record; parent links define
//! playback order; the branch head points at the latest frame.
//!
//! The pipelines depend only on the [`FrameStore`] surface. [`git::GitStore`]
//! is the production binding over libgit2; [`memory::MemStore`] is a
//! content-addressed in-memory double used by the test suites.

pub mod git;
pub mod memory;

use std::fmt;

use crate::error::{GvcError, Result};

pub use git::GitStore;
pub use memory::MemStore;

/// Name of the single tree entry in every frame commit.
pub const FRAME_BLOB_NAME: &str = "frame.bin";

/// Tree entry mode for a regular (non-executable) file.
pub const MODE_BLOB: u32 = 0o100644;

// ─────────────────────────────────────────────────────────────────────────────
// Oid
// ─────────────────────────────────────────────────────────────────────────────

/// A 20-byte object id, rendered as 40 hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Oid([u8; 20]);

impl Oid {
    pub const RAW_LEN: usize = 20;
    pub const HEX_LEN: usize = 40;

    pub fn from_bytes(bytes: [u8; Self::RAW_LEN]) -> Self {
        Oid(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::RAW_LEN] {
        &self.0
    }

    /// Parses a full 40-hex object id.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != Self::HEX_LEN {
            return Err(GvcError::Store(format!(
                "object id '{hex}' is {} characters, expected {}",
                hex.len(),
                Self::HEX_LEN
            )));
        }
        let mut bytes = [0u8; Self::RAW_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| {
                GvcError::Store(format!("object id '{hex}' is not hexadecimal"))
            })?;
        }
        Ok(Oid(bytes))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({self})")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FrameStore
// ─────────────────────────────────────────────────────────────────────────────

/// One entry of a tree object: `(name, mode, blob oid)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub mode: u32,
    pub oid: Oid,
}

impl TreeEntry {
    /// The entry every frame commit carries: `frame.bin`, regular file mode.
    pub fn frame_blob(oid: Oid) -> Self {
        TreeEntry {
            name: FRAME_BLOB_NAME.to_owned(),
            mode: MODE_BLOB,
            oid,
        }
    }
}

/// Capability surface over a content-addressed object store.
///
/// Handles are exclusive: implementations serialize access internally, so
/// all methods take `&self` and the trait is `Send + Sync`.
pub trait FrameStore: Send + Sync {
    /// Writes a blob, returning its content hash.
    fn put_blob(&self, data: &[u8]) -> Result<Oid>;

    /// Builds a tree from the given entries.
    fn put_tree(&self, entries: &[TreeEntry]) -> Result<Oid>;

    /// Creates a commit with an optional single parent.
    fn put_commit(&self, tree: Oid, parent: Option<Oid>, message: &str) -> Result<Oid>;

    /// Moves the default branch reference to `commit`.
    fn set_head(&self, commit: Oid) -> Result<()>;

    /// Walks from HEAD and returns commit ids in chronological order.
    /// An empty repository yields an empty list, not an error.
    fn list_commits_oldest_first(&self) -> Result<Vec<Oid>>;

    /// Resolves a commit's tree, finds its `frame.bin` entry and returns the
    /// blob bytes. Fails with a store error when the entry is missing.
    fn read_frame_blob(&self, commit: Oid) -> Result<Vec<u8>>;
}
