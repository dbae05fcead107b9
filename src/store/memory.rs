//! Content-addressed in-memory store.
//!
//! Implements the full [`FrameStore`] contract without touching disk; object
//! ids are truncated SHA-256 over a domain-tagged serialization, so identical
//! content deduplicates just like the production store. Used by the unit and
//! integration suites, and useful as a scratch target.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::error::{GvcError, Result};

use super::{FrameStore, Oid, TreeEntry, FRAME_BLOB_NAME};

enum MemObject {
    Blob(Vec<u8>),
    Tree(Vec<TreeEntry>),
    Commit { tree: Oid, parent: Option<Oid> },
}

#[derive(Default)]
struct MemState {
    objects: HashMap<Oid, MemObject>,
    head: Option<Oid>,
}

/// In-memory content-addressed object store.
#[derive(Default)]
pub struct MemStore {
    state: Mutex<MemState>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current head commit, if any frames were committed.
    pub fn head(&self) -> Option<Oid> {
        self.lock().head
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Truncated SHA-256 over a domain tag plus payload chunks.
fn hash_object(tag: &str, chunks: &[&[u8]]) -> Oid {
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    for chunk in chunks {
        hasher.update(chunk);
    }
    let digest = hasher.finalize();
    let mut raw = [0u8; Oid::RAW_LEN];
    raw.copy_from_slice(&digest[..Oid::RAW_LEN]);
    Oid::from_bytes(raw)
}

impl FrameStore for MemStore {
    fn put_blob(&self, data: &[u8]) -> Result<Oid> {
        let oid = hash_object("blob", &[data]);
        self.lock()
            .objects
            .entry(oid)
            .or_insert_with(|| MemObject::Blob(data.to_vec()));
        Ok(oid)
    }

    fn put_tree(&self, entries: &[TreeEntry]) -> Result<Oid> {
        let mut chunks: Vec<Vec<u8>> = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut buf = Vec::new();
            buf.extend_from_slice(entry.name.as_bytes());
            buf.extend_from_slice(&entry.mode.to_le_bytes());
            buf.extend_from_slice(entry.oid.as_bytes());
            chunks.push(buf);
        }
        let refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let oid = hash_object("tree", &refs);
        self.lock()
            .objects
            .entry(oid)
            .or_insert_with(|| MemObject::Tree(entries.to_vec()));
        Ok(oid)
    }

    fn put_commit(&self, tree: Oid, parent: Option<Oid>, message: &str) -> Result<Oid> {
        let parent_bytes = match parent {
            Some(p) => p.as_bytes().to_vec(),
            None => Vec::new(),
        };
        let oid = hash_object(
            "commit",
            &[tree.as_bytes(), &parent_bytes, message.as_bytes()],
        );
        let mut state = self.lock();
        if !state.objects.contains_key(&tree) {
            return Err(GvcError::Store(format!("commit references unknown tree {tree}")));
        }
        if let Some(p) = parent {
            if !state.objects.contains_key(&p) {
                return Err(GvcError::Store(format!("commit references unknown parent {p}")));
            }
        }
        state
            .objects
            .entry(oid)
            .or_insert(MemObject::Commit { tree, parent });
        Ok(oid)
    }

    fn set_head(&self, commit: Oid) -> Result<()> {
        let mut state = self.lock();
        if !state.objects.contains_key(&commit) {
            return Err(GvcError::Store(format!("cannot set head to unknown commit {commit}")));
        }
        state.head = Some(commit);
        Ok(())
    }

    fn list_commits_oldest_first(&self) -> Result<Vec<Oid>> {
        let state = self.lock();
        let mut chain = Vec::new();
        let mut cursor = state.head;
        while let Some(oid) = cursor {
            match state.objects.get(&oid) {
                Some(MemObject::Commit { parent, .. }) => {
                    chain.push(oid);
                    cursor = *parent;
                }
                _ => {
                    return Err(GvcError::Store(format!("head chain hit non-commit {oid}")));
                }
            }
        }
        chain.reverse();
        Ok(chain)
    }

    fn read_frame_blob(&self, commit: Oid) -> Result<Vec<u8>> {
        let state = self.lock();
        let tree = match state.objects.get(&commit) {
            Some(MemObject::Commit { tree, .. }) => *tree,
            _ => return Err(GvcError::Store(format!("no such commit {commit}"))),
        };
        let entries = match state.objects.get(&tree) {
            Some(MemObject::Tree(entries)) => entries,
            _ => return Err(GvcError::Store(format!("commit {commit} has no tree"))),
        };
        let entry = entries
            .iter()
            .find(|e| e.name == FRAME_BLOB_NAME)
            .ok_or_else(|| {
                GvcError::Store(format!("no '{FRAME_BLOB_NAME}' entry in commit {commit}"))
            })?;
        match state.objects.get(&entry.oid) {
            Some(MemObject::Blob(data)) => Ok(data.clone()),
            _ => Err(GvcError::Store(format!(
                "missing blob {} for commit {commit}",
                entry.oid
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_lists_no_commits() {
        let store = MemStore::new();
        assert!(store.list_commits_oldest_first().expect("list").is_empty());
    }

    #[test]
    fn identical_blobs_share_an_oid() {
        let store = MemStore::new();
        let a = store.put_blob(b"frame").expect("blob");
        let b = store.put_blob(b"frame").expect("blob");
        assert_eq!(a, b);
        let c = store.put_blob(b"other").expect("blob");
        assert_ne!(a, c);
    }

    #[test]
    fn commit_chain_lists_oldest_first() {
        let store = MemStore::new();
        let mut parent = None;
        let mut expected = Vec::new();
        for n in 0..3u32 {
            let blob = store.put_blob(&n.to_le_bytes()).expect("blob");
            let tree = store.put_tree(&[TreeEntry::frame_blob(blob)]).expect("tree");
            let commit = store
                .put_commit(tree, parent, &format!("Frame {n:06}"))
                .expect("commit");
            store.set_head(commit).expect("head");
            expected.push(commit);
            parent = Some(commit);
        }
        assert_eq!(store.list_commits_oldest_first().expect("list"), expected);
    }

    #[test]
    fn read_frame_blob_resolves_tree_entry() {
        let store = MemStore::new();
        let blob = store.put_blob(b"payload").expect("blob");
        let tree = store.put_tree(&[TreeEntry::frame_blob(blob)]).expect("tree");
        let commit = store.put_commit(tree, None, "Frame 000000").expect("commit");
        assert_eq!(store.read_frame_blob(commit).expect("read"), b"payload");
    }

    #[test]
    fn read_frame_blob_without_entry_fails() {
        let store = MemStore::new();
        let blob = store.put_blob(b"payload").expect("blob");
        let tree = store
            .put_tree(&[TreeEntry {
                name: "other.bin".to_owned(),
                mode: super::super::MODE_BLOB,
                oid: blob,
            }])
            .expect("tree");
        let commit = store.put_commit(tree, None, "Frame 000000").expect("commit");
        assert!(store.read_frame_blob(commit).is_err());
    }
}
