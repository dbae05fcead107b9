//! Fixed-capacity blob cache.
//!
//! Corresponds to the blob cache of git_ops_libgit2.c lines 60–98
//! (`find_blob_in_cache` / `add_blob_to_cache` over the static
//! `blob_cache[PREFETCH_CACHE_SIZE]` array and `cache_write_pos`); the
//! static array plus `cache_mutex` become an owned `Mutex<Slots>` value.
//!
//! A ring of write slots with FIFO eviction by insertion order: inserting
//! overwrites the slot at `write_pos` (releasing whatever was there) and
//! advances `write_pos` modulo capacity. Lookup is a linear scan; capacity is
//! small and bounded. The cache is a performance aid only: a miss always
//! falls through to a synchronous store read, so correctness holds with an
//! empty cache.

use std::sync::Mutex;

use crate::store::Oid;

struct Slots {
    entries: Vec<Option<(Oid, Vec<u8>)>>,
    write_pos: usize,
}

/// Mutex-guarded `commit oid → blob bytes` cache.
pub struct BlobCache {
    slots: Mutex<Slots>,
}

impl BlobCache {
    pub fn new(capacity: usize) -> Self {
        BlobCache {
            slots: Mutex::new(Slots {
                entries: (0..capacity.max(1)).map(|_| None).collect(),
                write_pos: 0,
            }),
        }
    }

    /// Returns a copy of the cached blob, if present.
    pub fn get(&self, oid: &Oid) -> Option<Vec<u8>> {
        let slots = self.lock();
        slots
            .entries
            .iter()
            .flatten()
            .find(|(cached, _)| cached == oid)
            .map(|(_, data)| data.clone())
    }

    pub fn contains(&self, oid: &Oid) -> bool {
        let slots = self.lock();
        slots.entries.iter().flatten().any(|(cached, _)| cached == oid)
    }

    /// Installs a blob, evicting whatever occupied the write slot.
    pub fn insert(&self, oid: Oid, data: Vec<u8>) {
        let mut slots = self.lock();
        let pos = slots.write_pos;
        // The evicted entry is dropped before the new one is installed.
        slots.entries[pos] = None;
        slots.entries[pos] = Some((oid, data));
        slots.write_pos = (pos + 1) % slots.entries.len();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
