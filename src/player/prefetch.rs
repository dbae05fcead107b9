//! Background blob prefetcher.
//!
//! Corresponds to git_ops_libgit2.c lines 100–184 (`prefetch_worker`,
//! `git_start_prefetch`, `git_stop_prefetch`). The condvar-fed queue
//! collapses to a plain list walk because the queue is fixed before the
//! worker starts; stop-plus-join replaces the `prefetch_running` flag and
//! `pthread_join` pair.
//!
//! A single worker walks the commit list in playback order and warms the
//! blob cache through the store adapter, skipping entries that are already
//! cached. Fetch failures are only noted at verbose level; the decoder will
//! hit the same commit and surface the error itself. The worker stops
//! promptly when signalled and is joined by [`Prefetcher::stop`] (or drop).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{GvcError, Result};
use crate::notify;
use crate::store::{FrameStore, Oid};

use super::cache::BlobCache;

/// Handle on the prefetch worker.
pub struct Prefetcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Prefetcher {
    /// Spawns the worker over `oids` (playback order).
    pub fn start<S: FrameStore + 'static>(
        store: Arc<S>,
        cache: Arc<BlobCache>,
        oids: Vec<Oid>,
    ) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("gitvid-prefetch".to_owned())
            .spawn(move || {
                for oid in oids {
                    if worker_stop.load(Ordering::SeqCst) {
                        break;
                    }
                    if cache.contains(&oid) {
                        continue;
                    }
                    match store.read_frame_blob(oid) {
                        Ok(bytes) => cache.insert(oid, bytes),
                        Err(e) => {
                            notify!(3, "prefetch of {oid} failed: {e}\n");
                        }
                    }
                }
            })
            .map_err(|e| GvcError::Thread(format!("cannot spawn prefetch worker: {e}")))?;

        notify!(3, "prefetch worker started\n");
        Ok(Prefetcher { stop, handle: Some(handle) })
    }

    /// Signals the worker and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            notify!(3, "prefetch worker stopped\n");
        }
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
