//! Bounded FIFO of decoded frames between the decoder and the display.
//!
//! Corresponds to the frame buffer of player.c lines 44–88
//! (`buffer_put_frame` / `buffer_get_frame`): the mutex plus
//! `buffer_not_empty`/`buffer_not_full` condvars are re-expressed as a
//! bounded channel, with send/recv timeouts standing in for the condvar
//! broadcasts on stop.
//!
//! Built on a bounded channel: the producer blocks when full, the consumer
//! blocks when empty, and both re-check the shared stop flag every
//! [`STOP_POLL_MS`] so cancellation is observed within one pacing period.
//! Dropping the producer ends the stream; the consumer then drains whatever
//! is buffered and reports completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use crate::config::STOP_POLL_MS;
use crate::frame::types::RawFrame;

// ---------------------------------------------------------------------------
// StopFlag
// ---------------------------------------------------------------------------

/// Shared one-shot cancellation flag for a playback run.
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Ring halves
// ---------------------------------------------------------------------------

/// Creates the ring: a producer half for the decoder and a consumer half for
/// the display loop, sharing `stop`.
pub fn frame_ring(capacity: usize, stop: StopFlag) -> (RingProducer, RingConsumer) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        RingProducer { tx, stop: stop.clone() },
        RingConsumer { rx, stop },
    )
}

/// Decoder-side handle. Dropping it marks the stream complete.
pub struct RingProducer {
    tx: Sender<RawFrame>,
    stop: StopFlag,
}

impl RingProducer {
    /// Blocks while the ring is full. Returns `false` when playback stopped
    /// (the frame is released, not enqueued).
    pub fn push(&self, frame: RawFrame) -> bool {
        let mut frame = frame;
        loop {
            if self.stop.is_set() {
                return false;
            }
            match self
                .tx
                .send_timeout(frame, Duration::from_millis(STOP_POLL_MS))
            {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(returned)) => frame = returned,
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }
}

/// Display-side handle.
pub struct RingConsumer {
    rx: Receiver<RawFrame>,
    stop: StopFlag,
}

impl RingConsumer {
    /// Blocks while the ring is empty. Returns `None` once the stream is
    /// drained, or immediately after the stop flag is raised (buffered frames
    /// are then discarded by drop).
    pub fn pop(&self) -> Option<RawFrame> {
        loop {
            if self.stop.is_set() {
                return None;
            }
            match self.rx.recv_timeout(Duration::from_millis(STOP_POLL_MS)) {
                Ok(frame) => return Some(frame),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameGeometry;
    use std::thread;

    fn frame(value: u8) -> RawFrame {
        RawFrame::filled(FrameGeometry::new(2, 2, 1), value)
    }

    #[test]
    fn fifo_order_preserved() {
        let (tx, rx) = frame_ring(4, StopFlag::new());
        assert!(tx.push(frame(1)));
        assert!(tx.push(frame(2)));
        assert!(tx.push(frame(3)));
        assert_eq!(rx.pop().expect("frame").pixels()[0], 1);
        assert_eq!(rx.pop().expect("frame").pixels()[0], 2);
        assert_eq!(rx.pop().expect("frame").pixels()[0], 3);
    }

    #[test]
    fn drop_of_producer_drains_then_ends() {
        let (tx, rx) = frame_ring(4, StopFlag::new());
        assert!(tx.push(frame(9)));
        drop(tx);
        assert!(rx.pop().is_some());
        assert!(rx.pop().is_none());
    }

    #[test]
    fn stop_wakes_blocked_producer() {
        let stop = StopFlag::new();
        let (tx, _rx) = frame_ring(1, stop.clone());
        assert!(tx.push(frame(1)));

        let handle = thread::spawn(move || tx.push(frame(2)));
        stop.set();
        // The producer observes the flag within one poll interval.
        assert!(!handle.join().expect("join"));
    }

    #[test]
    fn stop_wakes_blocked_consumer() {
        let stop = StopFlag::new();
        let (_tx, rx) = frame_ring(1, stop.clone());

        let handle = thread::spawn(move || rx.pop());
        stop.set();
        assert!(handle.join().expect("join").is_none());
    }

    #[test]
    fn producer_blocks_until_slot_frees() {
        let (tx, rx) = frame_ring(1, StopFlag::new());
        assert!(tx.push(frame(1)));

        let handle = thread::spawn(move || {
            let ok = tx.push(frame(2));
            (ok, tx)
        });
        // Freeing one slot lets the blocked push land.
        assert_eq!(rx.pop().expect("frame").pixels()[0], 1);
        let (ok, _tx) = handle.join().expect("join");
        assert!(ok);
        assert_eq!(rx.pop().expect("frame").pixels()[0], 2);
    }
}
