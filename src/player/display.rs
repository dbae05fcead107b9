//! The display sink seam.
//!
//! Screen or window presentation is an external collaborator; the pipeline
//! only needs init / present / should_close / cleanup. The crate ships a
//! progress-reporting sink for headless playback and a null sink; a windowed
//! implementation plugs in behind the same trait.

use std::time::Instant;

use crate::config::FrameGeometry;
use crate::error::Result;
use crate::frame::types::RawFrame;
use crate::notify;

/// A sink that decoded frames are handed to, in order.
pub trait DisplaySink {
    /// Called once before the first frame.
    fn init(&mut self, geometry: FrameGeometry) -> Result<()>;

    /// Presents one frame. An error is fatal to playback.
    fn present(&mut self, frame: &RawFrame) -> Result<()>;

    /// Polled between frames; `true` requests cancellation (window closed).
    fn should_close(&self) -> bool {
        false
    }

    /// Called exactly once on every exit path of the playback driver.
    fn cleanup(&mut self) {}
}

// ---------------------------------------------------------------------------
// ProgressDisplay
// ---------------------------------------------------------------------------

/// Headless sink: accounts frames and reports throughput every 60 frames.
#[derive(Default)]
pub struct ProgressDisplay {
    started: Option<Instant>,
    frames: u64,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }
}

impl DisplaySink for ProgressDisplay {
    fn init(&mut self, geometry: FrameGeometry) -> Result<()> {
        notify!(
            2,
            "playing {}x{} ({} channels)\n",
            geometry.width,
            geometry.height,
            geometry.channels
        );
        self.started = Some(Instant::now());
        self.frames = 0;
        Ok(())
    }

    fn present(&mut self, _frame: &RawFrame) -> Result<()> {
        self.frames += 1;
        if self.frames % 60 == 0 {
            if let Some(started) = self.started {
                let elapsed = started.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    notify!(
                        2,
                        "\rframes: {}, fps: {:.1}, elapsed: {:.1}s",
                        self.frames,
                        self.frames as f64 / elapsed,
                        elapsed
                    );
                }
            }
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        if self.frames >= 60 {
            notify!(2, "\n");
        }
    }
}

// ---------------------------------------------------------------------------
// NullDisplay
// ---------------------------------------------------------------------------

/// Discards frames; counts them for callers that only need the total.
#[derive(Default)]
pub struct NullDisplay {
    frames: u64,
}

impl NullDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }
}

impl DisplaySink for NullDisplay {
    fn init(&mut self, _geometry: FrameGeometry) -> Result<()> {
        Ok(())
    }

    fn present(&mut self, _frame: &RawFrame) -> Result<()> {
        self.frames += 1;
        Ok(())
    }
}
