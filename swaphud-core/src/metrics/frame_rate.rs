//! Frame rate counter
//!
//! Counts presented frames and publishes the count once per elapsed second.

use std::time::{Duration, Instant};

/// Length of one measurement window.
pub const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Frame counter with a one-second publishing window.
#[derive(Debug, Clone, Default)]
pub struct FrameRateCounter {
    window_start: Option<Instant>,
    frames: u32,
}

impl FrameRateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one presented frame at `now`.
    ///
    /// Returns the frame rate when at least [`SAMPLE_WINDOW`] has elapsed
    /// since the window started; the window then restarts at `now`. The
    /// first recorded frame opens the first window.
    pub fn record_frame(&mut self, now: Instant) -> Option<f64> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        if now.saturating_duration_since(start) >= SAMPLE_WINDOW {
            let fps = self.frames as f64;
            self.frames = 0;
            self.window_start = Some(now);
            Some(fps)
        } else {
            None
        }
    }

    /// Frames counted in the current window.
    pub fn pending_frames(&self) -> u32 {
        self.frames
    }
}
