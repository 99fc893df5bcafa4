//! Clock implementations for the animation loop

use std::time::{Duration, Instant};

use mimic_core::FrameTime;

/// Largest frame delta the clock will report
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// One advance of the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// Time after the advance
    pub now: FrameTime,
    /// Clamped delta since the previous tick
    pub dt: Duration,
}

/// Frame clock - monotonic, smooth, render-driven
/// INVARIANT: time MUST be monotonically increasing, NEVER jumps more than MAX_FRAME_DELTA
pub struct FrameClock {
    /// Current frame time
    value: FrameTime,
    /// Last OS instant seen by tick()
    last_update: Option<Instant>,
    /// Number of ticks/advances so far
    frames: u64,
}

impl FrameClock {
    /// Create a new clock starting at zero
    pub fn new() -> Self {
        FrameClock {
            value: FrameTime::ZERO,
            last_update: None,
            frames: 0,
        }
    }

    /// Advance from the OS monotonic clock.
    ///
    /// The first tick reports a zero delta. Long gaps (tab hidden, system
    /// sleep) are clamped so ramps do not complete in a single frame.
    pub fn tick(&mut self) -> FrameTick {
        let now = Instant::now();
        let elapsed = match self.last_update {
            Some(last) => now.duration_since(last),
            None => Duration::ZERO,
        };
        self.last_update = Some(now);
        self.advance(elapsed)
    }

    /// Advance by an explicit delta (deterministic driving)
    pub fn advance(&mut self, dt: Duration) -> FrameTick {
        let clamped = dt.min(MAX_FRAME_DELTA);
        self.value = self.value.saturating_add(clamped);
        self.frames += 1;
        FrameTick {
            now: self.value,
            dt: clamped,
        }
    }

    /// Current frame time without advancing
    pub fn now(&self) -> FrameTime {
        self.value
    }

    /// Number of frames advanced
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
