//! Time primitives for Mimic
//!
//! Animation runs on a single monotonic clock:
//! - FrameTime: monotonic, smooth, advanced once per rendered frame
//!
//! Signal sources never carry their own timestamps into the fusion core.
//! The core reads "last known" values and stamps everything with the
//! frame time at which it was fused.

use std::ops::{Add, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Frame time - monotonic animation time
/// Represented as microseconds since session start
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameTime(pub u64);

impl FrameTime {
    pub const ZERO: FrameTime = FrameTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        FrameTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        FrameTime(millis * 1000)
    }

    #[inline]
    pub fn from_secs_f32(secs: f32) -> Self {
        FrameTime((secs.max(0.0) as f64 * 1_000_000.0) as u64)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    /// Seconds as f32, the unit every oscillator in the crate works in
    #[inline]
    pub fn as_secs_f32(self) -> f32 {
        (self.0 as f64 / 1_000_000.0) as f32
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        FrameTime(self.0.saturating_add(duration.as_micros() as u64))
    }
}

impl Add<Duration> for FrameTime {
    type Output = FrameTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<FrameTime> for FrameTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: FrameTime) -> Self::Output {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

impl std::fmt::Debug for FrameTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}s)", self.as_secs_f32())
    }
}

/// Seconds in a frame delta, clamped to a sane maximum.
///
/// A frame that took longer than `max` (tab in background, debugger pause)
/// is treated as `max` so ramps and smoothing do not jump.
#[inline]
pub fn delta_secs(dt: Duration, max: Duration) -> f32 {
    dt.min(max).as_secs_f32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time_arithmetic() {
        let t = FrameTime::from_millis(1500);
        assert_eq!(t.as_micros(), 1_500_000);
        assert!((t.as_secs_f32() - 1.5).abs() < 1e-6);

        let later = t + Duration::from_millis(250);
        assert_eq!(later - t, Duration::from_millis(250));
        // Subtraction never goes negative
        assert_eq!(t - later, Duration::ZERO);
    }

    #[test]
    fn test_from_negative_secs() {
        assert_eq!(FrameTime::from_secs_f32(-3.0), FrameTime::ZERO);
    }

    #[test]
    fn test_delta_secs_clamped() {
        let max = Duration::from_millis(100);
        assert!((delta_secs(Duration::from_millis(16), max) - 0.016).abs() < 1e-6);
        assert!((delta_secs(Duration::from_secs(5), max) - 0.1).abs() < 1e-6);
    }
}
