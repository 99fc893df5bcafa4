//! Mimic Time - Frame clock for the render-driven animation loop
//!
//! The fusion engine is driven by the display's frame callback. This crate
//! turns those callbacks into a monotonic FrameTime plus a clamped frame
//! delta, either from the OS clock (live sessions) or from explicit
//! deltas (simulation and tests).

pub mod clock;

pub use clock::*;
