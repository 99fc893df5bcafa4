//! Mimic Signals - Motion sources as state
//!
//! Each source shapes raw detector/analyser output into a small,
//! normalized signal struct that the fusion engine reads once per frame.
//!
//! # Sources
//!
//! - Face: 52 blendshape coefficients, head rotation/position, landmarks
//! - Hands: 21 landmarks per hand, finger curl angles
//! - Audio: volume/bass/treble bands from frequency bins
//! - Visemes: five vowel weights from formant analysis
//! - Idle: procedural head motion, blinks and breathing (always available)
//! - Hotkeys: discrete expression selection
//!
//! A source that is not available is expressed as a "not tracked" /
//! silent / zero signal, never as an error.

pub mod audio;
pub mod blendshape;
pub mod face;
pub mod hand;
pub mod hotkey;
pub mod idle;
pub mod viseme;

pub use audio::*;
pub use blendshape::*;
pub use face::*;
pub use hand::*;
pub use hotkey::*;
pub use idle::*;
pub use viseme::*;
