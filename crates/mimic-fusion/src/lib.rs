//! Mimic Fusion - Many motion sources, one pose
//!
//! The fusion engine is the heart of Mimic. Face tracking, hand tracking,
//! lip-sync, audio and hotkeys all arrive on their own schedules; idle
//! motion is always there underneath. Once per rendered frame the engine
//! reads one snapshot of every source and produces an AnimationState.
//!
//! # Degradation
//!
//! - Face lost: head, blinks and mouth hand back to idle on the next frame
//! - Lip-sync silent: mouth falls back to face tracking, then idle
//! - Audio off: breathing is purely idle-driven
//!
//! Nothing here blocks, allocates per frame or returns an error.

pub mod blend;
pub mod engine;
pub mod modifier;
pub mod state;

pub use blend::*;
pub use engine::*;
pub use modifier::*;
pub use state::*;
