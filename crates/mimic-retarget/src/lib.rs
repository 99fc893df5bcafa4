//! Mimic Retarget - From fused state to a concrete avatar
//!
//! The fusion engine emits one generic AnimationState. This crate maps it
//! onto whatever avatar is active:
//!
//! - Rigged humanoids: named expression channels + head bone, per-axis damping
//! - Primitive shapes: eye/mouth mesh scale, group rotation, cosmetic motion
//! - Composite avatars: parts animated by their explicit role
//!
//! Hand tracking drives rigged arms and fingers; procedural sway takes
//! over whenever a hand is out of view.

pub mod arm;
pub mod avatar;
pub mod composite;
pub mod humanoid;
pub mod primitive;
pub mod rig;

pub use arm::*;
pub use avatar::*;
pub use composite::*;
pub use humanoid::*;
pub use primitive::*;
pub use rig::*;
