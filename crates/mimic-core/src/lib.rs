//! Mimic Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by every Mimic crate:
//! - Time primitives (FrameTime)
//! - Vector and rotation math (Vec3, EulerAngles, Quat)
//! - Bounded scalar helpers (the "never NaN, always in range" guarantees)
//! - Discrete expressions selected by hotkeys
//! - Error types

pub mod error;
pub mod expression;
pub mod math;
pub mod scalar;
pub mod time;

pub use error::*;
pub use expression::*;
pub use math::*;
pub use scalar::*;
pub use time::*;
