//! Mimic Runtime - Studio coordinator
//!
//! Trackers run at their own cadence and publish into a shared hub. The
//! render loop calls `Studio::frame` once per frame; it never waits on a
//! tracker and never fails. A source that has stopped simply reads as
//! "not tracked" on the next frame.
//!
//! ```text
//!  FaceTracker ─┐
//!  HandTracker ─┤              ┌─ FusionEngine ─┐
//!  AudioListener┼─► SignalHub ─┤                ├─► Avatar / HumanoidRig
//!  HotkeyTrigger┘   (snapshot) └────────────────┘
//! ```

pub mod config;
pub mod depth_sort;
pub mod error;
pub mod hub;
pub mod logging;
pub mod sources;
pub mod studio;

pub use config::*;
pub use depth_sort::*;
pub use error::*;
pub use hub::*;
pub use logging::*;
pub use sources::*;
pub use studio::*;
