//! Mimic Test Harness - Session simulation and pipeline validation
//!
//! This crate provides:
//! - Scripted session timelines (faces, hands, audio, visemes, hotkeys)
//! - Seeded detection jitter and dropouts
//! - End-to-end scenarios for the fusion guarantees

pub mod integration;
pub mod simulator;

pub use integration::*;
pub use simulator::*;
