//! Error types for Mimic
//!
//! Steady-state frame work never fails: missing or malformed signals
//! degrade to idle/neutral defaults. These errors only surface on
//! construction and configuration paths.

use thiserror::Error;

/// Core Mimic errors
#[derive(Error, Debug)]
pub enum MimicError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown expression: {0}")]
    UnknownExpression(String),

    #[error("Unknown avatar kind: {0}")]
    UnknownAvatarKind(String),

    // Avatar errors
    #[error("Avatar kind {0} requires a humanoid rig")]
    MissingRig(String),

    // Signal errors
    #[error("Invalid landmarks: expected {expected}, got {actual}")]
    InvalidLandmarks { expected: usize, actual: usize },

    #[error("Point cloud too large to index: {0} points")]
    PointCloudTooLarge(usize),

    // Worker errors
    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(String),
}

/// Result type for Mimic operations
pub type MimicResult<T> = Result<T, MimicError>;
