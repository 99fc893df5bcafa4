//! Runtime errors

use mimic_core::MimicError;
use thiserror::Error;

/// Errors from studio construction and configuration
#[derive(Error, Debug)]
pub enum StudioError {
    #[error(transparent)]
    Mimic(#[from] MimicError),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StudioResult<T> = Result<T, StudioError>;
