//! Error types for scalekeys

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaleKeysError {
    /// A pitch name/octave pair or pitch code the table cannot represent.
    #[error("Pitch out of range: {0}")]
    PitchRange(String),
    #[error("Unknown pitch name: {0}")]
    UnknownPitchName(String),
    #[error("Scale not found: {root} {mode}")]
    ScaleNotFound { root: String, mode: String },
    #[error("Scale {0} has too few notes to fill the keyboard window")]
    ScaleTooSmall(String),
    #[error("Invalid scale row: {0}")]
    InvalidScaleRow(String),
    #[error("Invalid effect description: {0}")]
    InvalidEffect(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScaleKeysError>;
