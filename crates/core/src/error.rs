//! Error types for the quadcrop-core library.
//!
//! Every public entry point validates its numeric input and reports contract
//! violations through [`CropError`] instead of letting NaN or infinity leak
//! into the geometry.

use thiserror::Error;

/// Errors that can occur within the quadcrop-core library.
///
/// Each variant represents a specific failure mode with contextual information
/// to help diagnose and handle errors appropriately.
#[derive(Error, Debug)]
pub enum CropError {
    /// A size or dimension was zero, negative or not finite.
    #[error("Invalid dimension `{name}`: {value} (must be finite and > 0)")]
    InvalidDimension { name: &'static str, value: f64 },

    /// The target aspect ratio was zero, negative or not finite.
    #[error("Invalid aspect ratio: {0} (must be finite and > 0)")]
    InvalidAspectRatio(f64),

    /// A coordinate, angle or delta was NaN or infinite.
    #[error("Non-finite value for `{name}`: {value}")]
    NonFinite { name: &'static str, value: f64 },

    /// No crop of positive size fits inside the media quad.
    #[error("No crop with aspect ratio {0} fits inside the media quad")]
    NoFit(f64),

    /// A gesture event arrived in a state that cannot accept it.
    #[error("Gesture error: {0}")]
    Gesture(String),

    /// Configuration-related errors (invalid environment values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CropError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a gesture error with the given message.
    pub fn gesture(msg: impl Into<String>) -> Self {
        Self::Gesture(msg.into())
    }
}

/// A convenient alias for Result with [`CropError`].
pub type Result<T> = std::result::Result<T, CropError>;

/// Fails unless `value` is finite.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CropError::NonFinite { name, value })
    }
}

/// Fails unless `value` is finite and strictly positive.
pub(crate) fn ensure_dimension(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CropError::InvalidDimension { name, value })
    }
}

/// Fails unless `ratio` is finite and strictly positive.
pub(crate) fn ensure_aspect_ratio(ratio: f64) -> Result<f64> {
    if ratio.is_finite() && ratio > 0.0 {
        Ok(ratio)
    } else {
        Err(CropError::InvalidAspectRatio(ratio))
    }
}
