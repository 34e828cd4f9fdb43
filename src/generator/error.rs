//!
//! # Generator Error Handling
//!
//! Error type for the batch image generator, mirroring the run-level error
//! taxonomy: configuration errors abort before any work, input errors abort
//! with "nothing to do", and backend/image errors are recovered per entry by
//! the batch runner. Nothing is ever retried.

use std::fmt;

/// Represents all possible errors raised by the batch image generator.
#[derive(Debug)]
pub enum GenError {
    /// Missing or unusable configuration (e.g. no API token). Fatal; detected
    /// before any generation work starts.
    Config(String),
    /// Missing or unreadable prompt file. The run aborts with nothing to do.
    Input(String),
    /// A backend call failed: network error, daemon error, inference error,
    /// or an unexpected response shape. Recovered per entry by the runner.
    Backend(String),
    /// Image bytes could not be decoded, converted, or written to disk.
    /// Recovered per entry by the runner.
    Image(String),
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GenError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GenError::Input(msg) => write!(f, "Input error: {}", msg),
            GenError::Backend(msg) => write!(f, "Backend error: {}", msg),
            GenError::Image(msg) => write!(f, "Image error: {}", msg),
        }
    }
}

impl std::error::Error for GenError {}

impl From<reqwest::Error> for GenError {
    fn from(error: reqwest::Error) -> GenError {
        GenError::Backend(error.to_string())
    }
}

impl From<image::ImageError> for GenError {
    fn from(error: image::ImageError) -> GenError {
        GenError::Image(error.to_string())
    }
}

#[cfg(feature = "diffusion")]
impl From<candle_core::Error> for GenError {
    fn from(error: candle_core::Error) -> GenError {
        GenError::Backend(error.to_string())
    }
}

impl From<std::io::Error> for GenError {
    fn from(error: std::io::Error) -> GenError {
        GenError::Image(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GenError::Config("REPLICATE_API_TOKEN is not set".into());
        assert_eq!(
            error.to_string(),
            "Configuration error: REPLICATE_API_TOKEN is not set"
        );

        let error = GenError::Input("prompt file not found".into());
        assert_eq!(error.to_string(), "Input error: prompt file not found");

        let error = GenError::Backend("connection refused".into());
        assert_eq!(error.to_string(), "Backend error: connection refused");
    }
}
