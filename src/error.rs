use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fallible pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Describes a failure originating inside a capture source.
///
/// Carried in `CaptureSourceObserver::capture_did_fail` notifications; never
/// returned as an `Err` from the capture entry points. No variant is fatal to
/// the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureSourceError {
    /// Unknown error, and catch-all for errors not otherwise covered.
    Unknown,
    /// A failure observed from a system facility used for capturing.
    SystemFailure,
    /// A failure observed while applying the requested configuration.
    ConfigurationFailure,
    /// A malformed sample was received; the sample is dropped and capture
    /// continues.
    InvalidFrame,
}

impl fmt::Display for CaptureSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureSourceError::Unknown => "unknown",
            CaptureSourceError::SystemFailure => "systemFailure",
            CaptureSourceError::ConfigurationFailure => "configurationFailure",
            CaptureSourceError::InvalidFrame => "invalidFrame",
        };
        write!(f, "{}", name)
    }
}
