//! Error types for LoopCam.

use thiserror::Error;

/// Main error type for LoopCam operations.
#[derive(Error, Debug)]
pub enum LoopCamError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Duration resolves to zero samples: {0}")]
    EmptyDuration(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream requires payment: {0}")]
    UpstreamPaymentRequired(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoopCamError {
    /// Whether this error came from a vision or generation collaborator.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_) | Self::UpstreamPaymentRequired(_)
        )
    }
}

/// Result type alias for LoopCam operations.
pub type Result<T> = std::result::Result<T, LoopCamError>;
