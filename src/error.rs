//! Error types for the watermark compositor

use thiserror::Error;

/// Result type alias for compositor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing a shareable image
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to resolve the source photo (fetch, decode, or size probe)
    #[error("Source resolution failed: {0}")]
    SourceError(String),

    /// Failed to rasterize or encode the composite
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// An async completion arrived for a superseded request
    #[error("Stale completion for generation {got}, current is {current}")]
    StaleGeneration { got: u64, current: u64 },

    /// Filesystem error while delivering an artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::SourceError(err.to_string())
    }
}
