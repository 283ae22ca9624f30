/// Error types for the vegetation index pipeline
use nfh_geo::GeoError;
use thiserror::Error;

/// Main error type for backend queries
#[derive(Error, Debug)]
pub enum EngineError {
    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Service { status: u16, message: String },

    /// Failed to parse a backend response
    #[error("Failed to parse backend response: {0}")]
    ResponseParse(String),

    /// Region reduction would scan more pixels than allowed
    #[error("Too many pixels in region: {pixels} exceeds maxPixels {max_pixels}")]
    TooManyPixels { pixels: u64, max_pixels: u64 },

    /// The backend cannot perform this operation
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    /// Failed to read a local scene archive
    #[error("Failed to read scene archive: {0}")]
    ArchiveRead(#[from] std::io::Error),

    /// Failed to parse a local scene archive
    #[error("Failed to parse scene archive: {0}")]
    ArchiveParse(#[from] serde_json::Error),

    /// Invalid area or date window
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Type alias for Results using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
