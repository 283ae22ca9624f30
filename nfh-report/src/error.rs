/// Error types for report generation
use nfh_utils::error::DateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Language model service answered with a non-success status
    #[error("Service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// The service answered without any generated text
    #[error("Empty response from language model")]
    EmptyResponse,

    /// Failed to parse a service response
    #[error("Failed to parse service response: {0}")]
    ResponseParse(String),

    /// Chart rendering failed
    #[error("Failed to render chart: {0}")]
    Chart(String),

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Encoded output could not be finalized
    #[error("Failed to encode output: {0}")]
    Encoding(String),

    #[error(transparent)]
    Date(#[from] DateError),
}

/// Type alias for Results using ReportError
pub type Result<T> = std::result::Result<T, ReportError>;
