/// Error types for the location and area model
use thiserror::Error;

/// Main error type for location resolution and area construction
#[derive(Error, Debug, PartialEq)]
pub enum GeoError {
    /// Latitude outside [-90, 90] or longitude outside [-180, 180]
    #[error("Invalid coordinate: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// Coordinate is valid but outside the Nepal bounding box
    #[error("Coordinate {lat:.4}°N, {lon:.4}°E is outside Nepal (lat 26-31, lon 80-89)")]
    OutsideNepal { lat: f64, lon: f64 },

    /// Area radius must be strictly positive
    #[error("Invalid radius: {0} km (must be > 0)")]
    InvalidRadius(f64),

    /// Month number outside 1..=12
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// Date range whose end precedes its start
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: String, end: String },

    /// Failed to parse an embedded gazetteer table
    #[error("Failed to parse gazetteer: {0}")]
    GazetteerParse(String),
}

/// Type alias for Results using GeoError
pub type Result<T> = std::result::Result<T, GeoError>;
