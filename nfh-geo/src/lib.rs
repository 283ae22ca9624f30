//! Location model for forest health analysis in Nepal.
//!
//! Resolves gazetteer names or raw coordinates to a [`coordinate::Coordinate`],
//! derives circular areas of interest, and builds the comparison date windows
//! the vegetation index pipeline queries.

pub mod coordinate;
pub mod date_range;
pub mod error;
pub mod gazetteer;

pub use coordinate::{AreaOfInterest, Coordinate, NEPAL_CENTER};
pub use date_range::DateRange;
pub use error::GeoError;
pub use gazetteer::{Gazetteer, LocationQuery, Resolution, ResolvedLocation};
