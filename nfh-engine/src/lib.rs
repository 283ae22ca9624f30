//! Vegetation index pipeline.
//!
//! Builds cloud-masked Sentinel-2 median composites, reduces their NDVI band
//! to area means and assembles monthly trend series. The computation itself
//! runs on an [`ImageQueryService`]: the Earth Engine REST API (feature
//! `api`) or a local scene archive.

pub mod error;
pub mod expression;
pub mod local;
pub mod pipeline;
pub mod query;
pub mod service;

#[cfg(feature = "api")]
pub mod earth_engine;

pub use error::{EngineError, Result};
pub use local::LocalArchive;
pub use pipeline::{
    compute_mean, get_composite, monthly_outcomes, monthly_series, MonthOutcome, MonthResult,
    MonthlyIndexSeries, SeriesPoint,
};
pub use query::{ndvi_vis_params, CollectionQuery, CompositeImage, ReduceParams, TileLayer, VisParams};
pub use service::ImageQueryService;

#[cfg(feature = "api")]
pub use earth_engine::EarthEngineClient;
