use crate::{
    error::Result,
    query::{CollectionQuery, CompositeImage, ReduceParams, TileLayer, VisParams},
};
use async_trait::async_trait;
use nfh_geo::AreaOfInterest;

/// The capabilities the pipeline needs from a geospatial backend.
///
/// Implemented by the Earth Engine REST client, the offline scene archive,
/// and deterministic fakes in tests. Every call is a blocking round trip from
/// the caller's point of view; implementations do not retry.
#[async_trait]
pub trait ImageQueryService: Send + Sync {
    /// Number of scenes left after the area, date and cloud-cover filters.
    async fn image_count(&self, query: &CollectionQuery) -> Result<u64>;

    /// Masked, rescaled median composite clipped to the query area, with the
    /// index band appended.
    async fn composite(&self, query: &CollectionQuery) -> Result<CompositeImage>;

    /// Mean of the index band over `area`. `None` when no valid pixel remains.
    async fn reduce_mean(
        &self,
        image: &CompositeImage,
        area: &AreaOfInterest,
        params: &ReduceParams,
    ) -> Result<Option<f64>>;

    /// Tile endpoint rendering the index band with `vis`.
    async fn tile_layer(
        &self,
        image: &CompositeImage,
        vis: &VisParams,
        name: &str,
    ) -> Result<TileLayer>;
}
