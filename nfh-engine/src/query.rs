//! Request descriptions shared by every backend.
//!
//! A [`CollectionQuery`] captures the whole compositing recipe: which image
//! collection to load, how to filter it by area, date window and scene cloud
//! cover, how to mask cloudy pixels, how to rescale reflectance and which two
//! bands form the vegetation index.

use nfh_geo::{AreaOfInterest, DateRange};
use serde::{Deserialize, Serialize};

/// Sentinel-2 Level-2A surface reflectance, harmonized processing baseline.
pub const SENTINEL2_SR_COLLECTION: &str = "COPERNICUS/S2_SR_HARMONIZED";

/// Scene metadata property holding the percentage of cloudy pixels.
pub const CLOUD_COVER_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";

/// Scenes at or above this cloud percentage are discarded.
pub const MAX_CLOUD_COVER_PCT: f64 = 30.0;

/// Divisor from Sentinel-2 digital numbers to reflectance fractions.
pub const REFLECTANCE_SCALE: f64 = 10_000.0;

/// Quality band carrying the opaque-cloud and cirrus flags.
pub const QA_BAND: &str = "QA60";
pub const CLOUD_BIT: u8 = 10;
pub const CIRRUS_BIT: u8 = 11;

pub const NIR_BAND: &str = "B8";
pub const RED_BAND: &str = "B4";
pub const NDVI_BAND: &str = "NDVI";

/// Ground sampling distance for region reductions, in meters.
pub const REDUCE_SCALE_M: f64 = 30.0;

/// Upper bound on pixels scanned by a region reduction.
pub const MAX_PIXELS: u64 = 1_000_000_000;

/// Acquisition-time property kept on masked images.
pub const TIME_START_PROPERTY: &str = "system:time_start";

/// Per-pixel cloud mask decoded from two single-bit quality flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudMask {
    pub qa_band: String,
    pub cloud_bit: u8,
    pub cirrus_bit: u8,
}

impl CloudMask {
    pub fn sentinel2() -> CloudMask {
        CloudMask {
            qa_band: QA_BAND.to_string(),
            cloud_bit: CLOUD_BIT,
            cirrus_bit: CIRRUS_BIT,
        }
    }

    pub fn cloud_bit_mask(&self) -> u16 {
        1 << self.cloud_bit
    }

    pub fn cirrus_bit_mask(&self) -> u16 {
        1 << self.cirrus_bit
    }

    /// A pixel is kept only when both the cloud and the cirrus bit are zero.
    pub fn is_clear(&self, qa: u16) -> bool {
        qa & self.cloud_bit_mask() == 0 && qa & self.cirrus_bit_mask() == 0
    }
}

/// Everything needed to build one cloud-masked median composite with an
/// index band appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionQuery {
    pub collection: String,
    pub area: AreaOfInterest,
    pub range: DateRange,
    pub cloud_property: String,
    pub max_cloud_pct: f64,
    pub mask: CloudMask,
    pub scale_factor: f64,
    pub nir_band: String,
    pub red_band: String,
    pub index_band: String,
}

impl CollectionQuery {
    /// Sentinel-2 NDVI composite over `area` for acquisitions in `range`.
    pub fn sentinel2_ndvi(area: AreaOfInterest, range: DateRange) -> CollectionQuery {
        CollectionQuery {
            collection: SENTINEL2_SR_COLLECTION.to_string(),
            area,
            range,
            cloud_property: CLOUD_COVER_PROPERTY.to_string(),
            max_cloud_pct: MAX_CLOUD_COVER_PCT,
            mask: CloudMask::sentinel2(),
            scale_factor: REFLECTANCE_SCALE,
            nir_band: NIR_BAND.to_string(),
            red_band: RED_BAND.to_string(),
            index_band: NDVI_BAND.to_string(),
        }
    }
}

/// Handle to a composite computed by a backend.
///
/// Backends evaluate lazily; the handle only records how the image is
/// defined and is never cached between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
    pub query: CollectionQuery,
}

impl CompositeImage {
    pub fn index_band(&self) -> &str {
        &self.query.index_band
    }
}

/// Parameters of a spatial mean reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReduceParams {
    pub scale_m: f64,
    pub max_pixels: u64,
}

impl Default for ReduceParams {
    fn default() -> Self {
        ReduceParams {
            scale_m: REDUCE_SCALE_M,
            max_pixels: MAX_PIXELS,
        }
    }
}

/// Stretch and palette for rendering the index band as map tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

/// Red-to-green NDVI palette stretched over 0.0..0.8.
pub fn ndvi_vis_params() -> VisParams {
    VisParams {
        min: 0.0,
        max: 0.8,
        palette: ["d73027", "fc8d59", "fee08b", "d9ef8b", "91cf60", "1a9850"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    }
}

/// A rendered map overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    /// XYZ template with `{z}`, `{x}` and `{y}` placeholders
    pub url_template: String,
}

/// `(first - second) / (first + second)`.
///
/// Negative inputs and a zero denominator produce a masked (absent) pixel.
pub fn normalized_difference(first: f64, second: f64) -> Option<f64> {
    if first < 0.0 || second < 0.0 {
        return None;
    }
    let sum = first + second;
    if sum == 0.0 || !sum.is_finite() {
        return None;
    }
    Some((first - second) / sum)
}
