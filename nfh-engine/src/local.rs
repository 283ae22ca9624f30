//! Offline backend over a JSON archive of Sentinel-2 samples.
//!
//! Each scene stores raw digital numbers for the QA, red and NIR bands at a
//! set of sample points. The archive reproduces the remote recipe locally:
//! scene filtering by footprint, date window and cloud cover, the QA bit
//! mask, reflectance rescaling, a per-point median across scenes, NDVI and a
//! mean over the area disk.

use crate::{
    error::{EngineError, Result},
    query::{
        normalized_difference, CollectionQuery, CompositeImage, ReduceParams, TileLayer,
        VisParams,
    },
    service::ImageQueryService,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use nfh_geo::{AreaOfInterest, Coordinate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One sample point of a scene, in raw sensor digital numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub lat: f64,
    pub lon: f64,
    pub qa60: u16,
    pub b4: f64,
    pub b8: f64,
}

impl Sample {
    fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }

    /// Sample points are matched across scenes by exact position.
    fn cell(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lon.to_bits())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub acquired: NaiveDate,
    pub cloudy_pixel_percentage: f64,
    pub samples: Vec<Sample>,
}

impl Scene {
    fn intersects(&self, area: &AreaOfInterest) -> bool {
        self.samples.iter().any(|s| area.contains(&s.coordinate()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneArchive {
    pub collection: String,
    pub scenes: Vec<Scene>,
}

/// [`ImageQueryService`] evaluated in memory over a [`SceneArchive`].
#[derive(Debug, Clone)]
pub struct LocalArchive {
    archive: SceneArchive,
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

impl LocalArchive {
    pub fn new(archive: SceneArchive) -> LocalArchive {
        LocalArchive { archive }
    }

    /// Load an archive from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<LocalArchive> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)?;
        let archive: SceneArchive = serde_json::from_str(&body)?;
        info!(
            "Loaded {} scenes of {} from {}",
            archive.scenes.len(),
            archive.collection,
            path.display()
        );
        Ok(LocalArchive::new(archive))
    }

    fn matching_scenes<'a>(&'a self, query: &'a CollectionQuery) -> impl Iterator<Item = &'a Scene> {
        let same_collection = self.archive.collection == query.collection;
        self.archive.scenes.iter().filter(move |scene| {
            same_collection
                && query.range.contains(&scene.acquired)
                && scene.cloudy_pixel_percentage < query.max_cloud_pct
                && scene.intersects(&query.area)
        })
    }

    /// Per-point index values of the clipped median composite.
    fn index_values(&self, query: &CollectionQuery, area: &AreaOfInterest) -> Vec<f64> {
        let mut stacks: BTreeMap<(u64, u64), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for scene in self.matching_scenes(query) {
            for sample in &scene.samples {
                let point = sample.coordinate();
                if !query.area.contains(&point) || !area.contains(&point) {
                    continue;
                }
                if !query.mask.is_clear(sample.qa60) {
                    continue;
                }
                let (red, nir) = stacks.entry(sample.cell()).or_default();
                red.push(sample.b4 / query.scale_factor);
                nir.push(sample.b8 / query.scale_factor);
            }
        }
        stacks
            .into_values()
            .filter_map(|(mut red, mut nir)| {
                let red = median(&mut red)?;
                let nir = median(&mut nir)?;
                normalized_difference(nir, red)
            })
            .collect()
    }
}

#[async_trait]
impl ImageQueryService for LocalArchive {
    async fn image_count(&self, query: &CollectionQuery) -> Result<u64> {
        Ok(self.matching_scenes(query).count() as u64)
    }

    async fn composite(&self, query: &CollectionQuery) -> Result<CompositeImage> {
        Ok(CompositeImage {
            query: query.clone(),
        })
    }

    async fn reduce_mean(
        &self,
        image: &CompositeImage,
        area: &AreaOfInterest,
        params: &ReduceParams,
    ) -> Result<Option<f64>> {
        let values = self.index_values(&image.query, area);
        let pixels = values.len() as u64;
        if pixels > params.max_pixels {
            return Err(EngineError::TooManyPixels {
                pixels,
                max_pixels: params.max_pixels,
            });
        }
        debug!("Reducing {} valid points", pixels);
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
    }

    async fn tile_layer(
        &self,
        _image: &CompositeImage,
        _vis: &VisParams,
        name: &str,
    ) -> Result<TileLayer> {
        Err(EngineError::Unsupported(format!(
            "map tiles for '{name}' require the Earth Engine backend"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{compute_mean, get_composite, monthly_series};
    use crate::query::SENTINEL2_SR_COLLECTION;
    use nfh_geo::DateRange;

    const CENTER: Coordinate = Coordinate {
        lat: 27.7172,
        lon: 85.3240,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(offset: f64, qa60: u16, b4: f64, b8: f64) -> Sample {
        Sample {
            lat: CENTER.lat + offset,
            lon: CENTER.lon,
            qa60,
            b4,
            b8,
        }
    }

    fn scene(id: &str, acquired: NaiveDate, cloud: f64, samples: Vec<Sample>) -> Scene {
        Scene {
            id: id.into(),
            acquired,
            cloudy_pixel_percentage: cloud,
            samples,
        }
    }

    fn archive(scenes: Vec<Scene>) -> LocalArchive {
        LocalArchive::new(SceneArchive {
            collection: SENTINEL2_SR_COLLECTION.into(),
            scenes,
        })
    }

    fn area() -> AreaOfInterest {
        AreaOfInterest::new(CENTER, 5.0).unwrap()
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[tokio::test]
    async fn test_filters_by_date_cloud_and_footprint() {
        let backend = archive(vec![
            scene("in", date(2023, 1, 10), 5.0, vec![sample(0.0, 0, 1000.0, 3000.0)]),
            scene("cloudy", date(2023, 1, 12), 30.0, vec![sample(0.0, 0, 1000.0, 3000.0)]),
            scene("late", date(2023, 2, 1), 5.0, vec![sample(0.0, 0, 1000.0, 3000.0)]),
            scene("far", date(2023, 1, 15), 5.0, vec![sample(1.0, 0, 1000.0, 3000.0)]),
        ]);
        let query = CollectionQuery::sentinel2_ndvi(area(), DateRange::month(2023, 1).unwrap());
        assert_eq!(backend.image_count(&query).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cloud_and_cirrus_pixels_are_masked() {
        let backend = archive(vec![scene(
            "s1",
            date(2022, 1, 5),
            10.0,
            vec![
                sample(0.0, 0, 1000.0, 3000.0),
                sample(0.01, 1 << 10, 3000.0, 1000.0),
                sample(0.02, 1 << 11, 3000.0, 1000.0),
            ],
        )]);
        let range = DateRange::season(2022, 1, 3).unwrap();
        let image = get_composite(&backend, &area(), &range).await.unwrap();
        let mean = compute_mean(&backend, &image, &area()).await.unwrap().unwrap();
        assert!((mean - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_median_composite_then_mean() {
        // one point seen three times; median B4 = 1000, median B8 = 4000
        let point = |b4, b8| vec![sample(0.0, 0, b4, b8)];
        let backend = archive(vec![
            scene("a", date(2022, 2, 1), 1.0, point(900.0, 3500.0)),
            scene("b", date(2022, 2, 11), 1.0, point(1000.0, 4000.0)),
            scene("c", date(2022, 2, 21), 1.0, point(2500.0, 4100.0)),
        ]);
        let range = DateRange::season(2022, 1, 3).unwrap();
        let image = get_composite(&backend, &area(), &range).await.unwrap();
        let mean = compute_mean(&backend, &image, &area()).await.unwrap().unwrap();
        assert!((mean - 0.6).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_no_valid_pixels_is_absent() {
        let backend = archive(vec![scene(
            "clouds",
            date(2022, 1, 5),
            10.0,
            vec![sample(0.0, 1 << 10, 1000.0, 3000.0)],
        )]);
        let range = DateRange::season(2022, 1, 3).unwrap();
        let image = get_composite(&backend, &area(), &range).await.unwrap();
        assert_eq!(compute_mean(&backend, &image, &area()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pixel_cap() {
        let backend = archive(vec![scene(
            "s",
            date(2022, 1, 5),
            10.0,
            vec![sample(0.0, 0, 1000.0, 3000.0), sample(0.01, 0, 1000.0, 3000.0)],
        )]);
        let image = CompositeImage {
            query: CollectionQuery::sentinel2_ndvi(area(), DateRange::month(2022, 1).unwrap()),
        };
        let params = ReduceParams {
            scale_m: 30.0,
            max_pixels: 1,
        };
        let result = backend.reduce_mean(&image, &area(), &params).await;
        assert!(matches!(result, Err(EngineError::TooManyPixels { pixels: 2, .. })));
    }

    #[tokio::test]
    async fn test_monthly_series_over_archive() {
        let backend = archive(vec![
            scene("jan", date(2023, 1, 9), 3.0, vec![sample(0.0, 0, 1000.0, 3000.0)]),
            scene("mar", date(2023, 3, 9), 3.0, vec![sample(0.0, 0, 1000.0, 4000.0)]),
        ]);
        let series = monthly_series(&backend, &area(), 2023, 1, 3).await;
        let months: Vec<&str> = series.points.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2023-01", "2023-03"]);
        assert_eq!(series.points[0].ndvi, 0.5);
        assert_eq!(series.points[1].ndvi, 0.6);
    }

    #[tokio::test]
    async fn test_tiles_unsupported() {
        let backend = archive(vec![]);
        let image = CompositeImage {
            query: CollectionQuery::sentinel2_ndvi(area(), DateRange::month(2022, 1).unwrap()),
        };
        let vis = crate::query::ndvi_vis_params();
        assert!(matches!(
            backend.tile_layer(&image, &vis, "NDVI 2022").await,
            Err(EngineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_archive_json_shape() {
        let json = r#"{
            "collection": "COPERNICUS/S2_SR_HARMONIZED",
            "scenes": [{
                "id": "20230109T045141",
                "acquired": "2023-01-09",
                "cloudy_pixel_percentage": 2.5,
                "samples": [{"lat": 27.7172, "lon": 85.324, "qa60": 0, "b4": 812.0, "b8": 2950.0}]
            }]
        }"#;
        let parsed: SceneArchive = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.scenes[0].acquired, date(2023, 1, 9));
        assert_eq!(parsed.scenes[0].samples[0].qa60, 0);
    }
}
