//! Composite, mean and monthly-series computations over an
//! [`ImageQueryService`].

use crate::{
    error::Result,
    query::{CollectionQuery, CompositeImage, ReduceParams},
    service::ImageQueryService,
};
use log::{debug, warn};
use nfh_geo::{AreaOfInterest, DateRange};
use nfh_utils::dates::{month_label, months_between};
use serde::{Deserialize, Serialize};

/// Request the cloud-masked NDVI composite for `area` over `range`.
///
/// Backend errors propagate unchanged.
pub async fn get_composite<S: ImageQueryService + ?Sized>(
    service: &S,
    area: &AreaOfInterest,
    range: &DateRange,
) -> Result<CompositeImage> {
    let query = CollectionQuery::sentinel2_ndvi(*area, *range);
    debug!(
        "Composite {} from {} to {} around {:.4},{:.4} r={}m",
        query.collection,
        range.start(),
        range.end(),
        area.center.lat,
        area.center.lon,
        area.radius_m()
    );
    service.composite(&query).await
}

/// Mean index value of `image` over `area` at 30 m with the default pixel cap.
pub async fn compute_mean<S: ImageQueryService + ?Sized>(
    service: &S,
    image: &CompositeImage,
    area: &AreaOfInterest,
) -> Result<Option<f64>> {
    service
        .reduce_mean(image, area, &ReduceParams::default())
        .await
}

/// What happened when computing one month of the trend series.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthOutcome {
    /// Mean index value, rounded to 4 decimals
    Value(f64),
    /// No scene passed the filters
    NoImages,
    /// Scenes existed but no valid pixel survived masking
    NoValue,
    /// The backend failed for this month
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthResult {
    pub year: i32,
    pub month: u32,
    pub outcome: MonthOutcome,
}

/// One chart point: "YYYY-MM" and its mean NDVI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub month: String,
    pub ndvi: f64,
}

/// Chronological monthly means; months without a value are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyIndexSeries {
    pub points: Vec<SeriesPoint>,
}

impl MonthlyIndexSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl From<&[MonthResult]> for MonthlyIndexSeries {
    fn from(results: &[MonthResult]) -> Self {
        let points = results
            .iter()
            .filter_map(|result| match result.outcome {
                MonthOutcome::Value(ndvi) => Some(SeriesPoint {
                    month: month_label(result.year, result.month),
                    ndvi,
                }),
                _ => None,
            })
            .collect();
        MonthlyIndexSeries { points }
    }
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

async fn month_value<S: ImageQueryService + ?Sized>(
    service: &S,
    area: &AreaOfInterest,
    year: i32,
    month: u32,
) -> Result<MonthOutcome> {
    let range = DateRange::month(year, month)?;
    let query = CollectionQuery::sentinel2_ndvi(*area, range);
    if service.image_count(&query).await? == 0 {
        return Ok(MonthOutcome::NoImages);
    }
    let image = service.composite(&query).await?;
    let outcome = match compute_mean(service, &image, area).await? {
        Some(mean) => MonthOutcome::Value(round4(mean)),
        None => MonthOutcome::NoValue,
    };
    Ok(outcome)
}

/// Evaluate every month from `start_month` through `end_month` of `year`.
///
/// A failing month is recorded as [`MonthOutcome::Failed`] and the loop
/// moves on to the next month.
pub async fn monthly_outcomes<S: ImageQueryService + ?Sized>(
    service: &S,
    area: &AreaOfInterest,
    year: i32,
    start_month: u32,
    end_month: u32,
) -> Vec<MonthResult> {
    let mut results = Vec::new();
    for month in months_between(start_month, end_month) {
        let outcome = match month_value(service, area, year, month).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Skipping {}: {}", month_label(year, month), e);
                MonthOutcome::Failed(e.to_string())
            }
        };
        debug!("{}: {:?}", month_label(year, month), outcome);
        results.push(MonthResult {
            year,
            month,
            outcome,
        });
    }
    results
}

/// Monthly NDVI trend for `year`, skipping months without a value.
pub async fn monthly_series<S: ImageQueryService + ?Sized>(
    service: &S,
    area: &AreaOfInterest,
    year: i32,
    start_month: u32,
    end_month: u32,
) -> MonthlyIndexSeries {
    let results = monthly_outcomes(service, area, year, start_month, end_month).await;
    MonthlyIndexSeries::from(results.as_slice())
}
