//! Natural-language forest health report.

use crate::{assessment::ChangeAssessment, error::Result};
use async_trait::async_trait;
use log::warn;
use nfh_engine::MonthlyIndexSeries;
use nfh_geo::Coordinate;
use nfh_utils::dates::month_name;
use serde::{Deserialize, Serialize};

pub const REPORT_ERROR_PREFIX: &str = "Error generating report: ";

/// Everything the report prompt is rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeContext {
    pub location_name: String,
    pub coordinate: Coordinate,
    pub radius_km: f64,
    pub start_month: u32,
    pub end_month: u32,
    pub year1: i32,
    pub year2: i32,
    pub mean1: Option<f64>,
    pub mean2: Option<f64>,
    pub assessment: ChangeAssessment,
    /// Monthly trend of `year2`; omitted from the prompt when empty
    pub trend: MonthlyIndexSeries,
}

/// A mean of exactly zero is reported as missing, like an absent one.
pub fn format_mean(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 => format!("{v:.4}"),
        _ => "N/A".to_string(),
    }
}

fn trend_line(year: i32, trend: &MonthlyIndexSeries) -> String {
    if trend.is_empty() {
        return String::new();
    }
    let values: Vec<String> = trend
        .points
        .iter()
        .map(|p| format!("{}: {}", p.month, p.ndvi))
        .collect();
    format!("- Monthly NDVI values for {year}: {}", values.join(", "))
}

/// Render the fixed report instructions for `ctx`.
pub fn build_prompt(ctx: &NarrativeContext) -> Result<String> {
    let start = month_name(ctx.start_month)?;
    let end = month_name(ctx.end_month)?;
    Ok(format!(
        "You are an expert environmental scientist specializing in forest conservation and \
satellite-based monitoring in Nepal. Generate a professional forest health assessment report \
based on the following satellite data analysis:

**ANALYSIS PARAMETERS:**
- Location: {location}
- Coordinates: {lat:.4}°N, {lon:.4}°E
- Analysis Radius: {radius} km
- Analysis Period: {start} to {end}
- Comparison Years: {year1} vs {year2}

**SATELLITE DATA (Sentinel-2 NDVI Analysis):**
- Mean NDVI {year1}: {mean1}
- Mean NDVI {year2}: {mean2}
- NDVI Change: {pct:+.2}%
- Status: {status}
{trend}

**INSTRUCTIONS:**
Write a comprehensive but concise forest health report with the following sections:
1. **Executive Summary** (2-3 sentences)
2. **Key Findings** (bullet points)
3. **Vegetation Health Analysis** (based on NDVI values)
4. **Risk Assessment** (if degradation detected)
5. **Recommendations** (actionable steps for forest management)

Use professional scientific language. Include specific numbers from the data. Keep the report under 400 words.
",
        location = ctx.location_name,
        lat = ctx.coordinate.lat,
        lon = ctx.coordinate.lon,
        radius = ctx.radius_km,
        year1 = ctx.year1,
        year2 = ctx.year2,
        mean1 = format_mean(ctx.mean1),
        mean2 = format_mean(ctx.mean2),
        pct = ctx.assessment.pct_change,
        status = ctx.assessment.tier.status_line(),
        trend = trend_line(ctx.year2, &ctx.trend),
    ))
}

/// A text-generation backend.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Outcome of a narrative request. Failures are values so the rest of the
/// analysis can still be shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NarrativeReport {
    Generated(String),
    Failed(String),
}

impl NarrativeReport {
    pub fn is_generated(&self) -> bool {
        matches!(self, NarrativeReport::Generated(_))
    }

    /// Text shown to the user; failures carry the error prefix.
    pub fn text(&self) -> String {
        match self {
            NarrativeReport::Generated(text) => text.clone(),
            NarrativeReport::Failed(message) => format!("{REPORT_ERROR_PREFIX}{message}"),
        }
    }
}

/// Ask `service` for a report on `ctx`. Any error is folded into
/// [`NarrativeReport::Failed`].
pub async fn generate_narrative<S: NarrativeService + ?Sized>(
    service: &S,
    ctx: &NarrativeContext,
) -> NarrativeReport {
    let result = match build_prompt(ctx) {
        Ok(prompt) => service.generate(&prompt).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(text) => NarrativeReport::Generated(text),
        Err(e) => {
            warn!("Report generation failed: {}", e);
            NarrativeReport::Failed(e.to_string())
        }
    }
}
