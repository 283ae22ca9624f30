//! Report orchestration for forest health analysis.
//!
//! Turns the two period means and the monthly trend into a change
//! assessment, a natural-language report, an SVG trend chart and a CSV of
//! the series.

pub mod assessment;
pub mod chart;
pub mod error;
pub mod export;
pub mod narrative;

#[cfg(feature = "api")]
pub mod gemini;

pub use assessment::{assess_change, ChangeAssessment, HealthTier};
pub use chart::render_trend_chart;
pub use error::{ReportError, Result};
pub use export::{chart_file_name, report_file_name, series_file_name, series_to_csv};
pub use narrative::{
    build_prompt, format_mean, generate_narrative, NarrativeContext, NarrativeReport, NarrativeService,
};

#[cfg(feature = "api")]
pub use gemini::{GeminiClient, DEFAULT_GEMINI_MODEL};
