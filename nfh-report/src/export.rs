use crate::error::{ReportError, Result};
use nfh_engine::MonthlyIndexSeries;

/// `forest_health_report_<location>_<year>.txt`, spaces replaced by `_`.
pub fn report_file_name(location: &str, year: i32) -> String {
    format!(
        "forest_health_report_{}_{}.txt",
        location.replace(' ', "_"),
        year
    )
}

pub fn chart_file_name(year: i32) -> String {
    format!("ndvi_trend_{year}.svg")
}

pub fn series_file_name(year: i32) -> String {
    format!("ndvi_trend_{year}.csv")
}

/// Serialize the series as `month,ndvi` CSV.
pub fn series_to_csv(series: &MonthlyIndexSeries) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in &series.points {
        writer.serialize(point)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::Encoding(e.to_string()))
}
