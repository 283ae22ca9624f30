use crate::error::{ReportError, Result};
use nfh_engine::MonthlyIndexSeries;
use plotters::prelude::*;

type DrawResult<T, B> =
    std::result::Result<T, DrawingAreaErrorKind<<B as DrawingBackend>::ErrorType>>;

const CHART_SIZE: (u32, u32) = (800, 400);
const TREND_COLOR: RGBColor = RGBColor(26, 152, 80);

/// Render the monthly trend as an SVG line chart with NDVI on a 0..1 axis.
///
/// Returns `None` for an empty series.
pub fn render_trend_chart(series: &MonthlyIndexSeries, title: &str) -> Result<Option<String>> {
    if series.is_empty() {
        return Ok(None);
    }
    let mut svg = String::new();
    draw_trend(&mut svg, series, title).map_err(|e| ReportError::Chart(e.to_string()))?;
    Ok(Some(svg))
}

fn draw_trend<'a>(
    svg: &'a mut String,
    series: &MonthlyIndexSeries,
    title: &str,
) -> DrawResult<(), SVGBackend<'a>> {
    let labels: Vec<&str> = series.points.iter().map(|p| p.month.as_str()).collect();
    let x_max = (labels.len() as i32 - 1).max(1);

    let root = SVGBackend::with_string(svg, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(20i32)
        .x_label_area_size(40u32)
        .y_label_area_size(50u32)
        .build_cartesian_2d(0i32..x_max, 0f64..1f64)?;

    let label_at = |x: &i32| {
        usize::try_from(*x)
            .ok()
            .and_then(|i| labels.get(i))
            .map(|l| l.to_string())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&label_at)
        .x_desc("Month")
        .y_desc("NDVI")
        .draw()?;

    let points: Vec<(i32, f64)> = series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as i32, p.ndvi))
        .collect();
    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        TREND_COLOR.stroke_width(2),
    ))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, TREND_COLOR.filled())),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfh_engine::SeriesPoint;

    #[test]
    fn test_empty_series_has_no_chart() {
        let chart = render_trend_chart(&MonthlyIndexSeries::default(), "NDVI Trend").unwrap();
        assert!(chart.is_none());
    }

    #[test]
    fn test_trend_chart_svg() {
        let series = MonthlyIndexSeries {
            points: vec![
                SeriesPoint { month: "2023-01".into(), ndvi: 0.41 },
                SeriesPoint { month: "2023-02".into(), ndvi: 0.43 },
                SeriesPoint { month: "2023-03".into(), ndvi: 0.47 },
            ],
        };
        let svg = render_trend_chart(&series, "Monthly NDVI Trend (2023)")
            .unwrap()
            .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Monthly NDVI Trend (2023)"));
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_single_point_chart() {
        let series = MonthlyIndexSeries {
            points: vec![SeriesPoint { month: "2023-01".into(), ndvi: 0.5 }],
        };
        let svg = render_trend_chart(&series, "NDVI").unwrap().unwrap();
        assert_eq!(svg.matches("<circle").count(), 1);
    }
}
