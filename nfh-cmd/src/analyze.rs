//! Two-year vegetation comparison for one location.

use crate::config::{validate_radius, validate_years, EarthEngineConfig, GeminiConfig};
use anyhow::{anyhow, Context};
use clap::Args;
use log::{error, info, warn};
use nfh_engine::{
    compute_mean, get_composite, monthly_series, ndvi_vis_params, CompositeImage,
    ImageQueryService, LocalArchive, MonthlyIndexSeries, TileLayer,
};
use nfh_geo::{
    AreaOfInterest, DateRange, Gazetteer, LocationQuery, Resolution, ResolvedLocation,
    NEPAL_CENTER,
};
use nfh_report::{
    assess_change, chart_file_name, format_mean, generate_narrative, render_trend_chart, report_file_name,
    series_file_name, series_to_csv, ChangeAssessment, NarrativeContext, NarrativeReport,
    NarrativeService, DEFAULT_GEMINI_MODEL,
};
use nfh_utils::dates::{current_year, month_name};
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// District or protected area name (case-insensitive substring)
    #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
    pub location: Option<String>,

    /// Latitude in decimal degrees (26 to 31)
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees (80 to 89)
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Analysis radius in kilometers (1 to 20)
    #[arg(short, long, default_value_t = 5.0)]
    pub radius_km: f64,

    /// Baseline year
    #[arg(long, default_value_t = 2022)]
    pub year1: i32,

    /// Comparison year
    #[arg(long, default_value_t = 2023)]
    pub year2: i32,

    /// First month of the seasonal window
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub start_month: u32,

    /// Last month of the seasonal window
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub end_month: u32,

    /// Skip the AI-generated report
    #[arg(long)]
    pub no_report: bool,

    /// Directory for the report, trend chart and series CSV
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Read scenes from a local JSON archive instead of Earth Engine
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Google Cloud project registered for Earth Engine
    #[arg(long, env = "GEE_PROJECT_ID", hide_env_values = true)]
    pub gee_project: Option<String>,

    /// OAuth access token for Earth Engine
    #[arg(long, env = "GEE_ACCESS_TOKEN", hide_env_values = true)]
    pub gee_token: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,
}

impl AnalyzeArgs {
    /// Name mode when a location is given, otherwise coordinate mode
    /// defaulting to the centre of Nepal.
    pub fn location_query(&self) -> LocationQuery {
        match &self.location {
            Some(name) => LocationQuery::Name(name.clone()),
            None => LocationQuery::Coordinates {
                lat: self.lat.unwrap_or(NEPAL_CENTER.lat),
                lon: self.lon.unwrap_or(NEPAL_CENTER.lon),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub location: ResolvedLocation,
    pub radius_km: f64,
    pub year1: i32,
    pub year2: i32,
    pub start_month: u32,
    pub end_month: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub request: AnalysisRequest,
    pub area: AreaOfInterest,
    pub mean1: Option<f64>,
    pub mean2: Option<f64>,
    pub assessment: ChangeAssessment,
    pub layer1: Option<TileLayer>,
    pub layer2: Option<TileLayer>,
    pub series: MonthlyIndexSeries,
    /// `None` when no narrative service was configured
    pub narrative: Option<NarrativeReport>,
}

async fn overlay<S: ImageQueryService + ?Sized>(
    images: &S,
    image: &CompositeImage,
    name: &str,
) -> Option<TileLayer> {
    match images.tile_layer(image, &ndvi_vis_params(), name).await {
        Ok(layer) => Some(layer),
        Err(e) => {
            warn!("Could not load layer '{}': {}", name, e);
            None
        }
    }
}

/// Run the full comparison: both seasonal composites and their means, the
/// change assessment, map overlays, the monthly trend of `year2` and, when a
/// narrator is given, the narrative report.
///
/// Composite and mean failures abort the run; overlays, individual months
/// and the narrative degrade without failing it.
pub async fn run_analysis<S: ImageQueryService + ?Sized>(
    images: &S,
    narrator: Option<&dyn NarrativeService>,
    request: &AnalysisRequest,
) -> anyhow::Result<AnalysisOutcome> {
    let area = AreaOfInterest::new(request.location.coordinate, request.radius_km)?;
    let range1 = DateRange::season(request.year1, request.start_month, request.end_month)?;
    let range2 = DateRange::season(request.year2, request.start_month, request.end_month)?;

    info!("Loading Year 1 imagery...");
    let composite1 = get_composite(images, &area, &range1)
        .await
        .with_context(|| format!("loading {} imagery", request.year1))?;
    info!("Loading Year 2 imagery...");
    let composite2 = get_composite(images, &area, &range2)
        .await
        .with_context(|| format!("loading {} imagery", request.year2))?;

    info!("Calculating NDVI values...");
    let mean1 = compute_mean(images, &composite1, &area)
        .await
        .with_context(|| format!("calculating {} NDVI", request.year1))?;
    let mean2 = compute_mean(images, &composite2, &area)
        .await
        .with_context(|| format!("calculating {} NDVI", request.year2))?;
    let assessment = assess_change(mean1, mean2);

    info!("Creating visualizations...");
    let layer1 = overlay(images, &composite1, &format!("NDVI {}", request.year1)).await;
    let layer2 = overlay(images, &composite2, &format!("NDVI {}", request.year2)).await;

    info!("Calculating monthly NDVI values...");
    let series = monthly_series(
        images,
        &area,
        request.year2,
        request.start_month,
        request.end_month,
    )
    .await;
    if series.is_empty() {
        warn!("Unable to generate trend chart. Limited data available for the selected period.");
    }
    info!("Analysis complete!");

    let narrative = match narrator {
        Some(service) => {
            info!("Generating professional report with AI...");
            let ctx = NarrativeContext {
                location_name: request.location.name.clone(),
                coordinate: request.location.coordinate,
                radius_km: request.radius_km,
                start_month: request.start_month,
                end_month: request.end_month,
                year1: request.year1,
                year2: request.year2,
                mean1,
                mean2,
                assessment,
                trend: series.clone(),
            };
            Some(generate_narrative(service, &ctx).await)
        }
        None => None,
    };

    Ok(AnalysisOutcome {
        request: request.clone(),
        area,
        mean1,
        mean2,
        assessment,
        layer1,
        layer2,
        series,
        narrative,
    })
}

/// Terminal summary of an analysis.
pub fn summary_text(outcome: &AnalysisOutcome) -> anyhow::Result<String> {
    let request = &outcome.request;
    let coordinate = request.location.coordinate;
    let mut lines = vec![
        format!("Location: {}", request.location.name),
        format!("Coordinates: {:.2}°N, {:.2}°E", coordinate.lat, coordinate.lon),
        format!(
            "Analyzing {}km radius, {} to {}",
            request.radius_km,
            month_name(request.start_month)?,
            month_name(request.end_month)?
        ),
        format!("Mean NDVI ({}): {}", request.year1, format_mean(outcome.mean1)),
        format!("Mean NDVI ({}): {}", request.year2, format_mean(outcome.mean2)),
        format!("Change: {:+.1}%", outcome.assessment.pct_change),
        String::new(),
        outcome.assessment.tier.headline().to_string(),
        outcome.assessment.alert_message(),
        String::new(),
    ];
    for (year, layer) in [
        (request.year1, &outcome.layer1),
        (request.year2, &outcome.layer2),
    ] {
        match layer {
            Some(layer) => lines.push(format!("{}: {}", layer.name, layer.url_template)),
            None => lines.push(format!("NDVI {year}: layer could not be loaded")),
        }
    }
    if outcome.series.is_empty() {
        lines.push("Monthly trend: not enough data for the selected period".to_string());
    } else {
        lines.push(format!("Monthly NDVI trend ({}):", request.year2));
        for point in &outcome.series.points {
            lines.push(format!("  {}: {:.4}", point.month, point.ndvi));
        }
    }
    if let Some(report) = &outcome.narrative {
        lines.push(String::new());
        lines.push(report.text());
    }
    Ok(lines.join("\n") + "\n")
}

/// Write the report (when generated), trend chart and series CSV to
/// `out_dir`. Returns the written paths.
pub async fn write_outputs(outcome: &AnalysisOutcome, out_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let year2 = outcome.request.year2;
    let mut files: Vec<(PathBuf, String)> = Vec::new();

    if let Some(NarrativeReport::Generated(text)) = &outcome.narrative {
        let name = report_file_name(&outcome.request.location.name, year2);
        files.push((out_dir.join(name), text.clone()));
    }
    let title = format!("Monthly NDVI Trend ({year2})");
    if let Some(svg) = render_trend_chart(&outcome.series, &title)? {
        files.push((out_dir.join(chart_file_name(year2)), svg));
        files.push((
            out_dir.join(series_file_name(year2)),
            series_to_csv(&outcome.series)?,
        ));
    }

    let mut written = Vec::with_capacity(files.len());
    for (path, body) in files {
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

pub async fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    validate_years(args.year1, args.year2, current_year())?;
    validate_radius(args.radius_km)?;

    let gazetteer = Gazetteer::nepal()?;
    let location = match gazetteer.resolve(&args.location_query())? {
        Resolution::Found(location) => location,
        Resolution::NoMatch => {
            println!("No matching locations found");
            return Ok(());
        }
    };

    let images: Box<dyn ImageQueryService> = match &args.archive {
        Some(path) => Box::new(
            LocalArchive::from_path(path)
                .with_context(|| format!("loading archive {}", path.display()))?,
        ),
        None => {
            let config = EarthEngineConfig::new(args.gee_project.clone(), args.gee_token.clone())?;
            info!("Using Earth Engine project {}", config.project_id);
            Box::new(config.client()?)
        }
    };
    let narrator = if args.no_report {
        None
    } else {
        GeminiConfig::from_key(args.gemini_api_key.clone(), &args.gemini_model)
            .map(|config| config.client())
            .transpose()?
    };

    let request = AnalysisRequest {
        location,
        radius_km: args.radius_km,
        year1: args.year1,
        year2: args.year2,
        start_month: args.start_month,
        end_month: args.end_month,
    };
    let narrator_ref = narrator.as_ref().map(|n| n as &dyn NarrativeService);
    match run_analysis(images.as_ref(), narrator_ref, &request).await {
        Ok(outcome) => {
            print!("{}", summary_text(&outcome)?);
            for path in write_outputs(&outcome, &args.out_dir).await? {
                println!("Saved {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("Try adjusting the date range or selecting a different location.");
            Err(anyhow!("Error during analysis: {e:#}"))
        }
    }
}
