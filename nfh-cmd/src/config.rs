//! Credentials and input limits, validated before any backend is built.

use log::warn;
use nfh_engine::{earth_engine::EE_API_BASE, EarthEngineClient};
use nfh_report::{gemini::GEMINI_API_BASE, GeminiClient};
use thiserror::Error;

/// Value shipped in the sample environment file; treated as unset.
pub const GEMINI_KEY_PLACEHOLDER: &str = "your_gemini_api_key_here";

/// First year with full Sentinel-2 L2A coverage.
pub const MIN_YEAR: i32 = 2019;
pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 20.0;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("GEE_PROJECT_ID not set. Pass --gee-project or export GEE_PROJECT_ID=your_project_id")]
    MissingProjectId,

    #[error("GEE_ACCESS_TOKEN not set. Pass --gee-token or export the output of `gcloud auth print-access-token`")]
    MissingAccessToken,

    #[error("{name} must be between {min} and {max}, got {value}")]
    YearOutOfRange {
        name: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("Radius must be between 1 and 20 km, got {0}")]
    RadiusOutOfRange(f64),
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarthEngineConfig {
    pub project_id: String,
    pub access_token: String,
    pub base_url: String,
}

impl EarthEngineConfig {
    pub fn new(
        project_id: Option<String>,
        access_token: Option<String>,
    ) -> Result<EarthEngineConfig, ConfigError> {
        let project_id = non_empty(project_id).ok_or(ConfigError::MissingProjectId)?;
        let access_token = non_empty(access_token).ok_or(ConfigError::MissingAccessToken)?;
        Ok(EarthEngineConfig {
            project_id,
            access_token,
            base_url: EE_API_BASE.to_string(),
        })
    }

    pub fn client(&self) -> nfh_engine::Result<EarthEngineClient> {
        Ok(EarthEngineClient::new(&self.project_id, &self.access_token)?
            .with_base_url(&self.base_url))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    /// `None`, with a warning, when the key is missing or still the placeholder.
    pub fn from_key(api_key: Option<String>, model: &str) -> Option<GeminiConfig> {
        match non_empty(api_key) {
            Some(key) if key != GEMINI_KEY_PLACEHOLDER => Some(GeminiConfig {
                api_key: key,
                model: model.to_string(),
                base_url: GEMINI_API_BASE.to_string(),
            }),
            _ => {
                warn!("GEMINI_API_KEY not found. Set it to generate AI reports.");
                None
            }
        }
    }

    pub fn client(&self) -> nfh_report::Result<GeminiClient> {
        Ok(GeminiClient::new(&self.api_key, &self.model)?.with_base_url(&self.base_url))
    }
}

/// Comparison years: the baseline must precede the current year, the
/// comparison year may be the current year.
pub fn validate_years(year1: i32, year2: i32, current_year: i32) -> Result<(), ConfigError> {
    if !(MIN_YEAR..current_year).contains(&year1) {
        return Err(ConfigError::YearOutOfRange {
            name: "year1",
            value: year1,
            min: MIN_YEAR,
            max: current_year - 1,
        });
    }
    if !(MIN_YEAR..=current_year).contains(&year2) {
        return Err(ConfigError::YearOutOfRange {
            name: "year2",
            value: year2,
            min: MIN_YEAR,
            max: current_year,
        });
    }
    Ok(())
}

pub fn validate_radius(radius_km: f64) -> Result<(), ConfigError> {
    if (MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
        Ok(())
    } else {
        Err(ConfigError::RadiusOutOfRange(radius_km))
    }
}
