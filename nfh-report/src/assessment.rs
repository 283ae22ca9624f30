//! Percentage change between the two comparison years and the health tier
//! it maps to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Change below this percentage is a significant loss.
pub const CRITICAL_THRESHOLD_PCT: f64 = -10.0;
/// Change below this percentage is a moderate loss.
pub const WARNING_THRESHOLD_PCT: f64 = -5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthTier {
    Critical,
    Warning,
    Stable,
    Healthy,
}

impl HealthTier {
    /// Tiers are evaluated in order; the first matching bound wins.
    pub fn from_pct_change(pct: f64) -> HealthTier {
        if pct < CRITICAL_THRESHOLD_PCT {
            HealthTier::Critical
        } else if pct < WARNING_THRESHOLD_PCT {
            HealthTier::Warning
        } else if pct < 0.0 {
            HealthTier::Stable
        } else {
            HealthTier::Healthy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthTier::Critical => "CRITICAL",
            HealthTier::Warning => "WARNING",
            HealthTier::Stable => "STABLE",
            HealthTier::Healthy => "HEALTHY",
        }
    }

    /// Status line given to the language model.
    pub fn status_line(&self) -> &'static str {
        match self {
            HealthTier::Critical => "CRITICAL - Significant Degradation Detected",
            HealthTier::Warning => "WARNING - Moderate Vegetation Loss",
            HealthTier::Stable => "STABLE - Minor Changes Within Normal Range",
            HealthTier::Healthy => "HEALTHY - Vegetation Stable or Improving",
        }
    }

    /// Alert headline shown in the terminal summary.
    pub fn headline(&self) -> &'static str {
        match self {
            HealthTier::Critical => "DEGRADATION ALERT",
            HealthTier::Warning => "MODERATE CHANGE",
            HealthTier::Stable => "MINOR CHANGE",
            HealthTier::Healthy => "FOREST HEALTH STABLE",
        }
    }
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeAssessment {
    pub pct_change: f64,
    pub tier: HealthTier,
}

impl ChangeAssessment {
    /// One-sentence explanation printed under the headline.
    pub fn alert_message(&self) -> String {
        let pct = self.pct_change;
        match self.tier {
            HealthTier::Critical => format!(
                "Significant vegetation loss detected! NDVI has dropped by {:.1}%. \
                 This indicates potential forest degradation, deforestation, or \
                 environmental stress in the selected area.",
                pct.abs()
            ),
            HealthTier::Warning => format!(
                "NDVI has decreased by {:.1}%. Some vegetation change detected. \
                 Continue monitoring this area.",
                pct.abs()
            ),
            HealthTier::Stable => format!(
                "NDVI has changed by {pct:.1}%. Change is within normal seasonal variation."
            ),
            HealthTier::Healthy if pct > 0.0 => format!(
                "NDVI has increased by {pct:.1}%. The forest appears healthy with no \
                 significant degradation."
            ),
            HealthTier::Healthy => "NDVI has remained stable. The forest appears healthy \
                                    with no significant degradation."
                .to_string(),
        }
    }
}

/// Percent change from the first-year mean to the second-year mean.
///
/// The change is 0 when either mean is absent or the first mean is 0.
pub fn assess_change(first: Option<f64>, second: Option<f64>) -> ChangeAssessment {
    let pct_change = match (first, second) {
        (Some(v1), Some(v2)) if v1 != 0.0 => (v2 - v1) / v1 * 100.0,
        _ => 0.0,
    };
    ChangeAssessment {
        pct_change,
        tier: HealthTier::from_pct_change(pct_change),
    }
}
