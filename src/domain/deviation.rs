//! Standardized deviation of an observed move against its sector baseline.

use crate::domain::baseline::BaselineStats;
use crate::domain::error::BillpulseError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MODERATE_Z: f64 = 1.0;
pub const MAJOR_Z: f64 = 2.0;

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    NormalRange,
    ModerateAnomaly,
    MajorAnomaly,
}

impl Severity {
    pub const ALL: [Severity; 3] = [
        Severity::NormalRange,
        Severity::ModerateAnomaly,
        Severity::MajorAnomaly,
    ];

    /// Boundary values fall into the lower tier.
    pub fn from_z(z_score: f64) -> Self {
        let magnitude = z_score.abs();
        if magnitude > MAJOR_Z {
            Severity::MajorAnomaly
        } else if magnitude > MODERATE_Z {
            Severity::ModerateAnomaly
        } else {
            Severity::NormalRange
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::NormalRange => "normal_range",
            Severity::ModerateAnomaly => "moderate_anomaly",
            Severity::MajorAnomaly => "major_anomaly",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn z_score(pct_change: f64, baseline: &BaselineStats) -> Result<f64, BillpulseError> {
    if !baseline.std_change.is_finite()
        || !baseline.mean_change.is_finite()
        || !pct_change.is_finite()
    {
        return Err(BillpulseError::InvalidPrice {
            context: format!(
                "{} z-score inputs are not finite (change {}, mean {}, std {})",
                baseline.ticker, pct_change, baseline.mean_change, baseline.std_change
            ),
        });
    }
    if baseline.std_change == 0.0 {
        return Err(BillpulseError::DivisionByZero {
            context: format!("{} baseline has zero standard deviation", baseline.ticker),
        });
    }
    Ok((pct_change - baseline.mean_change) / baseline.std_change)
}

pub fn classify(
    pct_change: f64,
    baseline: &BaselineStats,
) -> Result<(f64, Severity), BillpulseError> {
    let z = z_score(pct_change, baseline)?;
    Ok((z, Severity::from_z(z)))
}
