//! Grading of predicted labels against the observed move.

use crate::domain::event::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_THRESHOLD_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    Correct,
    Incorrect,
}

impl Correctness {
    pub fn as_str(self) -> &'static str {
        match self {
            Correctness::Correct => "correct",
            Correctness::Incorrect => "incorrect",
        }
    }
}

impl fmt::Display for Correctness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label the observed move itself earns under `threshold`.
pub fn observed_label(pct_change: f64, threshold: f64) -> Label {
    if pct_change > threshold {
        Label::Positive
    } else if pct_change < -threshold {
        Label::Negative
    } else {
        Label::Neutral
    }
}

/// positive: change > threshold; negative: change < -threshold;
/// neutral: |change| <= threshold.
pub fn grade(predicted: Label, pct_change: f64, threshold: f64) -> Correctness {
    let hit = match predicted {
        Label::Positive => pct_change > threshold,
        Label::Negative => pct_change < -threshold,
        Label::Neutral => pct_change.abs() <= threshold,
    };
    if hit {
        Correctness::Correct
    } else {
        Correctness::Incorrect
    }
}
