//! Aggregate views over graded events.

use crate::domain::deviation::Severity;
use crate::domain::engine::AnomalyResult;
use crate::domain::event::Label;
use crate::domain::grader::Correctness;
use crate::domain::sector::Sector;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub severity_counts: BTreeMap<Severity, usize>,
    pub correct: usize,
    pub incorrect: usize,
    pub sector_severity: BTreeMap<Sector, BTreeMap<Severity, usize>>,
    pub z_scores: Vec<f64>,
}

impl Summary {
    pub fn compute(results: &[AnomalyResult]) -> Self {
        let mut summary = Summary {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            *summary.severity_counts.entry(r.severity).or_insert(0) += 1;
            *summary
                .sector_severity
                .entry(r.sector)
                .or_default()
                .entry(r.severity)
                .or_insert(0) += 1;
            match r.correctness {
                Correctness::Correct => summary.correct += 1,
                Correctness::Incorrect => summary.incorrect += 1,
            }
            summary.z_scores.push(r.z_score);
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.severity_counts.get(&severity).copied().unwrap_or(0)
    }

    /// Fraction of graded events whose prediction was correct; 0 when empty.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn share(&self, severity: Severity) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(severity) as f64 / self.total as f64
        }
    }
}

/// Average move of one sector/label group against the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorComparison {
    pub sector: Sector,
    pub label: Label,
    pub count: usize,
    pub avg_pct_change: f64,
    pub vs_benchmark_diff: f64,
}

/// Groups directional predictions by (sector, predicted label) and compares
/// their mean move to `benchmark_change_pct`. Neutral predictions are left out.
pub fn compare_to_benchmark(
    results: &[AnomalyResult],
    benchmark_change_pct: f64,
) -> Vec<SectorComparison> {
    let mut groups: BTreeMap<(Sector, &'static str), (Label, usize, f64)> = BTreeMap::new();
    for r in results.iter().filter(|r| r.predicted_label != Label::Neutral) {
        let entry = groups
            .entry((r.sector, r.predicted_label.as_str()))
            .or_insert((r.predicted_label, 0, 0.0));
        entry.1 += 1;
        entry.2 += r.pct_change;
    }

    groups
        .into_iter()
        .map(|((sector, _), (label, count, sum))| {
            let avg = sum / count as f64;
            SectorComparison {
                sector,
                label,
                count,
                avg_pct_change: avg,
                vs_benchmark_diff: avg - benchmark_change_pct,
            }
        })
        .collect()
}
