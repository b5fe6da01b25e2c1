//! Historical baseline of horizon-day percentage changes per proxy.
//!
//! Windows overlap with stride 1 over the trading-day sequence, so consecutive
//! samples share most of their path and are serially correlated. This is
//! accepted: the goal is the widest sample of the distribution's tails, not
//! independent draws.

use crate::domain::error::BillpulseError;
use crate::domain::price_series::PriceSeries;
use crate::domain::sector::Sector;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_HORIZON_DAYS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineStats {
    pub ticker: String,
    pub mean_change: f64,
    /// Sample standard deviation. Never negative.
    pub std_change: f64,
    pub sample_size: usize,
    pub horizon_days: usize,
}

/// All overlapping `horizon`-step percentage changes in `series`.
pub fn horizon_changes(series: &PriceSeries, horizon: usize) -> Result<Vec<f64>, BillpulseError> {
    let points = series.points();
    if horizon == 0 || points.len() <= horizon {
        return Ok(Vec::new());
    }

    let mut changes = Vec::with_capacity(points.len() - horizon);
    for i in 0..points.len() - horizon {
        let start = points[i].close;
        if start == 0.0 {
            return Err(BillpulseError::DivisionByZero {
                context: format!("{} close on {} is zero", series.ticker(), points[i].date),
            });
        }
        let end = points[i + horizon].close;
        changes.push((end - start) / start * 100.0);
    }
    Ok(changes)
}

/// (mean, sample standard deviation). Identical samples, including a single
/// one, have exactly zero spread.
fn mean_std(values: &[f64]) -> (f64, f64) {
    let Some(&first) = values.first() else {
        return (0.0, 0.0);
    };
    let n = values.len();
    if values.iter().all(|v| *v == first) {
        return (first, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let sq_diff: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (sq_diff / (n - 1) as f64).sqrt())
}

pub fn compute_baseline(
    series: &PriceSeries,
    horizon_days: usize,
) -> Result<BaselineStats, BillpulseError> {
    let minimum = horizon_days + 1;
    if horizon_days == 0 || series.len() < minimum {
        return Err(BillpulseError::InsufficientData {
            ticker: series.ticker().to_string(),
            points: series.len(),
            minimum,
        });
    }

    let changes = horizon_changes(series, horizon_days)?;
    let (mean_change, std_change) = mean_std(&changes);
    if !mean_change.is_finite() || !std_change.is_finite() {
        return Err(BillpulseError::InvalidPrice {
            context: format!(
                "{} baseline is not finite (mean {}, std {})",
                series.ticker(),
                mean_change,
                std_change
            ),
        });
    }

    Ok(BaselineStats {
        ticker: series.ticker().to_string(),
        mean_change,
        std_change,
        sample_size: changes.len(),
        horizon_days,
    })
}

/// Per-sector baselines for one run, plus the sectors whose baseline failed.
#[derive(Debug, Default)]
pub struct BaselineTable {
    stats: BTreeMap<Sector, BaselineStats>,
    failures: BTreeMap<Sector, BillpulseError>,
}

impl BaselineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sector: Sector, stats: BaselineStats) {
        self.failures.remove(&sector);
        self.stats.insert(sector, stats);
    }

    pub fn record_failure(&mut self, sector: Sector, error: BillpulseError) {
        self.stats.remove(&sector);
        self.failures.insert(sector, error);
    }

    pub fn get(&self, sector: Sector) -> Option<&BaselineStats> {
        self.stats.get(&sector)
    }

    pub fn failure(&self, sector: Sector) -> Option<&BillpulseError> {
        self.failures.get(&sector)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sector, &BaselineStats)> {
        self.stats.iter().map(|(s, b)| (*s, b))
    }

    pub fn failures(&self) -> impl Iterator<Item = (Sector, &BillpulseError)> {
        self.failures.iter().map(|(s, e)| (*s, e))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::PricePoint;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        PriceSeries::new(
            "XLV",
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint {
                    date: start + Duration::days(i as i64),
                    close,
                })
                .collect(),
        )
    }

    #[test]
    fn horizon_changes_overlap_with_stride_one() {
        let s = series(&[100.0, 110.0, 121.0, 100.0]);
        let changes = horizon_changes(&s, 1).unwrap();
        assert_eq!(changes.len(), 3);
        assert_relative_eq!(changes[0], 10.0);
        assert_relative_eq!(changes[1], 10.0);
        assert_relative_eq!(changes[2], (100.0 - 121.0) / 121.0 * 100.0);

        let changes = horizon_changes(&s, 2).unwrap();
        assert_eq!(changes.len(), 2);
        assert_relative_eq!(changes[0], 21.0, epsilon = 1e-9);
    }

    #[test]
    fn baseline_mean_and_sample_std() {
        // Changes: +10, -10, +10, -10
        let s = series(&[100.0, 110.0, 99.0, 108.9, 98.01]);
        let stats = compute_baseline(&s, 1).unwrap();
        assert_eq!(stats.sample_size, 4);
        assert_eq!(stats.horizon_days, 1);
        assert_relative_eq!(stats.mean_change, 0.0, epsilon = 1e-9);
        // sqrt(4 * 100 / 3)
        assert_relative_eq!(stats.std_change, (400.0_f64 / 3.0).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn exactly_horizon_plus_one_points() {
        let s = series(&[100.0, 101.0, 102.0, 105.0]);
        let stats = compute_baseline(&s, 3).unwrap();
        assert_eq!(stats.sample_size, 1);
        assert_relative_eq!(stats.mean_change, 5.0);
        assert_relative_eq!(stats.std_change, 0.0);
    }

    #[test]
    fn too_few_points_is_insufficient() {
        let s = series(&[100.0, 101.0, 102.0]);
        let err = compute_baseline(&s, 3).unwrap_err();
        assert!(matches!(
            err,
            BillpulseError::InsufficientData { points: 3, minimum: 4, .. }
        ));
    }

    #[test]
    fn empty_series_is_insufficient() {
        let err = compute_baseline(&PriceSeries::empty("XLB"), 30).unwrap_err();
        assert!(matches!(err, BillpulseError::InsufficientData { points: 0, .. }));
    }

    #[test]
    fn flat_series_has_zero_std() {
        let s = series(&[50.0; 40]);
        let stats = compute_baseline(&s, 30).unwrap();
        assert_eq!(stats.sample_size, 10);
        assert_relative_eq!(stats.mean_change, 0.0);
        assert_relative_eq!(stats.std_change, 0.0);
    }

    #[test]
    fn zero_price_is_division_by_zero() {
        let s = series(&[100.0, 0.0, 50.0, 60.0]);
        assert!(matches!(
            compute_baseline(&s, 1),
            Err(BillpulseError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn non_finite_close_is_invalid_price() {
        for bad in [f64::NAN, f64::INFINITY] {
            let s = series(&[100.0, bad, 102.0, 101.0]);
            let err = compute_baseline(&s, 1).unwrap_err();
            assert!(
                matches!(err, BillpulseError::InvalidPrice { .. }),
                "close {bad}: got {err}"
            );
        }
    }

    #[test]
    fn table_insert_clears_failure() {
        let mut table = BaselineTable::new();
        table.record_failure(
            Sector::Energy,
            BillpulseError::NoData {
                ticker: "XLE".into(),
            },
        );
        assert!(table.get(Sector::Energy).is_none());
        assert!(table.failure(Sector::Energy).is_some());

        let stats = compute_baseline(&series(&[1.0, 2.0, 3.0]), 1).unwrap();
        table.insert(Sector::Energy, stats);
        assert!(table.failure(Sector::Energy).is_none());
        assert_eq!(table.len(), 1);
    }
}
