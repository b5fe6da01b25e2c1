//! Batch anomaly pipeline.
//!
//! Stages: validate event records, compute one baseline per sector, fetch one
//! event-window series per sector, then sample, classify and grade each event.
//! Failures are local to an event or a sector and never abort the batch.

use crate::domain::baseline::{BaselineStats, BaselineTable, compute_baseline};
use crate::domain::deviation::{Severity, classify};
use crate::domain::error::BillpulseError;
use crate::domain::event::{Event, EventRecord, Label};
use crate::domain::grader::{Correctness, grade, observed_label};
use crate::domain::price_series::PriceSeries;
use crate::domain::sampler::{ObservedMove, SampleWindow, StartPoint, sample};
use crate::domain::sector::Sector;
use crate::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub baseline_start: NaiveDate,
    pub baseline_end: NaiveDate,
    pub horizon_days: usize,
    pub window: SampleWindow,
    pub threshold: f64,
}

/// One graded event. Field names are the hand-off contract with reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyResult {
    pub bill_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub sector: Sector,
    pub ticker: String,
    pub predicted_label: Label,
    pub observed_label: Label,
    pub date_before: NaiveDate,
    pub price_before: f64,
    pub date_after: NaiveDate,
    pub price_after: f64,
    pub pct_change: f64,
    pub z_score: f64,
    pub severity: Severity,
    pub correctness: Correctness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    InsufficientData,
    DivisionByZero,
    InvalidPrice,
    InvalidLabel,
    UnknownSector,
    InvalidEvent,
    NoData,
    Fetch,
}

impl FailureKind {
    pub fn of(err: &BillpulseError) -> Self {
        match err {
            BillpulseError::NotFound { .. } => FailureKind::NotFound,
            BillpulseError::InsufficientData { .. } => FailureKind::InsufficientData,
            BillpulseError::DivisionByZero { .. } => FailureKind::DivisionByZero,
            BillpulseError::InvalidPrice { .. } => FailureKind::InvalidPrice,
            BillpulseError::InvalidLabel { .. } => FailureKind::InvalidLabel,
            BillpulseError::UnknownSector { .. } => FailureKind::UnknownSector,
            BillpulseError::EventParse { .. } => FailureKind::InvalidEvent,
            BillpulseError::NoData { .. } => FailureKind::NoData,
            _ => FailureKind::Fetch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFailure {
    pub bill_id: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl EventFailure {
    fn new(bill_id: &str, err: &BillpulseError) -> Self {
        Self {
            bill_id: bill_id.to_string(),
            kind: FailureKind::of(err),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub results: Vec<AnomalyResult>,
    pub failures: Vec<EventFailure>,
    pub baselines: BaselineTable,
}

impl AnalysisReport {
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn skipped(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.processed() + self.skipped()
    }

    pub fn failure_counts(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for f in &self.failures {
            *counts.entry(f.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Validates raw records. Rejected records come back as failures.
pub fn validate_events(records: &[EventRecord]) -> (Vec<Event>, Vec<EventFailure>) {
    let mut events = Vec::with_capacity(records.len());
    let mut failures = Vec::new();
    for record in records {
        match Event::try_from(record) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(bill_id = %record.bill_id, error = %e, "rejecting event");
                failures.push(EventFailure::new(&record.bill_id, &e));
            }
        }
    }
    (events, failures)
}

/// Fetches the baseline range for `sector` and computes its statistics.
pub fn compute_sector_baseline(
    data_port: &dyn DataPort,
    sector: Sector,
    start: NaiveDate,
    end: NaiveDate,
    horizon_days: usize,
) -> Result<BaselineStats, BillpulseError> {
    let series = data_port.fetch_series(sector.ticker(), start, end)?;
    if series.is_empty() {
        return Err(BillpulseError::NoData {
            ticker: sector.ticker().to_string(),
        });
    }
    compute_baseline(&series, horizon_days)
}

pub fn compute_baselines(
    data_port: &dyn DataPort,
    sectors: &BTreeSet<Sector>,
    start: NaiveDate,
    end: NaiveDate,
    horizon_days: usize,
) -> BaselineTable {
    let mut table = BaselineTable::new();
    for &sector in sectors {
        match compute_sector_baseline(data_port, sector, start, end, horizon_days) {
            Ok(stats) => {
                info!(
                    sector = %sector,
                    ticker = sector.ticker(),
                    mean = stats.mean_change,
                    std = stats.std_change,
                    samples = stats.sample_size,
                    "baseline computed"
                );
                table.insert(sector, stats);
            }
            Err(e) => {
                warn!(sector = %sector, error = %e, "baseline unavailable");
                table.record_failure(sector, e);
            }
        }
    }
    table
}

/// Calendar range a series must cover to sample every date in `dates`.
pub fn event_fetch_range(
    dates: impl IntoIterator<Item = NaiveDate>,
    window: &SampleWindow,
) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = dates.into_iter();
    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

    let lead = match window.start {
        StartPoint::Before { window_days } => i64::from(window_days),
        StartPoint::OnDate { .. } => 0,
    };
    let tail = i64::from(window.after_horizon_days) + i64::from(window.after_window_days);
    Some((min - Duration::days(lead), max + Duration::days(tail)))
}

/// Samples, classifies and grades a single event.
pub fn analyze_event(
    event: &Event,
    series: &PriceSeries,
    baseline: &BaselineStats,
    window: &SampleWindow,
    threshold: f64,
) -> Result<AnomalyResult, BillpulseError> {
    let ObservedMove {
        date_before,
        price_before,
        date_after,
        price_after,
        pct_change,
    } = sample(series, event.date, window)?.ok_or_else(|| BillpulseError::NotFound {
        ticker: event.ticker().to_string(),
        date: event.date,
    })?;

    let (z_score, severity) = classify(pct_change, baseline)?;
    let correctness = grade(event.predicted_label, pct_change, threshold);

    Ok(AnomalyResult {
        bill_id: event.bill_id.clone(),
        title: event.title.clone(),
        date: event.date,
        sector: event.sector,
        ticker: event.ticker().to_string(),
        predicted_label: event.predicted_label,
        observed_label: observed_label(pct_change, threshold),
        date_before,
        price_before,
        date_after,
        price_after,
        pct_change,
        z_score,
        severity,
        correctness,
    })
}

/// Grades already-validated events against precomputed baselines and series.
pub fn analyze_events(
    events: &[Event],
    series: &BTreeMap<Sector, Result<PriceSeries, BillpulseError>>,
    baselines: &BaselineTable,
    window: &SampleWindow,
    threshold: f64,
) -> (Vec<AnomalyResult>, Vec<EventFailure>) {
    let mut results = Vec::with_capacity(events.len());
    let mut failures = Vec::new();

    for event in events {
        let outcome = match (baselines.get(event.sector), series.get(&event.sector)) {
            (None, _) => Err(match baselines.failure(event.sector) {
                Some(e) => EventFailure::new(&event.bill_id, e),
                None => EventFailure::new(
                    &event.bill_id,
                    &BillpulseError::NoData {
                        ticker: event.ticker().to_string(),
                    },
                ),
            }),
            (Some(_), None) => Err(EventFailure::new(
                &event.bill_id,
                &BillpulseError::NoData {
                    ticker: event.ticker().to_string(),
                },
            )),
            (Some(_), Some(Err(e))) => Err(EventFailure::new(&event.bill_id, e)),
            (Some(baseline), Some(Ok(s))) => analyze_event(event, s, baseline, window, threshold)
                .map_err(|e| EventFailure::new(&event.bill_id, &e)),
        };

        match outcome {
            Ok(result) => {
                debug!(
                    bill_id = %result.bill_id,
                    pct_change = result.pct_change,
                    z_score = result.z_score,
                    severity = %result.severity,
                    correctness = %result.correctness,
                    "event graded"
                );
                results.push(result);
            }
            Err(failure) => {
                warn!(bill_id = %failure.bill_id, reason = %failure.reason, "skipping event");
                failures.push(failure);
            }
        }
    }

    (results, failures)
}

/// Runs the full pipeline over raw event records.
pub fn run_analysis(
    data_port: &dyn DataPort,
    records: &[EventRecord],
    config: &EngineConfig,
) -> AnalysisReport {
    info!(events = records.len(), "validating events");
    let (events, mut failures) = validate_events(records);

    let sectors: BTreeSet<Sector> = events.iter().map(|e| e.sector).collect();
    info!(
        sectors = sectors.len(),
        start = %config.baseline_start,
        end = %config.baseline_end,
        horizon = config.horizon_days,
        "computing baselines"
    );
    let baselines = compute_baselines(
        data_port,
        &sectors,
        config.baseline_start,
        config.baseline_end,
        config.horizon_days,
    );

    let mut series = BTreeMap::new();
    for &sector in &sectors {
        if baselines.get(sector).is_none() {
            continue;
        }
        let dates = events.iter().filter(|e| e.sector == sector).map(|e| e.date);
        let Some((start, end)) = event_fetch_range(dates, &config.window) else {
            continue;
        };
        let fetched = data_port
            .fetch_series(sector.ticker(), start, end)
            .and_then(|s| {
                if s.is_empty() {
                    Err(BillpulseError::NoData {
                        ticker: sector.ticker().to_string(),
                    })
                } else {
                    Ok(s)
                }
            });
        if let Err(e) = &fetched {
            warn!(sector = %sector, error = %e, "event window fetch failed");
        }
        series.insert(sector, fetched);
    }

    let (results, event_failures) =
        analyze_events(&events, &series, &baselines, &config.window, config.threshold);
    failures.extend(event_failures);

    info!(
        processed = results.len(),
        skipped = failures.len(),
        "analysis complete"
    );

    AnalysisReport {
        results,
        failures,
        baselines,
    }
}
