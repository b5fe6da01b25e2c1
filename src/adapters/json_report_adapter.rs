//! File report adapter: graded events as JSON, baselines as CSV.

use crate::domain::baseline::BaselineTable;
use crate::domain::engine::AnalysisReport;
use crate::domain::error::BillpulseError;
use crate::domain::sector::Sector;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct JsonReportAdapter {
    /// Also write rejected/skipped events to `<output>.skipped.json`.
    pub include_failures: bool,
}

const BASELINE_HEADER: [&str; 6] = [
    "sector",
    "ticker",
    "mean_change",
    "std_change",
    "sample_size",
    "horizon_days",
];

#[derive(Debug, Serialize)]
struct BaselineRow<'a> {
    sector: Sector,
    ticker: &'a str,
    mean_change: f64,
    std_change: f64,
    sample_size: usize,
    horizon_days: usize,
}

pub fn skipped_path(output_path: &Path) -> PathBuf {
    output_path.with_extension("skipped.json")
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), BillpulseError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| BillpulseError::Report {
        reason: format!("failed to serialize {}: {}", path.display(), e),
    })?;
    fs::write(path, json)?;
    Ok(())
}

impl JsonReportAdapter {
    pub fn new(include_failures: bool) -> Self {
        Self { include_failures }
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_results(
        &self,
        report: &AnalysisReport,
        output_path: &Path,
    ) -> Result<(), BillpulseError> {
        write_json(&report.results, output_path)?;
        if self.include_failures {
            write_json(&report.failures, &skipped_path(output_path))?;
        }
        Ok(())
    }

    fn write_baselines(
        &self,
        table: &BaselineTable,
        output_path: &Path,
    ) -> Result<(), BillpulseError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| BillpulseError::Report {
            reason: format!("failed to create {}: {}", output_path.display(), e),
        })?;
        // The serializer only emits the header alongside the first row.
        if table.is_empty() {
            wtr.write_record(BASELINE_HEADER)
                .map_err(|e| BillpulseError::Report {
                    reason: format!("failed to write baseline header: {}", e),
                })?;
        }
        for (sector, stats) in table.iter() {
            wtr.serialize(BaselineRow {
                sector,
                ticker: &stats.ticker,
                mean_change: stats.mean_change,
                std_change: stats.std_change,
                sample_size: stats.sample_size,
                horizon_days: stats.horizon_days,
            })
            .map_err(|e| BillpulseError::Report {
                reason: format!("failed to write baseline row: {}", e),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
