//! Report generation port trait.

use crate::domain::baseline::BaselineTable;
use crate::domain::engine::AnalysisReport;
use crate::domain::error::BillpulseError;
use std::path::Path;

/// Port for writing analysis hand-off records.
pub trait ReportPort {
    fn write_results(&self, report: &AnalysisReport, output_path: &Path)
        -> Result<(), BillpulseError>;

    fn write_baselines(&self, table: &BaselineTable, output_path: &Path)
        -> Result<(), BillpulseError>;
}
