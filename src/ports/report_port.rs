//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::MeanrevError;
use crate::domain::metrics::PerformanceReport;
use crate::domain::probability::AnalysisResult;
use crate::domain::universe::SkippedCode;

/// Everything a report renders. Reports only lay out what the pipeline
/// already computed.
pub struct ReportInput<'a> {
    pub result: &'a BacktestResult,
    pub performance: &'a PerformanceReport,
    pub analysis: &'a AnalysisResult,
    pub skipped: &'a [SkippedCode],
    pub ma_window: usize,
}

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, input: &ReportInput<'_>, output_path: &Path) -> Result<(), MeanrevError>;
}
