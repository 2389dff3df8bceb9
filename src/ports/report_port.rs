//! Report generation port trait.

use chrono::NaiveDate;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::QuantError;
use crate::domain::metrics::Metrics;

/// What was run, for report headings.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub symbol: &'a str,
    pub strategy_name: &'a str,
    /// Indicator list, e.g. `SMA(20), SMA(50)`.
    pub indicators: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        context: &ReportContext<'_>,
        output_path: &str,
    ) -> Result<(), QuantError>;
}
