//! Trade log CSV adapter implementing ReportPort.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::QuantError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::{ReportContext, ReportPort};

const HEADER: [&str; 5] = ["Date", "Action", "Price", "Quantity", "Cash"];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(e: csv::Error) -> QuantError {
    QuantError::Report {
        reason: format!("failed to write trade log: {}", e),
    }
}

impl ReportPort for CsvReportAdapter {
    /// Writes one row per trade event. Metrics and context are not part of
    /// the trade log.
    fn write(
        &self,
        result: &BacktestResult,
        _metrics: &Metrics,
        _context: &ReportContext<'_>,
        output_path: &str,
    ) -> Result<(), QuantError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        writer.write_record(HEADER).map_err(csv_error)?;
        for trade in &result.trades {
            writer
                .write_record([
                    trade.date.format("%Y-%m-%d").to_string(),
                    trade.action.to_string(),
                    format!("{:.2}", trade.price),
                    trade.quantity.to_string(),
                    format!("{:.2}", trade.cash_after),
                ])
                .map_err(csv_error)?;
        }
        writer.flush()?;

        Ok(())
    }
}
