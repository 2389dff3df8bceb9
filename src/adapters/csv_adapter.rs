//! CSV directory data adapter: one `<SYMBOL>.csv` per symbol.
//!
//! Leading rows are extra header levels while the header does not yet name
//! both `date` and `close` and the row holds no numeric or date-like cell.
//! That covers grouped exports (`Price/Ticker/Date` header stacks) without
//! swallowing a data row whose date is malformed.

use crate::domain::error::QuantError;
use crate::domain::indicator::normalize::{
    flatten_header, parse_date, price_series_from_table, RawTable,
};
use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", symbol.trim().to_uppercase()))
    }

    /// Read a symbol's whole file. A missing file is an empty table.
    fn read_table(&self, symbol: &str) -> Result<Option<RawTable>, QuantError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no data file");
                return Ok(None);
            }
            Err(e) => return Err(QuantError::Io(e)),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut table = RawTable::default();
        let mut in_header = true;
        for result in rdr.records() {
            let record = result.map_err(|e| QuantError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }
            if table.header_rows.is_empty() || (in_header && is_header_level(&table, &cells)) {
                table.header_rows.push(cells);
            } else {
                in_header = false;
                table.rows.push(cells);
            }
        }

        if table.header_rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(table))
    }

    fn read_series(&self, symbol: &str) -> Result<PriceSeries, QuantError> {
        match self.read_table(symbol)? {
            Some(table) => price_series_from_table(&table),
            None => Ok(PriceSeries::default()),
        }
    }
}

fn is_header_level(table: &RawTable, cells: &[String]) -> bool {
    let columns = flatten_header(&table.header_rows);
    let resolved = ["date", "close"]
        .iter()
        .all(|field| columns.iter().any(|c| c.as_str() == *field));
    !resolved && !cells.iter().any(|c| looks_like_value(c))
}

/// Numbers, ISO dates, and date-shaped cells such as `01/02/2024`.
fn looks_like_value(cell: &str) -> bool {
    let cell = cell.trim();
    if cell.is_empty() {
        return false;
    }
    cell.parse::<f64>().is_ok()
        || parse_date(cell).is_some()
        || (cell.chars().any(|c| c.is_ascii_digit())
            && cell.chars().all(|c| c.is_ascii_digit() || "/-.: ".contains(c)))
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, QuantError> {
        let series = self.read_series(symbol)?.slice_dates(start_date, end_date);
        debug!(symbol, bars = series.len(), %start_date, %end_date, "fetched series");
        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| QuantError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                symbols.push(stem.to_string_lossy().to_uppercase());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, QuantError> {
        let series = self.read_series(symbol)?;
        Ok(match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => Some((first, last, series.len())),
            _ => None,
        })
    }
}
