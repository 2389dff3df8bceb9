//! Ingestion normalization for tabular price data.
//!
//! Sources disagree on header shape: `Close`, `close`, `Adj_Close`, grouped
//! two-level headers (`Close` over `AAPL`), or a single row of stringified
//! tuples (`('Close', 'AAPL')`). Everything is reduced to single-level,
//! lower-case field names before a [`PriceSeries`] is built, so nothing
//! downstream matches on raw header text.

use chrono::NaiveDate;

use crate::domain::error::QuantError;
use crate::domain::ohlcv::{PriceBar, PriceSeries};

pub const KNOWN_FIELDS: [&str; 7] = ["date", "open", "high", "low", "close", "adj close", "volume"];

/// Header rows plus data rows, exactly as read from the source.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub header_rows: Vec<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

/// Lower-case, trim, and treat `_` as a space.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split a stringified tuple header such as `('Close', 'AAPL')` into its levels.
fn tuple_levels(raw: &str) -> Option<Vec<String>> {
    let inner = raw.trim().strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(normalize_name).collect())
}

fn pick_level(levels: &[String]) -> String {
    levels
        .iter()
        .find(|l| KNOWN_FIELDS.contains(&l.as_str()))
        .or_else(|| levels.iter().find(|l| !l.is_empty()))
        .cloned()
        .unwrap_or_default()
}

/// Flatten one or more header rows into one field name per column.
///
/// For each column the first level naming a known price field wins; otherwise
/// the first non-empty level is used.
pub fn flatten_header(header_rows: &[Vec<String>]) -> Vec<String> {
    let width = header_rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            let mut levels = Vec::with_capacity(header_rows.len());
            for row in header_rows {
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                match tuple_levels(cell) {
                    Some(parts) => levels.extend(parts),
                    None => levels.push(normalize_name(cell)),
                }
            }
            pick_level(&levels)
        })
        .collect()
}

/// Parse a date cell, ignoring any time-of-day suffix.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let day = cell.trim().split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn column_index(columns: &[String], field: &str) -> Result<Option<usize>, QuantError> {
    let mut found = None;
    for (i, name) in columns.iter().enumerate() {
        if name == field {
            if found.is_some() {
                return Err(QuantError::DuplicateField {
                    field: field.to_string(),
                });
            }
            found = Some(i);
        }
    }
    Ok(found)
}

fn required_column(columns: &[String], field: &str) -> Result<usize, QuantError> {
    column_index(columns, field)?.ok_or_else(|| QuantError::MissingField {
        field: field.to_string(),
    })
}

fn parse_number(cell: &str, field: &str, row: usize) -> Result<f64, QuantError> {
    cell.trim()
        .parse::<f64>()
        .map_err(|_| QuantError::InvalidField {
            field: field.to_string(),
            value: cell.to_string(),
            row,
        })
}

fn optional_number(
    record: &[String],
    idx: Option<usize>,
    field: &str,
    row: usize,
) -> Result<Option<f64>, QuantError> {
    match idx.and_then(|i| record.get(i)) {
        Some(cell) if !cell.trim().is_empty() => parse_number(cell, field, row).map(Some),
        _ => Ok(None),
    }
}

/// Normalize headers and convert every data row into a [`PriceBar`].
pub fn price_series_from_table(table: &RawTable) -> Result<PriceSeries, QuantError> {
    let columns = flatten_header(&table.header_rows);
    let date_idx = required_column(&columns, "date")?;
    let close_idx = required_column(&columns, "close")?;
    let open_idx = column_index(&columns, "open")?;
    let high_idx = column_index(&columns, "high")?;
    let low_idx = column_index(&columns, "low")?;
    let volume_idx = column_index(&columns, "volume")?;

    let mut bars = Vec::with_capacity(table.rows.len());
    for (i, record) in table.rows.iter().enumerate() {
        let row = i + 1;
        let date_cell = record.get(date_idx).map(String::as_str).unwrap_or("");
        let date = parse_date(date_cell).ok_or_else(|| QuantError::InvalidField {
            field: "date".into(),
            value: date_cell.to_string(),
            row,
        })?;
        let close_cell = record.get(close_idx).map(String::as_str).unwrap_or("");
        let close = parse_number(close_cell, "close", row)?;

        bars.push(PriceBar {
            date,
            close,
            open: optional_number(record, open_idx, "open", row)?,
            high: optional_number(record, high_idx, "high", row)?,
            low: optional_number(record, low_idx, "low", row)?,
            volume: optional_number(record, volume_idx, "volume", row)?,
        });
    }

    PriceSeries::from_unsorted(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_name_folds_case_and_separators() {
        assert_eq!(normalize_name("  Close "), "close");
        assert_eq!(normalize_name("Adj_Close"), "adj close");
        assert_eq!(normalize_name("ADJ   CLOSE"), "adj close");
        assert_eq!(normalize_name("'Date'"), "date");
    }

    #[test]
    fn flatten_single_level() {
        let cols = flatten_header(&[strings(&["Date", "Open", "CLOSE", "Volume"])]);
        assert_eq!(cols, vec!["date", "open", "close", "volume"]);
    }

    #[test]
    fn flatten_grouped_two_level_header() {
        let header = vec![
            strings(&["Price", "Close", "High", "Low", "Open", "Volume"]),
            strings(&["Ticker", "AAPL", "AAPL", "AAPL", "AAPL", "AAPL"]),
            strings(&["Date", "", "", "", "", ""]),
        ];
        let cols = flatten_header(&header);
        assert_eq!(cols, vec!["date", "close", "high", "low", "open", "volume"]);
    }

    #[test]
    fn flatten_tuple_headers() {
        let cols = flatten_header(&[strings(&["Date", "('Close', 'AAPL')", "('Volume', 'AAPL')"])]);
        assert_eq!(cols, vec!["date", "close", "volume"]);
    }

    #[test]
    fn unknown_columns_keep_their_first_level() {
        let cols = flatten_header(&[strings(&["Date", "Dividends"]), strings(&["", "AAPL"])]);
        assert_eq!(cols, vec!["date", "dividends"]);
    }

    #[test]
    fn parse_date_ignores_time_suffix() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_date("2024-03-01"), expected);
        assert_eq!(parse_date("2024-03-01 00:00:00-05:00"), expected);
        assert_eq!(parse_date("2024-03-01T00:00:00"), expected);
        assert_eq!(parse_date("Ticker"), None);
    }

    #[test]
    fn builds_series_from_mixed_case_table() {
        let table = RawTable {
            header_rows: vec![strings(&["DATE", "Close", "open"])],
            rows: vec![
                strings(&["2024-01-03", "12.5", ""]),
                strings(&["2024-01-02", "12.0", "11.5"]),
            ],
        };
        let series = price_series_from_table(&table).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].close, 12.0);
        assert_eq!(series.bars()[0].open, Some(11.5));
        assert_eq!(series.bars()[1].open, None);
    }

    #[test]
    fn adj_close_does_not_stand_in_for_close() {
        let table = RawTable {
            header_rows: vec![strings(&["Date", "Adj Close"])],
            rows: vec![strings(&["2024-01-02", "10.0"])],
        };
        let err = price_series_from_table(&table).unwrap_err();
        assert!(matches!(err, QuantError::MissingField { field } if field == "close"));
    }

    #[test]
    fn missing_date_column_is_fatal() {
        let table = RawTable {
            header_rows: vec![strings(&["Day", "Close"])],
            rows: vec![],
        };
        let err = price_series_from_table(&table).unwrap_err();
        assert!(matches!(err, QuantError::MissingField { field } if field == "date"));
    }

    #[test]
    fn duplicate_close_after_flattening_is_fatal() {
        let header = vec![
            strings(&["Price", "Close", "Close"]),
            strings(&["Ticker", "AAPL", "MSFT"]),
        ];
        let table = RawTable {
            header_rows: header,
            rows: vec![],
        };
        let err = price_series_from_table(&table).unwrap_err();
        assert!(matches!(err, QuantError::DuplicateField { field } if field == "close"));
    }

    #[test]
    fn bad_close_reports_row() {
        let table = RawTable {
            header_rows: vec![strings(&["Date", "Close"])],
            rows: vec![strings(&["2024-01-02", "10"]), strings(&["2024-01-03", "n/a"])],
        };
        let err = price_series_from_table(&table).unwrap_err();
        assert!(matches!(err, QuantError::InvalidField { field, row: 2, .. } if field == "close"));
    }
}
