//! Historical price retrieval port.

use crate::domain::error::QuantError;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` with `start <= date <= end`.
    ///
    /// An unknown symbol or an empty range is `Ok` with an empty series;
    /// `Err` is reserved for unreadable or malformed data.
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, QuantError>;

    fn list_symbols(&self) -> Result<Vec<String>, QuantError>;

    /// First date, last date and bar count, or `None` when the symbol has no data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, QuantError>;
}
