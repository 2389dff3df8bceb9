//! Daily price bar and validated price series.

use chrono::NaiveDate;

use super::error::QuantError;

/// One trading day. Only `date` and `close` feed the engine; the remaining
/// OHLCV fields are carried through when the source provides them.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PriceBar {
            date,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// Bars in strictly increasing date order with positive closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate and wrap `bars`. Bars must already be sorted by date.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, QuantError> {
        for bar in &bars {
            if !(bar.close.is_finite() && bar.close > 0.0) {
                return Err(QuantError::NonPositiveClose {
                    date: bar.date,
                    close: bar.close,
                });
            }
        }
        for pair in bars.windows(2) {
            let (previous, date) = (pair[0].date, pair[1].date);
            if date == previous {
                return Err(QuantError::DuplicateDate { date });
            }
            if date < previous {
                return Err(QuantError::UnorderedDates { previous, date });
            }
        }
        Ok(PriceSeries { bars })
    }

    /// Sort by date, then validate. Used by adapters whose source order is not guaranteed.
    pub fn from_unsorted(mut bars: Vec<PriceBar>) -> Result<Self, QuantError> {
        bars.sort_by_key(|b| b.date);
        Self::new(bars)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Keep only bars with `start <= date <= end`.
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries {
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect(),
        }
    }
}
