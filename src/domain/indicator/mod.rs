//! Technical indicators and the indicator frame consumed by the engine.
//!
//! - `IndicatorPoint` / `IndicatorSeries`: one raw indicator line, warm-up points marked invalid
//! - `IndicatorValue`: the per-bar values a strategy reads (crossover pair or oscillator)
//! - `IndicatorFrame`: price bars joined with their strategy values, warm-up rows removed

pub mod normalize;
pub mod rsi;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

use crate::domain::ohlcv::PriceSeries;
use crate::domain::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn invalid(date: NaiveDate) -> Self {
        IndicatorPoint {
            date,
            valid: false,
            value: 0.0,
        }
    }

    pub fn from_option(date: NaiveDate, value: Option<f64>) -> Self {
        match value {
            Some(value) => IndicatorPoint {
                date,
                valid: true,
                value,
            },
            None => Self::invalid(date),
        }
    }

    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub values: Vec<IndicatorPoint>,
}

/// Strategy-specific values for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Crossover { fast: f64, slow: f64 },
    Oscillator(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub close: f64,
    pub value: IndicatorValue,
}

/// Bars with every required indicator defined, in date order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Compute the strategy's indicators over `series` and drop warm-up rows.
pub fn build_frame(series: &PriceSeries, strategy: &dyn Strategy) -> IndicatorFrame {
    let bars = series.bars();
    let rows = strategy
        .compute_indicators(bars)
        .into_iter()
        .zip(bars)
        .filter_map(|(value, bar)| {
            value.map(|value| IndicatorRow {
                date: bar.date,
                close: bar.close,
                value,
            })
        })
        .collect();
    IndicatorFrame { rows }
}
