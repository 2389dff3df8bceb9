#![allow(dead_code)]

use chrono::NaiveDate;
use quantbt::cli::RunConfig;
use quantbt::domain::backtest::BacktestConfig;
use quantbt::domain::error::QuantError;
pub use quantbt::domain::ohlcv::{PriceBar, PriceSeries};
use quantbt::domain::strategy::{StrategyKind, StrategySettings};
use quantbt::ports::data_port::DataPort;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.data.insert(symbol.to_string(), series_from_closes(closes));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, QuantError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(QuantError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|s| s.slice_dates(start_date, end_date))
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, QuantError> {
        Ok(self.data.get(symbol).and_then(|s| {
            Some((s.first_date()?, s.last_date()?, s.len()))
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Date of bar `index` in series built by this module (daily from 2024-01-01).
pub fn bar_date(index: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(index as i64)
}

pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    PriceSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(bar_date(i), c))
            .collect(),
    )
    .unwrap()
}

pub fn constant_closes(len: usize, price: f64) -> Vec<f64> {
    vec![price; len]
}

/// 60 bars at 100 then 20 bars rising 101..=120.
///
/// Under MA(20/50) the averages are equal from bar 49 to bar 59 and the fast
/// average first exceeds the slow one at bar 60 (close 101). No reversal.
pub fn flat_then_rising() -> Vec<f64> {
    let mut closes = vec![100.0; 60];
    closes.extend((1..=20).map(|i| 100.0 + i as f64));
    closes
}

/// 60 bars at 100, 10 bars rising 101..=110, then 30 bars at 90.
///
/// Under MA(20/50): one upward cross at bar 60, one downward cross inside
/// the 90 plateau, never re-crossing.
pub fn cross_up_then_down() -> Vec<f64> {
    let mut closes = vec![100.0; 60];
    closes.extend((1..=10).map(|i| 100.0 + i as f64));
    closes.extend(std::iter::repeat_n(90.0, 30));
    closes
}

/// 15 bars alternating 100/101, then 90, 100, 110, 130.
///
/// Under RSI(14, 30/70): RSI is 50 at bar 14, ~26.1 at bar 15 (BUY at 90),
/// 50 and ~61 at bars 16-17, and 75 at bar 18 (SELL at 130).
pub fn rsi_dip_then_spike() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..15)
        .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
        .collect();
    closes.extend([90.0, 100.0, 110.0, 130.0]);
    closes
}

pub fn run_config(symbol: &str, kind: StrategyKind) -> RunConfig {
    RunConfig {
        symbol: symbol.to_string(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        data_dir: PathBuf::from("data"),
        output: None,
        backtest: BacktestConfig::default(),
        strategy: StrategySettings {
            kind,
            ..StrategySettings::default()
        },
    }
}

/// Write `closes` as `<dir>/<SYMBOL>.csv` with a plain OHLCV header.
pub fn write_price_csv(dir: &std::path::Path, symbol: &str, closes: &[f64]) {
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (i, close) in closes.iter().enumerate() {
        content.push_str(&format!(
            "{},{c},{c},{c},{c},{c},1000\n",
            bar_date(i),
            c = close
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
