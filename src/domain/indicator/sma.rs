//! Simple moving average.
//!
//! Each point is the arithmetic mean of the trailing `period` closes. The
//! window is summed afresh for every bar so identical windows always yield
//! bit-identical averages (a running sum would drift and could fabricate a
//! crossover on a flat series).
//!
//! Warmup: first `period - 1` bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;

/// Trailing mean of `values` over `period`; `None` until the window is full.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = rolling_mean(&closes, period)
        .into_iter()
        .zip(bars)
        .map(|(mean, bar)| IndicatorPoint::from_option(bar.date, mean))
        .collect();

    IndicatorSeries { values }
}
