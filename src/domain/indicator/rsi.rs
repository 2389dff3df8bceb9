//! RSI oscillator over simple-averaged gains and losses.
//!
//! - delta = close[i] - close[i-1]; gain = max(delta, 0); loss = max(-delta, 0)
//! - avg_gain / avg_loss = simple mean over the trailing `period` deltas
//! - RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//!
//! Zero-loss windows: RSI = 100 when avg_gain > 0, and 50 when the window is
//! perfectly flat (no gains and no losses).
//!
//! Warmup: bar 0 has no delta, so the first `period` bars are invalid.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;

pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI from averaged gain and loss, applying the zero-loss policy.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            values: bars
                .iter()
                .map(|b| IndicatorPoint::invalid(b.date))
                .collect(),
        };
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = bars
        .windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint::invalid(bars[0].date));
    for (i, bar) in bars.iter().enumerate().skip(1) {
        let rsi = match (avg_gains[i - 1], avg_losses[i - 1]) {
            (Some(g), Some(l)) => Some(rsi_from_averages(g, l)),
            _ => None,
        };
        values.push(IndicatorPoint::from_option(bar.date, rsi));
    }

    IndicatorSeries { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(start + chrono::Duration::days(i as i64), c))
            .collect()
    }

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert!(series.values.is_empty());
    }

    #[test]
    fn rsi_single_bar() {
        let series = calculate_rsi(&make_bars(&[100.0]), 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=16).map(|i| 100.0 + (i % 5) as f64 * 2.0).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        assert_eq!(series.values.len(), 16);
        for i in 0..14 {
            assert!(!series.values[i].valid, "bar {} should be invalid", i);
        }
        assert!(series.values[14].valid);
        assert!(series.values[15].valid);
    }

    #[test]
    fn rsi_all_gains_saturates_at_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        assert_eq!(series.values[14].value, 100.0);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        assert!(series.values[14].value.abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_window_is_neutral() {
        let series = calculate_rsi(&make_bars(&[42.0; 20]), 14);
        assert_eq!(series.values[19].value, NEUTRAL_RSI);
    }

    #[test]
    fn rsi_uses_simple_average_not_wilder() {
        // Ten +1 moves then four -1 moves, then one more +1 that drops the
        // first +1 out of the window: avg_gain = 10/14, avg_loss = 4/14.
        let mut closes = vec![100.0];
        for _ in 0..10 {
            closes.push(closes.last().unwrap() + 1.0);
        }
        for _ in 0..4 {
            closes.push(closes.last().unwrap() - 1.0);
        }
        closes.push(closes.last().unwrap() + 1.0);
        let series = calculate_rsi(&make_bars(&closes), 14);

        let first = series.values[14].value;
        assert!((first - (100.0 - 100.0 / (1.0 + 10.0 / 4.0))).abs() < 1e-9);
        let second = series.values[15].value;
        assert!((second - (100.0 - 100.0 / (1.0 + 10.0 / 4.0))).abs() < 1e-9);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=40).map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 2.0).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        for point in series.values.iter().filter(|p| p.valid) {
            assert!((0.0..=100.0).contains(&point.value), "RSI {} out of range", point.value);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&make_bars(&[100.0, 101.0]), 0);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_from_averages_policy() {
        assert_eq!(rsi_from_averages(1.0, 0.0), 100.0);
        assert_eq!(rsi_from_averages(0.0, 0.0), NEUTRAL_RSI);
        assert_eq!(rsi_from_averages(0.0, 1.0), 0.0);
        assert!((rsi_from_averages(1.0, 1.0) - 50.0).abs() < 1e-12);
    }
}
