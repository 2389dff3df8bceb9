//! Simulation engine: one walk-forward pass over an indicator frame.
//!
//! States are FLAT and LONG. FLAT -> LONG on the entry rule (BUY),
//! LONG -> FLAT on the exit rule (SELL), and an open position is closed with
//! SELL-END at the last bar. Bar 0 of the frame only seeds the "previous"
//! indicator values; trading and equity recording start at bar 1.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::execution::{enter_long, exit_long, EntryResult};
use super::indicator::{build_frame, IndicatorFrame};
use super::ohlcv::PriceSeries;
use super::position::{Position, TradeAction, TradeEvent};
use super::strategy::Strategy;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<TradeEvent>,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_capital: f64,
    /// Indicator rows that survived warm-up filtering.
    pub bars_used: usize,
    pub final_position: Position,
}

impl BacktestResult {
    /// No bars were simulated (history shorter than the warm-up).
    pub fn is_empty(&self) -> bool {
        self.equity_curve.is_empty()
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}

/// Run `strategy` over a prepared frame.
pub fn run_backtest(
    frame: &IndicatorFrame,
    strategy: &dyn Strategy,
    config: &BacktestConfig,
) -> BacktestResult {
    let mut position = Position::new(config.initial_capital);
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(frame.len().saturating_sub(1));

    for pair in frame.rows.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);

        if position.is_flat() {
            if strategy.should_enter(&prev.value, &cur.value) {
                if let EntryResult::Entered(event) = enter_long(&mut position, cur.date, cur.close)
                {
                    trades.push(event);
                }
            }
        } else if strategy.should_exit(&prev.value, &cur.value) {
            trades.extend(exit_long(&mut position, cur.date, cur.close, TradeAction::Sell));
        }

        equity_curve.push(EquityPoint {
            date: cur.date,
            equity: position.equity(cur.close),
        });
    }

    if position.is_long() {
        if let Some(last) = frame.rows.last() {
            trades.extend(exit_long(
                &mut position,
                last.date,
                last.close,
                TradeAction::SellEnd,
            ));
        }
    }

    debug!(
        strategy = strategy.name(),
        bars = frame.len(),
        trades = trades.len(),
        "simulation complete"
    );

    BacktestResult {
        trades,
        equity_curve,
        initial_capital: config.initial_capital,
        bars_used: frame.len(),
        final_position: position,
    }
}

/// Build the indicator frame for `series` and simulate.
///
/// A series shorter than the strategy's warm-up yields an empty result, not
/// an error.
pub fn run_strategy(
    series: &PriceSeries,
    strategy: &dyn Strategy,
    config: &BacktestConfig,
) -> BacktestResult {
    if series.len() <= strategy.min_bars() {
        warn!(
            bars = series.len(),
            required = strategy.min_bars() + 1,
            strategy = strategy.name(),
            indicators = %strategy.indicator_labels(),
            "insufficient history for any trading bar"
        );
    }
    let frame = build_frame(series, strategy);
    run_backtest(&frame, strategy, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorRow, IndicatorValue};
    use crate::domain::strategy::{MaCrossover, RsiThreshold};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn ma_frame(rows: &[(f64, f64, f64)]) -> IndicatorFrame {
        IndicatorFrame {
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, &(close, fast, slow))| IndicatorRow {
                    date: d(i as u32 + 1),
                    close,
                    value: IndicatorValue::Crossover { fast, slow },
                })
                .collect(),
        }
    }

    fn rsi_frame(rows: &[(f64, f64)]) -> IndicatorFrame {
        IndicatorFrame {
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, &(close, osc))| IndicatorRow {
                    date: d(i as u32 + 1),
                    close,
                    value: IndicatorValue::Oscillator(osc),
                })
                .collect(),
        }
    }

    #[test]
    fn default_capital_is_ten_thousand() {
        assert_eq!(BacktestConfig::default().initial_capital, 10_000.0);
    }

    #[test]
    fn empty_frame_gives_empty_result() {
        let result = run_backtest(
            &IndicatorFrame::default(),
            &MaCrossover::default(),
            &BacktestConfig::default(),
        );
        assert!(result.is_empty());
        assert!(result.trades.is_empty());
        assert_eq!(result.final_equity(), 10_000.0);
    }

    #[test]
    fn single_row_frame_gives_empty_result() {
        let frame = ma_frame(&[(10.0, 1.0, 2.0)]);
        let result = run_backtest(&frame, &MaCrossover::default(), &BacktestConfig::default());
        assert!(result.is_empty());
        assert_eq!(result.bars_used, 1);
    }

    #[test]
    fn ma_cross_up_then_down() {
        let frame = ma_frame(&[
            (10.0, 1.0, 2.0),
            (20.0, 3.0, 2.0),
            (25.0, 4.0, 2.0),
            (40.0, 1.0, 2.0),
            (30.0, 1.0, 2.0),
        ]);
        let result = run_backtest(&frame, &MaCrossover::default(), &BacktestConfig::default());

        assert_eq!(result.trades.len(), 2);
        let buy = &result.trades[0];
        assert_eq!((buy.date, buy.action, buy.quantity), (d(2), TradeAction::Buy, 500));
        assert!(buy.cash_after.abs() < 1e-9);
        let sell = &result.trades[1];
        assert_eq!((sell.date, sell.action), (d(4), TradeAction::Sell));
        assert!((sell.cash_after - 20_000.0).abs() < 1e-9);

        let equity: Vec<f64> = result.equity_curve.iter().map(|p| p.equity).collect();
        assert_eq!(equity, vec![10_000.0, 12_500.0, 20_000.0, 20_000.0]);
        assert!(result.final_position.is_flat());
    }

    #[test]
    fn open_position_is_liquidated_at_last_bar() {
        let frame = ma_frame(&[(10.0, 1.0, 2.0), (20.0, 3.0, 2.0), (30.0, 4.0, 2.0)]);
        let result = run_backtest(&frame, &MaCrossover::default(), &BacktestConfig::default());

        assert_eq!(result.trades.len(), 2);
        let end = &result.trades[1];
        assert_eq!(end.action, TradeAction::SellEnd);
        assert_eq!(end.date, d(3));
        assert!((end.price - 30.0).abs() < f64::EPSILON);
        assert!((end.cash_after - 15_000.0).abs() < 1e-9);
        assert!(result.final_position.is_flat());
        assert!((result.final_equity() - 15_000.0).abs() < 1e-9);
    }

    #[test]
    fn equality_plateau_crosses_once() {
        let frame = ma_frame(&[
            (10.0, 1.0, 2.0),
            (10.0, 2.0, 2.0),
            (10.0, 2.0, 2.0),
            (10.0, 3.0, 2.0),
            (10.0, 4.0, 2.0),
        ]);
        let result = run_backtest(&frame, &MaCrossover::default(), &BacktestConfig::default());
        let buys: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.action == TradeAction::Buy)
            .collect();
        assert_eq!(buys.len(), 1);
        assert_eq!(buys[0].date, d(4));
    }

    #[test]
    fn rsi_dip_then_spike() {
        let frame = rsi_frame(&[(50.0, 50.0), (40.0, 25.0), (45.0, 50.0), (60.0, 75.0)]);
        let result = run_backtest(&frame, &RsiThreshold::default(), &BacktestConfig::default());

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].action, TradeAction::Buy);
        assert_eq!(result.trades[0].date, d(2));
        assert_eq!(result.trades[0].quantity, 250);
        assert_eq!(result.trades[1].action, TradeAction::Sell);
        assert_eq!(result.trades[1].date, d(4));
        assert!((result.trades[1].cash_after - 15_000.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_entry_signal_while_long_buys_once() {
        let frame = rsi_frame(&[(50.0, 50.0), (40.0, 25.0), (30.0, 20.0), (60.0, 75.0)]);
        let result = run_backtest(&frame, &RsiThreshold::default(), &BacktestConfig::default());

        let actions: Vec<TradeAction> = result.trades.iter().map(|t| t.action).collect();
        assert_eq!(actions, vec![TradeAction::Buy, TradeAction::Sell]);
        assert_eq!(result.trades[0].quantity, 250);
        assert!((result.trades[1].cash_after - 15_000.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_entry_on_first_row_is_ignored() {
        let frame = rsi_frame(&[(50.0, 10.0), (50.0, 50.0)]);
        let result = run_backtest(&frame, &RsiThreshold::default(), &BacktestConfig::default());
        assert!(result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), 1);
    }

    #[test]
    fn unaffordable_entry_stays_flat() {
        let frame = rsi_frame(&[(50.0, 50.0), (20_000.0, 10.0), (20_000.0, 90.0)]);
        let result = run_backtest(&frame, &RsiThreshold::default(), &BacktestConfig::default());
        assert!(result.trades.is_empty());
        assert!(result.equity_curve.iter().all(|p| p.equity == 10_000.0));
    }
}
