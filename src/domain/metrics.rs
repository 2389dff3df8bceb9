//! Performance metrics.

use super::backtest::{BacktestResult, EquityPoint};
use super::position::round_trips;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_equity: f64,
    /// final equity - starting capital
    pub net_profit: f64,
    pub total_return: f64,
    /// (final / initial)^(365 / calendar days) - 1
    pub annualized_return: f64,
    pub days_elapsed: i64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult) -> Self {
        let initial_capital = result.initial_capital;
        let final_equity = result.final_equity();
        let net_profit = final_equity - initial_capital;

        let total_return = if initial_capital > 0.0 {
            net_profit / initial_capital
        } else {
            0.0
        };

        let days_elapsed = match (result.equity_curve.first(), result.equity_curve.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        };
        let annualized_return = annualized_return(initial_capital, final_equity, days_elapsed);

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&result.equity_curve);

        let trips = round_trips(&result.trades);
        let trades_won = trips.iter().filter(|t| t.pnl > 0.0).count();
        let trades_lost = trips.iter().filter(|t| t.pnl < 0.0).count();
        let win_rate = if trips.is_empty() {
            0.0
        } else {
            trades_won as f64 / trips.len() as f64
        };
        let largest_win = trips.iter().map(|t| t.pnl).fold(0.0_f64, f64::max);
        let largest_loss = trips.iter().map(|t| -t.pnl).fold(0.0_f64, f64::max);

        Metrics {
            final_equity,
            net_profit,
            total_return,
            annualized_return,
            days_elapsed,
            max_drawdown,
            max_drawdown_duration,
            total_trades: trips.len(),
            trades_won,
            trades_lost,
            win_rate,
            largest_win,
            largest_loss,
        }
    }
}

/// Compound annual growth over a calendar-day span; 0 for spans of zero days or less.
pub fn annualized_return(initial_capital: f64, final_equity: f64, days_elapsed: i64) -> f64 {
    if days_elapsed <= 0 || initial_capital <= 0.0 {
        return 0.0;
    }
    (final_equity / initial_capital).powf(DAYS_PER_YEAR / days_elapsed as f64) - 1.0
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}
