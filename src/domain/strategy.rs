//! Strategy capability and its two variants.
//!
//! A strategy supplies its indicator computation and its entry/exit
//! predicates; the simulation loop in [`crate::domain::backtest`] is shared.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::QuantError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Indicators this strategy reads.
    fn indicator_types(&self) -> Vec<IndicatorType>;

    /// Indicator list for diagnostics, e.g. `SMA(20), SMA(50)`.
    fn indicator_labels(&self) -> String {
        self.indicator_types()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fewest bars that yield one defined indicator row.
    fn min_bars(&self) -> usize;

    /// One entry per bar; `None` while any required indicator is undefined.
    fn compute_indicators(&self, bars: &[PriceBar]) -> Vec<Option<IndicatorValue>>;

    fn should_enter(&self, prev: &IndicatorValue, cur: &IndicatorValue) -> bool;

    fn should_exit(&self, prev: &IndicatorValue, cur: &IndicatorValue) -> bool;
}

/// Fast/slow simple moving average crossover.
#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossover {
    pub fast: usize,
    pub slow: usize,
}

impl Default for MaCrossover {
    fn default() -> Self {
        MaCrossover { fast: 20, slow: 50 }
    }
}

impl MaCrossover {
    pub fn validate(&self) -> Result<(), QuantError> {
        if self.fast == 0 {
            return Err(invalid("ma_crossover", "fast", "fast period must be at least 1"));
        }
        if self.fast >= self.slow {
            return Err(invalid(
                "ma_crossover",
                "slow",
                "slow period must be greater than fast period",
            ));
        }
        Ok(())
    }

    fn pair(value: &IndicatorValue) -> Option<(f64, f64)> {
        match *value {
            IndicatorValue::Crossover { fast, slow } => Some((fast, slow)),
            IndicatorValue::Oscillator(_) => None,
        }
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &'static str {
        "MA Crossover"
    }

    fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![IndicatorType::Sma(self.fast), IndicatorType::Sma(self.slow)]
    }

    fn min_bars(&self) -> usize {
        self.fast.max(self.slow)
    }

    fn compute_indicators(&self, bars: &[PriceBar]) -> Vec<Option<IndicatorValue>> {
        let fast = calculate_sma(bars, self.fast);
        let slow = calculate_sma(bars, self.slow);
        fast.values
            .iter()
            .zip(&slow.values)
            .map(|(f, s)| match (f.get(), s.get()) {
                (Some(fast), Some(slow)) => Some(IndicatorValue::Crossover { fast, slow }),
                _ => None,
            })
            .collect()
    }

    fn should_enter(&self, prev: &IndicatorValue, cur: &IndicatorValue) -> bool {
        match (Self::pair(prev), Self::pair(cur)) {
            (Some((pf, ps)), Some((cf, cs))) => pf <= ps && cf > cs,
            _ => false,
        }
    }

    fn should_exit(&self, prev: &IndicatorValue, cur: &IndicatorValue) -> bool {
        match (Self::pair(prev), Self::pair(cur)) {
            (Some((pf, ps)), Some((cf, cs))) => pf >= ps && cf < cs,
            _ => false,
        }
    }
}

/// Buy when the oscillator is oversold, sell when it is overbought.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiThreshold {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiThreshold {
    fn default() -> Self {
        RsiThreshold {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl RsiThreshold {
    pub fn validate(&self) -> Result<(), QuantError> {
        if self.period == 0 {
            return Err(invalid("rsi", "period", "period must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.oversold) {
            return Err(invalid("rsi", "oversold", "oversold must be between 0 and 100"));
        }
        if !(0.0..=100.0).contains(&self.overbought) {
            return Err(invalid(
                "rsi",
                "overbought",
                "overbought must be between 0 and 100",
            ));
        }
        if self.oversold >= self.overbought {
            return Err(invalid(
                "rsi",
                "overbought",
                "overbought must be greater than oversold",
            ));
        }
        Ok(())
    }

    fn oscillator(value: &IndicatorValue) -> Option<f64> {
        match *value {
            IndicatorValue::Oscillator(v) => Some(v),
            IndicatorValue::Crossover { .. } => None,
        }
    }
}

impl Strategy for RsiThreshold {
    fn name(&self) -> &'static str {
        "RSI"
    }

    fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![IndicatorType::Rsi(self.period)]
    }

    fn min_bars(&self) -> usize {
        self.period + 1
    }

    fn compute_indicators(&self, bars: &[PriceBar]) -> Vec<Option<IndicatorValue>> {
        calculate_rsi(bars, self.period)
            .values
            .iter()
            .map(|p| p.get().map(IndicatorValue::Oscillator))
            .collect()
    }

    fn should_enter(&self, _prev: &IndicatorValue, cur: &IndicatorValue) -> bool {
        Self::oscillator(cur).is_some_and(|v| v < self.oversold)
    }

    fn should_exit(&self, _prev: &IndicatorValue, cur: &IndicatorValue) -> bool {
        Self::oscillator(cur).is_some_and(|v| v > self.overbought)
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> QuantError {
    QuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Strategy selector as chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    MaCrossover,
    Rsi,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy '{0}' (expected ma-crossover or rsi)")]
pub struct ParseStrategyError(pub String);

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "ma-crossover" | "ma" | "sma" => Ok(StrategyKind::MaCrossover),
            "rsi" => Ok(StrategyKind::Rsi),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::MaCrossover => write!(f, "ma-crossover"),
            StrategyKind::Rsi => write!(f, "rsi"),
        }
    }
}

/// Parameters for both variants; `build` picks the one `kind` names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategySettings {
    pub kind: StrategyKind,
    pub ma: MaCrossover,
    pub rsi: RsiThreshold,
}

impl StrategySettings {
    pub fn validate(&self) -> Result<(), QuantError> {
        match self.kind {
            StrategyKind::MaCrossover => self.ma.validate(),
            StrategyKind::Rsi => self.rsi.validate(),
        }
    }

    pub fn build(&self) -> Box<dyn Strategy> {
        match self.kind {
            StrategyKind::MaCrossover => Box::new(self.ma.clone()),
            StrategyKind::Rsi => Box::new(self.rsi.clone()),
        }
    }
}
