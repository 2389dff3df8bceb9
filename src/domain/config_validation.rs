//! Configuration validation.
//!
//! Checks every value that is present; keys that may still be supplied on
//! the command line (symbol, dates) are not required here.

use crate::domain::error::QuantError;
use crate::domain::strategy::{StrategyKind, StrategySettings};
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_strategy_name(config)?;
    Ok(())
}

/// Validate the parameters of every strategy section, not only the selected one.
pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let settings = strategy_settings(config)?;
    settings.ma.validate()?;
    settings.rsi.validate()?;
    Ok(())
}

/// Read `[ma_crossover]` and `[rsi]`, falling back to defaults per key.
pub fn strategy_settings(config: &dyn ConfigPort) -> Result<StrategySettings, QuantError> {
    let mut settings = StrategySettings::default();
    if let Some(kind) = strategy_kind(config)? {
        settings.kind = kind;
    }
    if let Some(fast) = config.get_usize("ma_crossover", "fast")? {
        settings.ma.fast = fast;
    }
    if let Some(slow) = config.get_usize("ma_crossover", "slow")? {
        settings.ma.slow = slow;
    }
    if let Some(period) = config.get_usize("rsi", "period")? {
        settings.rsi.period = period;
    }
    if let Some(oversold) = config.get_f64("rsi", "oversold")? {
        settings.rsi.oversold = oversold;
    }
    if let Some(overbought) = config.get_f64("rsi", "overbought")? {
        settings.rsi.overbought = overbought;
    }
    Ok(settings)
}

fn strategy_kind(config: &dyn ConfigPort) -> Result<Option<StrategyKind>, QuantError> {
    config
        .get_string("backtest", "strategy")
        .map(|s| {
            s.parse().map_err(|e: crate::domain::strategy::ParseStrategyError| {
                QuantError::ConfigInvalid {
                    section: "backtest".to_string(),
                    key: "strategy".to_string(),
                    reason: e.to_string(),
                }
            })
        })
        .transpose()
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if let Some(value) = config.get_f64("backtest", "initial_capital")? {
        if value <= 0.0 {
            return Err(QuantError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "initial_capital".to_string(),
                reason: "initial_capital must be positive".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let start = config.get_date("backtest", "start_date")?;
    let end = config.get_date("backtest", "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(QuantError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_strategy_name(config: &dyn ConfigPort) -> Result<(), QuantError> {
    strategy_kind(config).map(|_| ())
}
