//! Core domain types and logic.

pub mod ohlcv;
pub mod position;
pub mod execution;
pub mod indicator;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
