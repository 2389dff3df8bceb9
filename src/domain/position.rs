//! Position state, trade events and round trips.

use chrono::NaiveDate;
use std::fmt;

/// Shares held and cash on hand for the single instrument of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub quantity: u64,
    pub cash: f64,
}

impl Position {
    pub fn new(initial_capital: f64) -> Self {
        Position {
            quantity: 0,
            cash: initial_capital,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    /// cash + quantity * price
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.market_value(price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeAction {
    Buy,
    Sell,
    /// Forced liquidation of an open position after the last bar.
    SellEnd,
}

impl TradeAction {
    pub fn is_sell(&self) -> bool {
        matches!(self, TradeAction::Sell | TradeAction::SellEnd)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::SellEnd => write!(f, "SELL-END"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: u64,
    pub cash_after: f64,
}

/// A BUY paired with the SELL or SELL-END that closed it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub quantity: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub exit_action: TradeAction,
    pub pnl: f64,
}

/// Pair each BUY with the next sell. A trailing unmatched BUY is ignored.
pub fn round_trips(trades: &[TradeEvent]) -> Vec<RoundTrip> {
    let mut open: Option<&TradeEvent> = None;
    let mut trips = Vec::new();
    for event in trades {
        match event.action {
            TradeAction::Buy => open = Some(event),
            TradeAction::Sell | TradeAction::SellEnd => {
                if let Some(entry) = open.take() {
                    trips.push(RoundTrip {
                        quantity: entry.quantity,
                        entry_price: entry.price,
                        exit_price: event.price,
                        entry_date: entry.date,
                        exit_date: event.date,
                        exit_action: event.action,
                        pnl: entry.quantity as f64 * (event.price - entry.price),
                    });
                }
            }
        }
    }
    trips
}
