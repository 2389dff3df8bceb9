//! Fill simulation at the bar's close.
//!
//! Entries buy as many whole shares as cash allows; exits sell the whole
//! position. There are no commissions or slippage.

use chrono::NaiveDate;
use tracing::debug;

use super::position::{Position, TradeAction, TradeEvent};

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered(TradeEvent),
    InsufficientCapital,
}

/// Buy floor(cash / price) shares. The position must be flat.
///
/// Returns `InsufficientCapital` (and leaves the position untouched) when not
/// even one share is affordable.
pub fn enter_long(position: &mut Position, date: NaiveDate, price: f64) -> EntryResult {
    debug_assert!(position.is_flat(), "enter_long called while long");

    let quantity = (position.cash / price).floor() as u64;
    if quantity == 0 {
        debug!(%date, price, cash = position.cash, "entry skipped: cannot afford one share");
        return EntryResult::InsufficientCapital;
    }

    position.cash -= quantity as f64 * price;
    position.quantity = quantity;
    debug!(%date, price, quantity, cash = position.cash, "BUY");

    EntryResult::Entered(TradeEvent {
        date,
        action: TradeAction::Buy,
        price,
        quantity,
        cash_after: position.cash,
    })
}

/// Sell the whole position. `None` when flat.
pub fn exit_long(
    position: &mut Position,
    date: NaiveDate,
    price: f64,
    action: TradeAction,
) -> Option<TradeEvent> {
    if position.is_flat() {
        return None;
    }

    let quantity = position.quantity;
    position.cash += quantity as f64 * price;
    position.quantity = 0;
    debug!(%date, price, quantity, cash = position.cash, %action, "exit");

    Some(TradeEvent {
        date,
        action,
        price,
        quantity,
        cash_after: position.cash,
    })
}
