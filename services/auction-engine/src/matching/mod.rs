//! Price-time priority matching pass
//!
//! One incoming order is crossed against the opposite side of its
//! market's book in a single deterministic pass. Every iteration fully
//! consumes either the incoming order or the resting candidate, so the
//! pass terminates in at most book-depth steps.

pub mod crossing;
pub mod ledger;

pub use crossing::crosses;
pub use ledger::TradeLedger;

use exchange_types::errors::EngineError;
use exchange_types::order::{Order, Side};
use exchange_types::trade::Trade;
use tracing::debug;

use crate::book::{AskBook, BidBook};

/// Process one freshly dequeued order against the book.
///
/// Transitions the order `WAITING → NEW`, takes liquidity from the
/// opposite side while prices cross, then applies the remainder policy:
/// a priced order rests on its own side; a market order's unfilled
/// remainder is cancelled rather than misreported as executed.
///
/// Returns the order's final state and the trades produced, in execution
/// order. The only error paths are violated invariants (an order
/// arriving with an unexpected status or `filled > size`), which are
/// surfaced untouched.
pub(crate) fn execute(
    bids: &mut BidBook,
    asks: &mut AskBook,
    ledger: &mut TradeLedger,
    mut order: Order,
    executed_at: i64,
) -> Result<(Order, Vec<Trade>), EngineError> {
    order.begin_matching().map_err(EngineError::from)?;

    let trades = match order.side {
        Side::Buy => take_asks(asks, ledger, &mut order, executed_at)?,
        Side::Sell => take_bids(bids, ledger, &mut order, executed_at)?,
    };

    if !order.is_filled() {
        if order.price.is_market() {
            // Depth ran out. The remainder terminates instead of resting
            // unpriced or being reported as a full execution.
            order.cancel_remainder();
            debug!(
                order_id = %order.order_id,
                filled = %order.filled,
                unfilled = %order.remaining(),
                "market order out of depth, remainder cancelled"
            );
        } else {
            match order.side {
                Side::Buy => bids.insert(order.clone()),
                Side::Sell => asks.insert(order.clone()),
            }
            debug!(
                order_id = %order.order_id,
                price = %order.price,
                remaining = %order.remaining(),
                "order resting"
            );
        }
    }

    Ok((order, trades))
}

/// Cross an incoming buy against the asks, best (lowest) price first.
fn take_asks(
    asks: &mut AskBook,
    ledger: &mut TradeLedger,
    taker: &mut Order,
    executed_at: i64,
) -> Result<Vec<Trade>, EngineError> {
    let mut trades = Vec::new();
    while !taker.is_filled() {
        let Some((maker_price, level)) = asks.best_level_mut() else {
            break;
        };
        if !crossing::crosses(taker.side, taker.price, maker_price) {
            break;
        }
        let Some(maker_remaining) = level.front().map(Order::remaining) else {
            break;
        };
        let fill = taker.remaining().min(maker_remaining);
        taker.fill(fill).map_err(EngineError::from)?;
        let maker = match level.fill_front(fill) {
            Some(result) => result.map_err(EngineError::from)?,
            None => break,
        };
        trades.push(ledger.record(taker, &maker, maker_price, fill, executed_at));
        asks.prune_if_empty(maker_price);
    }
    Ok(trades)
}

/// Cross an incoming sell against the bids, best (highest) price first.
fn take_bids(
    bids: &mut BidBook,
    ledger: &mut TradeLedger,
    taker: &mut Order,
    executed_at: i64,
) -> Result<Vec<Trade>, EngineError> {
    let mut trades = Vec::new();
    while !taker.is_filled() {
        let Some((maker_price, level)) = bids.best_level_mut() else {
            break;
        };
        if !crossing::crosses(taker.side, taker.price, maker_price) {
            break;
        }
        let Some(maker_remaining) = level.front().map(Order::remaining) else {
            break;
        };
        let fill = taker.remaining().min(maker_remaining);
        taker.fill(fill).map_err(EngineError::from)?;
        let maker = match level.fill_front(fill) {
            Some(result) => result.map_err(EngineError::from)?,
            None => break,
        };
        trades.push(ledger.record(taker, &maker, maker_price, fill, executed_at));
        bids.prune_if_empty(maker_price);
    }
    Ok(trades)
}
