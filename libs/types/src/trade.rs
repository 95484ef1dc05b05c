//! Trade execution records
//!
//! A trade is the unit of execution: one match between a resting order and
//! the order that crossed it. Trades are immutable once created and form
//! an append-only ledger; settlement and fund movement happen elsewhere.

use crate::ids::{MarketId, OrderId, TradeId};
use crate::numeric::{notional, Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Position in the market's ledger; strictly increasing per market and
    /// consistent with the matching pass that produced the trade.
    pub sequence: u64,
    pub market: MarketId,

    /// The buying order, whichever side initiated.
    pub buy_order_id: OrderId,
    /// The selling order, whichever side initiated.
    pub sell_order_id: OrderId,

    /// Side of the taker: records which side initiated the match.
    pub side: Side,
    /// Execution price. Always the resting (maker) order's price.
    pub price: Price,
    /// Executed quantity for this match.
    pub size: Quantity,

    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        market: MarketId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        side: Side,
        price: Price,
        size: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            market,
            buy_order_id,
            sell_order_id,
            side,
            price,
            size,
            executed_at,
        }
    }

    /// Value exchanged, in quote units: price × size.
    pub fn notional(&self) -> Decimal {
        notional(self.price, self.size)
    }

    /// Execution instant as a UTC datetime, for logs and reports.
    pub fn executed_at_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_nanos(self.executed_at)
    }
}
