//! Append-only trade ledger
//!
//! Builds trade records at maker pricing and stamps each with the
//! market's next ledger sequence. Sequences are handed out inside the
//! matching pass, so ledger order always agrees with execution order.

use exchange_types::numeric::{Price, Quantity};
use exchange_types::order::{Order, Side};
use exchange_types::trade::Trade;
use tracing::debug;

/// Trade factory for one market's ledger.
#[derive(Debug)]
pub struct TradeLedger {
    next_sequence: u64,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::with_starting_sequence(1)
    }

    /// Resume from a known ledger position, e.g. after recovery.
    pub fn with_starting_sequence(sequence: u64) -> Self {
        Self {
            next_sequence: sequence,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Record one match. The execution price is the maker's; the trade's
    /// side is the taker's; buyer and seller identifiers follow each
    /// order's actual side regardless of which one was incoming.
    pub fn record(
        &mut self,
        taker: &Order,
        maker: &Order,
        price: Price,
        size: Quantity,
        executed_at: i64,
    ) -> Trade {
        debug_assert_eq!(maker.side, taker.side.opposite());
        let (buy_order_id, sell_order_id) = match taker.side {
            Side::Buy => (taker.order_id, maker.order_id),
            Side::Sell => (maker.order_id, taker.order_id),
        };
        let trade = Trade::new(
            self.next_sequence(),
            taker.market.clone(),
            buy_order_id,
            sell_order_id,
            taker.side,
            price,
            size,
            executed_at,
        );
        debug!(
            trade_id = %trade.trade_id,
            sequence = trade.sequence,
            market = %trade.market,
            price = %trade.price,
            size = %trade.size,
            taker_side = %trade.side,
            "trade recorded"
        );
        trade
    }
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new()
    }
}
