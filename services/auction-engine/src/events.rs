//! Engine events
//!
//! Serialized facts emitted after each drain for downstream consumers
//! such as market data feeds and journals. Events describe what
//! already happened; replaying them rebuilds order and trade state
//! without re-running the matching pass.

use exchange_types::ids::{MarketId, OrderId};
use exchange_types::numeric::{Price, Quantity};
use exchange_types::order::{OrderStatus, Side};
use exchange_types::trade::Trade;
use serde::{Deserialize, Serialize};

use crate::engine::Execution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    /// A match was executed. The trade carries maker pricing and both
    /// order references.
    TradeExecuted { trade: Trade },

    /// A priced order (or its remainder) is now resting on the book.
    OrderRested {
        order_id: OrderId,
        market: MarketId,
        side: Side,
        price: Price,
        remaining: Quantity,
    },

    /// An order executed completely.
    OrderFilled {
        order_id: OrderId,
        market: MarketId,
        filled: Quantity,
    },

    /// A market order ran out of depth; the remainder was terminated.
    OrderCancelled {
        order_id: OrderId,
        market: MarketId,
        filled: Quantity,
        unfilled: Quantity,
    },
}

/// Expand one execution into its event stream: the trades in execution
/// order, then the incoming order's final disposition.
pub fn events_for(execution: &Execution) -> Vec<EngineEvent> {
    let mut events: Vec<EngineEvent> = execution
        .trades
        .iter()
        .map(|trade| EngineEvent::TradeExecuted {
            trade: trade.clone(),
        })
        .collect();

    let order = &execution.order;
    match order.status {
        OrderStatus::Filled => events.push(EngineEvent::OrderFilled {
            order_id: order.order_id,
            market: order.market.clone(),
            filled: order.filled,
        }),
        OrderStatus::Cancelled => events.push(EngineEvent::OrderCancelled {
            order_id: order.order_id,
            market: order.market.clone(),
            filled: order.filled,
            unfilled: order.remaining(),
        }),
        OrderStatus::New | OrderStatus::PartiallyFilled | OrderStatus::Updated => {
            events.push(EngineEvent::OrderRested {
                order_id: order.order_id,
                market: order.market.clone(),
                side: order.side,
                price: order.price,
                remaining: order.remaining(),
            })
        }
        // A drained order can no longer be waiting.
        OrderStatus::Waiting => {}
    }
    events
}
