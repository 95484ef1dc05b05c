//! Depth projections
//!
//! Read-only views over the book: best bid/ask (level 1) and per-price
//! aggregate remaining size (level 2). Projections read whatever the book
//! holds at call time; a caller that needs a point-in-time snapshot must
//! read from inside the market's single-writer task.

use exchange_types::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

use crate::book::{AskBook, BidBook};

/// One aggregated price level on one side of the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    /// Sum of remaining (unfilled) size across the level's orders.
    pub size: Quantity,
    /// Number of orders resting at this price.
    pub orders: u32,
}

/// Best prices on both sides of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTop {
    pub bid: Option<Price>,
    pub ask: Option<Price>,
}

impl BookTop {
    /// Ask minus bid, in price units, when both sides are quoted and the
    /// book is not crossed.
    pub fn spread(&self) -> Option<u64> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask.as_u64() - bid.as_u64()),
            _ => None,
        }
    }
}

/// Level-2 view of the buy side, best (highest) price first.
pub fn bid_depth(book: &BidBook) -> Vec<DepthLevel> {
    book.levels()
        .map(|(price, level)| DepthLevel {
            price,
            size: level.total_remaining(),
            orders: level.order_count() as u32,
        })
        .collect()
}

/// Level-2 view of the sell side, best (lowest) price first.
pub fn ask_depth(book: &AskBook) -> Vec<DepthLevel> {
    book.levels()
        .map(|(price, level)| DepthLevel {
            price,
            size: level.total_remaining(),
            orders: level.order_count() as u32,
        })
        .collect()
}
