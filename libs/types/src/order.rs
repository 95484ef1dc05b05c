//! Order lifecycle types
//!
//! An order is the unit of intent: one party's wish to buy or sell a
//! quantity of an instrument at a limit price (or at market). The status
//! enum is the closed state machine the engine drives; every transition
//! outside it is a defect, not a code path.

use crate::errors::{StateError, SubmitError};
use crate::ids::{AccountId, MarketId, OrderId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order matches against.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order status state machine.
///
/// `Waiting → New → PartiallyFilled → Filled`, with two side doors:
/// `Updated` marks a resting order whose remaining size was amended by a
/// collaborator (book-eligible exactly like `PartiallyFilled`), and
/// `Cancelled` terminates the unfilled remainder of a market order once
/// depth is exhausted. The engine itself never resurrects a terminal
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Submitted, not yet picked up by a queue drain.
    Waiting,
    /// Accepted into matching, nothing executed yet.
    New,
    /// Some but not all quantity executed.
    PartiallyFilled,
    /// Resting order amended externally; still eligible to match.
    Updated,
    /// Fully executed (terminal).
    Filled,
    /// Terminated with unfilled remainder (terminal).
    Cancelled,
}

impl OrderStatus {
    /// True once no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    /// True for statuses that keep an order resting on the book.
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            OrderStatus::New | OrderStatus::Updated | OrderStatus::PartiallyFilled
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Waiting => "WAITING",
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Updated => "UPDATED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{label}")
    }
}

/// Submission payload, validated before an `Order` exists.
///
/// The caller supplies `created_at` (unix nanos) so that a journal of
/// drafts replays to the identical execution sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub market: MarketId,
    pub account_id: AccountId,
    pub side: Side,
    pub price: Price,
    pub size: Quantity,
    pub signature: String,
    pub created_at: i64,
}

impl OrderDraft {
    /// Reject drafts the engine must never see.
    ///
    /// Unknown sides and negative prices are unrepresentable here by
    /// construction, which leaves size as the only runtime check.
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.size.is_zero() {
            return Err(SubmitError::ZeroSize);
        }
        Ok(())
    }
}

/// A live order record.
///
/// `order_id`, `market`, `account_id`, `side`, `price`, `size`,
/// `created_at`, `seq` and `signature` are immutable after creation; only
/// `filled` and `status` move, and `filled` only upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub market: MarketId,
    pub account_id: AccountId,
    pub side: Side,
    pub price: Price,
    pub size: Quantity,
    pub filled: Quantity,
    pub status: OrderStatus,
    pub created_at: i64,
    /// Engine-assigned submission sequence; the always-unique tie-break
    /// for orders sharing a price and a timestamp.
    pub seq: u64,
    /// Opaque authenticity token; carried, never interpreted.
    pub signature: String,
}

impl Order {
    /// Build a `Waiting` order from a validated draft.
    pub fn from_draft(draft: OrderDraft, seq: u64) -> Self {
        Self {
            order_id: OrderId::new(),
            market: draft.market,
            account_id: draft.account_id,
            side: draft.side,
            price: draft.price,
            size: draft.size,
            filled: Quantity::ZERO,
            status: OrderStatus::Waiting,
            created_at: draft.created_at,
            seq,
            signature: draft.signature,
        }
    }

    /// Quantity still open for execution.
    pub fn remaining(&self) -> Quantity {
        self.size.saturating_sub(self.filled)
    }

    pub fn is_filled(&self) -> bool {
        self.filled == self.size
    }

    pub fn has_fills(&self) -> bool {
        !self.filled.is_zero()
    }

    /// True while the order may sit on the book: a resting status and a
    /// real limit price. Market orders never rest.
    pub fn is_book_eligible(&self) -> bool {
        self.status.is_resting() && !self.price.is_market()
    }

    /// `filled ≤ size` must hold after every operation.
    pub fn consistent(&self) -> bool {
        self.filled <= self.size
    }

    /// `WAITING → NEW` at the start of processing. Any other inbound
    /// state, or a fill count past the order size, is surfaced as a
    /// defect.
    pub fn begin_matching(&mut self) -> Result<(), StateError> {
        if !self.consistent() {
            return Err(StateError::Overfill {
                order_id: self.order_id,
                filled: self.filled,
                size: self.size,
            });
        }
        match self.status {
            OrderStatus::Waiting => {
                self.status = OrderStatus::New;
                Ok(())
            }
            status => Err(StateError::UnexpectedStatus {
                order_id: self.order_id,
                status,
            }),
        }
    }

    /// Apply an execution of `qty` and recompute the status.
    pub fn fill(&mut self, qty: Quantity) -> Result<(), StateError> {
        let filled = self
            .filled
            .checked_add(qty)
            .filter(|total| *total <= self.size)
            .ok_or(StateError::Overfill {
                order_id: self.order_id,
                filled: self.filled,
                size: self.size,
            })?;
        self.filled = filled;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        Ok(())
    }

    /// Terminate the unfilled remainder. Used for market orders that ran
    /// out of depth; the true executed quantity stays in `filled`.
    pub fn cancel_remainder(&mut self) {
        debug_assert!(!self.status.is_terminal());
        self.status = OrderStatus::Cancelled;
    }

    /// Submission instant as a UTC datetime, for logs and reports.
    pub fn created_at_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_nanos(self.created_at)
    }
}
