//! Error taxonomy for the matching core
//!
//! Submission problems are rejected before an order ever enters the queue;
//! state problems discovered during matching are fatal defects and are
//! surfaced to the caller instead of being silently corrected. Everything
//! else (no liquidity, partial fill, zero matches) is a normal outcome,
//! not an error.

use crate::ids::OrderId;
use crate::numeric::Quantity;
use crate::order::OrderStatus;
use thiserror::Error;

/// Rejections produced at submission time, before `WAITING`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("order size must be positive")]
    ZeroSize,

    #[error("submission queue full: capacity {capacity}")]
    QueueFull { capacity: usize },
}

/// Invariant violations detected while an order is being processed.
///
/// These indicate a defect elsewhere (a corrupted record reached the
/// engine); matching never repairs them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("order {order_id} has filled {filled} exceeding size {size}")]
    Overfill {
        order_id: OrderId,
        filled: Quantity,
        size: Quantity,
    },

    #[error("order {order_id} entered matching with status {status}")]
    UnexpectedStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
}

/// Top-level failure of a queue drain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("inconsistent order state: {0}")]
    Inconsistent(#[from] StateError),
}
