//! Submission queue
//!
//! Holds `WAITING` orders for one market until the next drain. Each
//! submission gets the market's next sequence number; the capture step
//! orders the batch by submission time, with the sequence preserving
//! arrival order across identical timestamps. An order that leaves the
//! queue is never re-admitted.

use std::collections::VecDeque;

use exchange_types::errors::SubmitError;
use exchange_types::ids::{MarketId, OrderId};
use exchange_types::order::{Order, OrderDraft};
use tracing::debug;

/// Bounds for the submission buffer.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of undrained orders held per market.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 100_000 }
    }
}

/// FIFO buffer of `WAITING` orders for a single market.
#[derive(Debug)]
pub struct SubmissionQueue {
    market: MarketId,
    pending: VecDeque<Order>,
    next_seq: u64,
    config: QueueConfig,
}

impl SubmissionQueue {
    pub fn new(market: MarketId) -> Self {
        Self::with_config(market, QueueConfig::default())
    }

    pub fn with_config(market: MarketId, config: QueueConfig) -> Self {
        Self {
            market,
            pending: VecDeque::new(),
            next_seq: 1,
            config,
        }
    }

    /// Validate a draft and enqueue it as a `WAITING` order.
    pub fn submit(&mut self, draft: OrderDraft) -> Result<OrderId, SubmitError> {
        draft.validate()?;
        if self.pending.len() >= self.config.capacity {
            return Err(SubmitError::QueueFull {
                capacity: self.config.capacity,
            });
        }

        let order = Order::from_draft(draft, self.next_seq);
        self.next_seq += 1;

        debug!(
            order_id = %order.order_id,
            market = %self.market,
            side = %order.side,
            price = %order.price,
            size = %order.size,
            seq = order.seq,
            "order queued"
        );

        let order_id = order.order_id;
        self.pending.push_back(order);
        Ok(order_id)
    }

    /// Take every queued order, in processing order: ascending
    /// `created_at`, with arrival order deciding ties (the sort is
    /// stable and the queue is FIFO).
    pub fn capture(&mut self) -> Vec<Order> {
        let mut batch: Vec<Order> = self.pending.drain(..).collect();
        batch.sort_by_key(|order| order.created_at);
        batch
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
