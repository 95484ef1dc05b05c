//! Price level with FIFO time priority
//!
//! A price level owns every resting order at one price, in arrival order.
//! The queue position is an order's time priority: a partial fill reduces
//! the front order's remaining size but never moves it, so priority is
//! kept until the order is fully consumed.

use std::collections::VecDeque;

use exchange_types::errors::StateError;
use exchange_types::ids::OrderId;
use exchange_types::numeric::Quantity;
use exchange_types::order::Order;

/// All resting orders at a single price, earliest submission first.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
    total_remaining: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order at the back of the queue (latest time priority).
    pub fn push_back(&mut self, order: Order) {
        self.total_remaining += order.remaining();
        self.orders.push_back(order);
    }

    /// The order with the best time priority at this price.
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Execute `qty` against the front order and return its state after
    /// the fill. A fully consumed order leaves the queue; a partially
    /// consumed one keeps its position.
    pub fn fill_front(&mut self, qty: Quantity) -> Option<Result<Order, StateError>> {
        let front = self.orders.front_mut()?;
        if let Err(err) = front.fill(qty) {
            return Some(Err(err));
        }
        let snapshot = front.clone();
        self.total_remaining = self.total_remaining.saturating_sub(qty);
        if snapshot.is_filled() {
            self.orders.pop_front();
        }
        Some(Ok(snapshot))
    }

    /// Remove an order wherever it sits in the queue.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self
            .orders
            .iter()
            .position(|order| &order.order_id == order_id)?;
        let order = self.orders.remove(position)?;
        self.total_remaining = self.total_remaining.saturating_sub(order.remaining());
        Some(order)
    }

    /// Orders in time-priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Aggregate unfilled quantity resting at this price.
    pub fn total_remaining(&self) -> Quantity {
        self.total_remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_types::ids::{AccountId, MarketId};
    use exchange_types::numeric::Price;
    use exchange_types::order::{OrderDraft, OrderStatus, Side};

    fn resting_order(size: u64, seq: u64) -> Order {
        let draft = OrderDraft {
            market: MarketId::new("USD/EUR"),
            account_id: AccountId::new(),
            side: Side::Sell,
            price: Price::new(100),
            size: Quantity::new(size),
            signature: "SIGA".to_string(),
            created_at: 1_708_123_456_789_000_000 + seq as i64,
        };
        let mut order = Order::from_draft(draft, seq);
        order.begin_matching().unwrap();
        order
    }

    #[test]
    fn test_fifo_order_is_kept() {
        let mut level = PriceLevel::new();
        let first = resting_order(10, 1);
        let first_id = first.order_id;
        level.push_back(first);
        level.push_back(resting_order(20, 2));

        assert_eq!(level.front().unwrap().order_id, first_id);
        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_remaining(), Quantity::new(30));
    }

    #[test]
    fn test_fill_front_partial_keeps_position() {
        let mut level = PriceLevel::new();
        let first = resting_order(10, 1);
        let first_id = first.order_id;
        level.push_back(first);
        level.push_back(resting_order(20, 2));

        let maker = level.fill_front(Quantity::new(4)).unwrap().unwrap();
        assert_eq!(maker.order_id, first_id);
        assert_eq!(maker.status, OrderStatus::PartiallyFilled);
        assert_eq!(maker.remaining(), Quantity::new(6));

        // Still at the front with its reduced size.
        assert_eq!(level.front().unwrap().order_id, first_id);
        assert_eq!(level.total_remaining(), Quantity::new(26));
    }

    #[test]
    fn test_fill_front_full_pops_order() {
        let mut level = PriceLevel::new();
        level.push_back(resting_order(10, 1));
        let second = resting_order(20, 2);
        let second_id = second.order_id;
        level.push_back(second);

        let maker = level.fill_front(Quantity::new(10)).unwrap().unwrap();
        assert_eq!(maker.status, OrderStatus::Filled);
        assert_eq!(level.front().unwrap().order_id, second_id);
        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_remaining(), Quantity::new(20));
    }

    #[test]
    fn test_fill_front_on_empty_level() {
        let mut level = PriceLevel::new();
        assert!(level.fill_front(Quantity::new(1)).is_none());
    }

    #[test]
    fn test_remove_mid_queue() {
        let mut level = PriceLevel::new();
        level.push_back(resting_order(10, 1));
        let middle = resting_order(20, 2);
        let middle_id = middle.order_id;
        level.push_back(middle);
        level.push_back(resting_order(30, 3));

        let removed = level.remove(&middle_id).unwrap();
        assert_eq!(removed.order_id, middle_id);
        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_remaining(), Quantity::new(40));
        assert!(level.remove(&middle_id).is_none());
    }
}
