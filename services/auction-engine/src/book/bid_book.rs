//! Bid (buy-side) book
//!
//! Buy orders keyed by price in a `BTreeMap`, walked highest-first. The
//! map is the maintained index: best-price lookup and priority iteration
//! are incremental, never a re-sort of the whole side.

use std::collections::BTreeMap;

use exchange_types::ids::OrderId;
use exchange_types::numeric::{Price, Quantity};
use exchange_types::order::{Order, Side};

use super::price_level::PriceLevel;

/// Buy side of a market's book. Best price is the highest.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resting buy order at its limit price.
    pub fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.side, Side::Buy);
        debug_assert!(order.is_book_eligible());
        self.levels
            .entry(order.price)
            .or_default()
            .push_back(order);
    }

    /// Highest resting bid price, if the side is non-empty.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// The best level, mutable, for the matching pass.
    pub(crate) fn best_level_mut(&mut self) -> Option<(Price, &mut PriceLevel)> {
        self.levels
            .iter_mut()
            .next_back()
            .map(|(price, level)| (*price, level))
    }

    /// Drop a level once the matching pass has emptied it.
    pub(crate) fn prune_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// Remove one order from the side, e.g. for an external amendment.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let order = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(order)
    }

    /// Levels in matching priority order (highest price first).
    pub fn levels(&self) -> impl Iterator<Item = (Price, &PriceLevel)> {
        self.levels.iter().rev().map(|(price, level)| (*price, level))
    }

    /// Resting orders in matching priority order: highest price, then
    /// earliest submission. A fresh traversal on every call.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.levels.values().rev().flat_map(PriceLevel::iter)
    }

    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::order_count).sum()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Aggregate unfilled quantity across the whole side.
    pub fn total_remaining(&self) -> Quantity {
        self.levels.values().map(PriceLevel::total_remaining).sum()
    }
}
