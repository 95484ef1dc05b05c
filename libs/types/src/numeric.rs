//! Fixed-unit integer types for prices and quantities
//!
//! Prices are counted in the instrument's minimal price unit and sizes in
//! the minimal size unit, so all matching arithmetic stays in `u64` and is
//! exact by construction. Notional values (price × size) are computed in
//! `rust_decimal::Decimal` to stay out of integer-overflow territory.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Price in minimal price units.
///
/// `Price::MARKET` (zero) is the sentinel for a market order: execute at
/// whatever prices are available, never rest on the book. A zero price is
/// therefore never a valid limit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Sentinel for "no limit": take liquidity at any price.
    pub const MARKET: Price = Price(0);

    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// True for the market-order sentinel.
    pub const fn is_market(&self) -> bool {
        self.0 == 0
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_market() {
            write!(f, "MKT")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u64> for Price {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

/// Quantity in minimal size units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Difference that bottoms out at zero instead of wrapping.
    pub const fn saturating_sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_sub(rhs.0))
    }

    /// Checked addition, `None` on overflow.
    pub fn checked_add(self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_add(rhs.0).map(Quantity)
    }

    pub fn min(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.min(rhs.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Quantity {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Quantity {
        iter.fold(Quantity::ZERO, Add::add)
    }
}

/// Notional value of an execution: price × size, in quote units.
pub fn notional(price: Price, size: Quantity) -> Decimal {
    price.as_decimal() * size.as_decimal()
}
