//! Unique identifier types for exchange entities
//!
//! Entity identifiers use UUID v7, which embeds the creation timestamp and
//! therefore sorts chronologically. That keeps identifier order consistent
//! with submission order when records are replayed from a journal.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh identifier carrying the current timestamp.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID, e.g. one read back from storage.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for an order.
    OrderId
}

uuid_id! {
    /// Unique identifier for a trade record.
    TradeId
}

uuid_id! {
    /// Opaque reference to the submitting party. Identity itself (users,
    /// API keys, balances) is managed outside the matching core.
    AccountId
}

/// Market identifier (trading pair), `"BASE/QUOTE"` form.
///
/// The matching core treats a market purely as a partition key: every
/// market gets an independent book. Listing and delisting markets is a
/// catalog concern handled elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    /// Create a new MarketId from a string.
    ///
    /// # Panics
    /// Panics if the format is invalid (must contain '/').
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(s.contains('/'), "MarketId must be in BASE/QUOTE format");
        Self(s)
    }

    /// Non-panicking constructor for untrusted input.
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        s.contains('/').then_some(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into base and quote assets.
    pub fn split(&self) -> (&str, &str) {
        match self.0.split_once('/') {
            Some(parts) => parts,
            None => (self.0.as_str(), ""),
        }
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
