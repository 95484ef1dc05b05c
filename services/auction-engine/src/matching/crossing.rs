//! Price-crossing predicate
//!
//! A match is permitted when the taker's limit meets the maker's price.
//! The market-order sentinel has no limit and crosses any resting price.

use exchange_types::numeric::Price;
use exchange_types::order::Side;

/// Does an incoming order at `taker_price` cross a resting order at
/// `maker_price`?
///
/// A buyer crosses makers priced at or below its limit; a seller crosses
/// makers priced at or above its limit. Because depth is walked in price
/// order, the first failing candidate ends the whole pass.
pub fn crosses(taker_side: Side, taker_price: Price, maker_price: Price) -> bool {
    if taker_price.is_market() {
        return true;
    }
    match taker_side {
        Side::Buy => taker_price >= maker_price,
        Side::Sell => taker_price <= maker_price,
    }
}
