//! Price compatibility between the two sides
//!
//! Equal prices cross. A book whose best bid reaches its best ask is crossed
//! and must never be left that way.

use types::numeric::Price;
use types::order::Side;

/// A bid at `bid_price` trades with an ask at `ask_price`
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// An incoming order on `side` at `limit` reaches a resting order at `resting`
pub fn incoming_can_match(side: Side, limit: Price, resting: Price) -> bool {
    match side {
        Side::BUY => can_match(limit, resting),
        Side::SELL => can_match(resting, limit),
    }
}

/// Top of book check; an empty side is never crossed
pub fn is_crossed(best_bid: Option<Price>, best_ask: Option<Price>) -> bool {
    matches!((best_bid, best_ask), (Some(bid), Some(ask)) if can_match(bid, ask))
}
