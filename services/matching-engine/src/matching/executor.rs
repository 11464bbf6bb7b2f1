//! Fill generation
//!
//! Turns one maker/taker pairing into a `Fill` stamped with the next global
//! fill sequence. Execution price is always the maker's price.

use std::sync::Arc;

use types::fill::Fill;
use types::ids::MarketId;
use types::numeric::Quantity;
use types::order::Order;

use crate::sequence::SequenceGenerator;

/// Fill factory for one pair's book
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    pair: MarketId,
    fill_sequence: Arc<SequenceGenerator>,
}

impl MatchExecutor {
    pub fn new(pair: MarketId, fill_sequence: Arc<SequenceGenerator>) -> Self {
        Self { pair, fill_sequence }
    }

    /// Execute a fill between a resting maker and an incoming taker
    pub fn execute(&self, maker: &Order, taker: &Order, quantity: Quantity, timestamp: i64) -> Fill {
        Fill::new(
            self.fill_sequence.next(),
            self.pair.clone(),
            maker.order_id,
            taker.order_id,
            maker.account_id,
            taker.account_id,
            taker.side,
            maker.price, // Maker always gets its quoted price
            quantity,
            timestamp,
        )
    }
}
