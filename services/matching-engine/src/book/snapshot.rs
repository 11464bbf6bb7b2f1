//! Aggregated depth views of a book
//!
//! Snapshots are private copies taken inside the pair's exclusive section, so
//! a caller never observes a view straddling a concurrent mutation.

use serde::{Deserialize, Serialize};
use types::ids::MarketId;
use types::numeric::{Price, Quantity};

/// Resting quantity aggregated at one price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: u32,
}

/// Both sides of a book, most-priority-first, truncated to the requested depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub pair: MarketId,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    /// Sequence number of the last order admitted to this book, if any
    pub last_sequence: Option<u64>,
}

impl BookSnapshot {
    /// Snapshot of a pair that has no book yet
    pub fn empty(pair: MarketId) -> Self {
        Self {
            pair,
            bids: Vec::new(),
            asks: Vec::new(),
            last_sequence: None,
        }
    }

    pub fn best_bid(&self) -> Option<&DepthLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&DepthLevel> {
        self.asks.first()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
