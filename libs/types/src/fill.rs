//! Fill (trade execution) records
//!
//! A fill is produced by the matching algorithm, never stored by it. It is
//! handed to the caller for external persistence and notification.

use crate::ids::{AccountId, MarketId, OrderId, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One execution between a resting maker and an incoming taker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub trade_id: TradeId,
    pub sequence: u64, // Global monotonic fill sequence
    pub pair: MarketId,

    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_account_id: AccountId,
    pub taker_account_id: AccountId,

    /// Side of the taker
    pub side: Side,
    /// Always the maker's limit price
    pub price: Price,
    pub quantity: Quantity,

    pub executed_at: i64, // Unix nanos
}

impl Fill {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        pair: MarketId,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_account_id: AccountId,
        taker_account_id: AccountId,
        side: Side,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            pair,
            maker_order_id,
            taker_order_id,
            maker_account_id,
            taker_account_id,
            side,
            price,
            quantity,
            executed_at,
        }
    }

    /// Quote value of the fill (price × quantity), `None` on decimal overflow
    pub fn notional(&self) -> Option<Decimal> {
        self.quantity.as_decimal().checked_mul(self.price.as_decimal())
    }

    /// Same owner on both sides
    pub fn is_self_trade(&self) -> bool {
        self.maker_account_id == self.taker_account_id
    }
}
