//! Order lifecycle types
//!
//! An order is created `Resting` with `remaining == quantity`, is mutated only
//! by matching (fills) or cancellation, and leaves the book as an immutable
//! record once it is `Filled` or `Canceled`.

use crate::errors::OrderError;
use crate::ids::{AccountId, MarketId, OrderId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// In the book, untouched by any fill
    Resting,
    /// In the book (or on its way there) after absorbing some fills
    PartiallyFilled,
    /// Completely matched (terminal)
    Filled,
    /// Removed by cancellation (terminal)
    Canceled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled)
    }
}

/// Validated order submission handed over by the request-handling layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub pair: MarketId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub owner: AccountId,
}

impl OrderRequest {
    pub fn new(pair: MarketId, side: Side, price: Price, quantity: Quantity, owner: AccountId) -> Self {
        Self {
            pair,
            side,
            price,
            quantity,
            owner,
        }
    }

    /// Reject requests the upstream validator should never have let through.
    ///
    /// Price positivity is carried by the `Price` type; quantity may still be
    /// zero. Both are capped so book aggregates and notionals stay exact.
    pub fn validate(&self) -> Result<(), OrderError> {
        if !self.price.is_admissible() {
            return Err(OrderError::InvalidPrice(format!(
                "{} exceeds {}",
                self.price,
                Price::max_admissible()
            )));
        }
        if self.quantity.is_zero() {
            return Err(OrderError::InvalidQuantity(self.quantity.to_string()));
        }
        if !self.quantity.is_admissible() {
            return Err(OrderError::InvalidQuantity(format!(
                "{} exceeds {}",
                self.quantity,
                Quantity::max_admissible()
            )));
        }
        Ok(())
    }
}

/// Complete order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub pair: MarketId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    pub created_at: i64, // Unix nanos
    pub updated_at: i64, // Unix nanos
}

impl Order {
    /// Admit a request under the given sequence number
    pub fn admit(order_id: OrderId, request: OrderRequest, timestamp: i64) -> Self {
        Self {
            order_id,
            account_id: request.owner,
            pair: request.pair,
            side: request.side,
            price: request.price,
            quantity: request.quantity,
            filled_quantity: Quantity::zero(),
            remaining_quantity: request.quantity,
            status: OrderStatus::Resting,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Check quantity invariant: filled + remaining = total
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity + self.remaining_quantity == self.quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Still eligible for matching or cancellation
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Apply a fill and adjust status
    ///
    /// # Panics
    /// Panics if the fill would exceed the remaining quantity or violate invariants
    pub fn add_fill(&mut self, fill_quantity: Quantity, timestamp: i64) {
        assert!(self.is_active(), "Fill applied to terminal order");
        assert!(!fill_quantity.is_zero(), "Zero-quantity fill");

        let remaining = self
            .remaining_quantity
            .checked_sub(fill_quantity)
            .expect("Fill would exceed order quantity");

        self.filled_quantity = self.filled_quantity + fill_quantity;
        self.remaining_quantity = remaining;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = timestamp;

        assert!(self.check_invariant(), "Invariant violated after fill");
    }

    /// Cancel the order, keeping its remaining quantity as the final state
    ///
    /// # Panics
    /// Panics if order is already in terminal state
    pub fn cancel(&mut self, timestamp: i64) {
        assert!(self.is_active(), "Cannot cancel terminal order");

        self.status = OrderStatus::Canceled;
        self.updated_at = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_order(qty: &str) -> Order {
        let request = OrderRequest::new(
            MarketId::new("BTC/USDT"),
            Side::BUY,
            Price::from_u64(50000),
            qty.parse::<Quantity>().unwrap(),
            AccountId::new(1),
        );
        Order::admit(OrderId::new(1), request, 1708123456789000000)
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::BUY.opposite(), Side::SELL);
        assert_eq!(Side::SELL.opposite(), Side::BUY);
    }

    #[test]
    fn test_order_admission() {
        let order = create_order("1.0");

        assert_eq!(order.status, OrderStatus::Resting);
        assert_eq!(order.remaining_quantity, order.quantity);
        assert!(order.check_invariant());
        assert!(!order.has_fills());
    }

    #[test]
    fn test_order_fill() {
        let mut order = create_order("1.0");

        order.add_fill("0.3".parse::<Quantity>().unwrap(), 1708123456790000000);
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_quantity, "0.7".parse::<Quantity>().unwrap());
        assert!(order.check_invariant());

        order.add_fill("0.7".parse::<Quantity>().unwrap(), 1708123456791000000);
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.is_filled());
        assert_eq!(order.updated_at, 1708123456791000000);
    }

    #[test]
    #[should_panic(expected = "Fill would exceed order quantity")]
    fn test_order_overfill_panics() {
        let mut order = create_order("1.0");
        order.add_fill("1.5".parse::<Quantity>().unwrap(), 1708123456790000000);
    }

    #[test]
    fn test_order_cancel_keeps_remaining() {
        let mut order = create_order("1.0");
        order.add_fill("0.4".parse::<Quantity>().unwrap(), 1708123456790000000);
        order.cancel(1708123456791000000);

        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(order.remaining_quantity, "0.6".parse::<Quantity>().unwrap());
        assert!(order.status.is_terminal());
    }

    #[test]
    #[should_panic(expected = "Cannot cancel terminal order")]
    fn test_cancel_terminal_panics() {
        let mut order = create_order("1.0");
        order.add_fill("1.0".parse::<Quantity>().unwrap(), 1708123456790000000);
        order.cancel(1708123456791000000);
    }

    #[test]
    fn test_request_validation() {
        let mut request = OrderRequest::new(
            MarketId::new("BTC/USDT"),
            Side::SELL,
            Price::from_u64(10),
            Quantity::zero(),
            AccountId::new(3),
        );
        assert!(matches!(request.validate(), Err(OrderError::InvalidQuantity(_))));

        request.quantity = Quantity::from_u64(1);
        assert!(request.validate().is_ok());

        request.quantity = "50000000000000000000000000000".parse().unwrap();
        assert!(matches!(request.validate(), Err(OrderError::InvalidQuantity(_))));

        request.quantity = Quantity::from_u64(1);
        request.price = Price::from_u64(1_000_000_000_001);
        assert!(matches!(request.validate(), Err(OrderError::InvalidPrice(_))));
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"pair":"ETH/USDC","side":"SELL","price":"3000.50","quantity":"2.5","owner":17}"#;
        let request: OrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.side, Side::SELL);
        assert_eq!(request.price, "3000.5".parse::<Price>().unwrap());
        assert_eq!(request.owner, AccountId::new(17));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::PartiallyFilled).unwrap();
        assert_eq!(json, "\"PARTIALLY_FILLED\"");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fills_conserve_quantity(total in 1u64..10_000, cuts in prop::collection::vec(1u64..500, 0..20)) {
                let mut order = create_order(&total.to_string());
                for cut in cuts {
                    if order.is_filled() {
                        break;
                    }
                    let step = Quantity::from_u64(cut).min(order.remaining_quantity);
                    order.add_fill(step, 1708123456790000000);
                    prop_assert!(order.check_invariant());
                    prop_assert_eq!(order.quantity, order.filled_quantity + order.remaining_quantity);
                }
                prop_assert_eq!(order.is_filled(), order.status == OrderStatus::Filled);
            }
        }
    }
}
