//! Error types for the matching core
//!
//! Comprehensive error taxonomy using thiserror. Client-input errors live
//! here; internal invariant violations are not represented as values, they
//! panic inside the pair's exclusive section. The only trace such a panic
//! leaves is `BookPoisoned` on every later operation against that pair.

use thiserror::Error;

use crate::ids::{MarketId, OrderId};

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Contract violation by the caller (should have been rejected upstream)
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// An earlier operation panicked mid-mutation; the book is no longer trusted
    #[error("Order book {pair} poisoned by an interrupted operation")]
    BookPoisoned { pair: MarketId },
}

impl EngineError {
    /// Expected outcome rather than a fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Order(OrderError::NotFound { .. }))
    }
}

/// Order-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Not currently resting: already filled, already canceled, or unknown
    #[error("Order not found: {order_id}")]
    NotFound { order_id: OrderId },

    #[error("Duplicate order id: {order_id}")]
    Duplicate { order_id: OrderId },
}

/// Fixed-point construction and parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("price must be positive, got {0}")]
    NonPositivePrice(String),

    #[error("quantity must not be negative, got {0}")]
    NegativeQuantity(String),

    #[error("not a decimal number: {0:?}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_error_display() {
        let err = OrderError::NotFound { order_id: OrderId::new(12) };
        assert_eq!(err.to_string(), "Order not found: 12");
    }

    #[test]
    fn test_engine_error_from_order_error() {
        let engine_err: EngineError = OrderError::NotFound { order_id: OrderId::new(1) }.into();
        assert!(matches!(engine_err, EngineError::Order(_)));
        assert!(engine_err.is_not_found());
    }
}
