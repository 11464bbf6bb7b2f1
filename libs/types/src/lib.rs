//! Types library for the order matching core
//!
//! Core type definitions shared by the matching engine and its callers.
//! All prices and quantities are fixed-point decimals.
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, TradeId, AccountId, MarketId)
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `order`: Order lifecycle types
//! - `fill`: Fill (execution) records
//! - `errors`: Error taxonomy
//! - `time`: Timestamp helpers

pub mod ids;
pub mod numeric;
pub mod order;
pub mod fill;
pub mod errors;
pub mod time;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::fill::*;
    pub use crate::errors::*;
}
