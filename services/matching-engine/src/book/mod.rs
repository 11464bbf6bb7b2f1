//! Order book infrastructure module
//!
//! Contains the price level queue (one side), the per-pair order book, and
//! the depth snapshot types.

pub mod price_level;
pub mod order_book;
pub mod snapshot;

pub use price_level::PriceLevelQueue;
pub use order_book::OrderBook;
pub use snapshot::{BookSnapshot, DepthLevel};
