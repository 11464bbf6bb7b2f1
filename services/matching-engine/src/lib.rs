//! Matching Engine Service
//!
//! Per-pair limit order books with price-time priority matching.
//!
//! **Key Invariants:**
//! - Best price first, earliest accepted order first within a price
//! - Trades execute at the resting order's price
//! - A book is never left crossed
//! - Operations on one pair are serialized; different pairs never contend
//! - Quantity is conserved per order: filled + remaining = original

pub mod book;
pub mod config;
pub mod engine;
pub mod events;
pub mod matching;
pub mod registry;
pub mod sequence;

pub use book::{BookSnapshot, DepthLevel, OrderBook};
pub use config::{EngineConfig, SelfTradePolicy};
pub use engine::{MatchingEngine, SubmitReport};
pub use events::EngineEvent;
pub use registry::BookRegistry;
