//! Matching logic module
//!
//! Implements price-time priority matching with maker-price execution

pub mod algorithm;
pub mod crossing;
pub mod executor;

pub use algorithm::{match_order, MatchOutcome};
pub use crossing::{can_match, incoming_can_match};
pub use executor::MatchExecutor;
