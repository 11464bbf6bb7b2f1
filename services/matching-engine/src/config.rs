//! Engine configuration
//!
//! Plain settings struct with defaults; callers can build it in code or load
//! it from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when an incoming order would trade against a resting order of
/// the same owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfTradePolicy {
    /// Match like any other pair of orders
    #[default]
    Allow,
    /// Cancel the resting order and keep matching
    CancelResting,
    /// Stop matching and cancel what is left of the incoming order
    CancelIncoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// First order id handed out
    pub first_order_sequence: u64,
    /// First fill sequence handed out
    pub first_fill_sequence: u64,
    pub self_trade_policy: SelfTradePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            first_order_sequence: 1,
            first_fill_sequence: 1,
            self_trade_policy: SelfTradePolicy::Allow,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sequences must start at 1 or above")]
    ZeroSequence,
}

impl EngineConfig {
    /// Load from a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_order_sequence == 0 || self.first_fill_sequence == 0 {
            return Err(ConfigError::ZeroSequence);
        }
        Ok(())
    }
}
