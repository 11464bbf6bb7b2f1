//! Matching engine core
//!
//! Service object handed to callers. Turns validated requests into orders,
//! runs them through the registry's per-pair exclusive sections, and returns
//! reports the caller persists and broadcasts after the section is released.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use types::errors::{EngineError, OrderError};
use types::fill::Fill;
use types::ids::{MarketId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderRequest};
use types::time::now_nanos;

use crate::book::BookSnapshot;
use crate::config::{ConfigError, EngineConfig};
use crate::events::{CancelSource, EngineEvent, OrderAcceptedEvent};
use crate::registry::BookRegistry;

/// Main matching engine
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    registry: Arc<BookRegistry>,
    config: EngineConfig,
}

/// Result of submitting an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReport {
    pub accepted: OrderAcceptedEvent,
    /// Fills in execution order
    pub fills: Vec<Fill>,
    /// Final state of the submitted order
    pub order: Order,
    /// Final state of each resting order the submission traded against
    pub maker_updates: Vec<Order>,
}

impl SubmitReport {
    /// Total base quantity the submitted order traded
    pub fn filled_quantity(&self) -> Quantity {
        self.fills.iter().map(|f| f.quantity).sum()
    }

    /// Total quote value traded, `None` on decimal overflow
    pub fn notional(&self) -> Option<Decimal> {
        self.fills
            .iter()
            .try_fold(Decimal::ZERO, |total, fill| total.checked_add(fill.notional()?))
    }

    /// Volume-weighted execution price, if anything traded
    pub fn average_price(&self) -> Option<Price> {
        let filled = self.filled_quantity();
        if filled.is_zero() {
            return None;
        }
        let average = self.notional()?.checked_div(filled.as_decimal())?;
        Price::try_new(average).ok()
    }

    /// Flatten into events: acceptance, fills, maker updates, final taker state
    pub fn events(&self) -> Vec<EngineEvent> {
        let mut events = Vec::with_capacity(2 + self.fills.len() + self.maker_updates.len());
        events.push(EngineEvent::OrderAccepted(self.accepted.clone()));
        events.extend(self.fills.iter().cloned().map(EngineEvent::TradeExecuted));
        events.extend(
            self.maker_updates
                .iter()
                .map(|maker| EngineEvent::for_order(maker, CancelSource::System)),
        );
        events.push(EngineEvent::for_order(&self.order, CancelSource::System));
        events
    }
}

impl MatchingEngine {
    /// Create an engine with its own registry
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(BookRegistry::new(&config)?);
        Ok(Self::assemble(config, registry))
    }

    /// Create an engine over an existing registry
    pub fn with_registry(config: EngineConfig, registry: Arc<BookRegistry>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, registry))
    }

    fn assemble(config: EngineConfig, registry: Arc<BookRegistry>) -> Self {
        info!(
            first_order_sequence = config.first_order_sequence,
            self_trade_policy = ?config.self_trade_policy,
            "MatchingEngine initialized"
        );
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<BookRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Submit an order to its pair's book
    ///
    /// The order id is drawn inside the pair's exclusive section, so ids
    /// follow the order in which submissions took effect.
    pub fn submit(&self, request: OrderRequest) -> Result<SubmitReport, EngineError> {
        if let Err(err) = request.validate() {
            warn!(pair = %request.pair, error = %err, "Rejecting order request");
            return Err(EngineError::InvalidOperation { reason: err.to_string() });
        }

        let handle = self.registry.for_pair(&request.pair);
        let mut book = handle.lock();

        let timestamp = now_nanos();
        let mut order = Order::admit(self.registry.next_order_id(), request, timestamp);
        let accepted = OrderAcceptedEvent::from(&order);

        let outcome = book.submit(&mut order, timestamp)?;

        for maker in outcome.resolved_makers() {
            self.registry.forget(&maker.order_id);
        }
        if book.contains(&order.order_id) {
            self.registry.record_resting(order.order_id, &order.pair);
        }
        drop(book);

        debug!(
            pair = %order.pair,
            order_id = %order.order_id,
            fills = outcome.fills.len(),
            status = ?order.status,
            remaining = %order.remaining_quantity,
            "Order processed"
        );

        Ok(SubmitReport {
            accepted,
            fills: outcome.fills,
            order,
            maker_updates: outcome.maker_updates,
        })
    }

    /// Cancel a resting order, locating its pair through the registry
    pub fn cancel(&self, order_id: OrderId) -> Result<Order, EngineError> {
        match self.registry.route(&order_id) {
            Some(pair) => self.cancel_in(&pair, order_id),
            None => {
                debug!(order_id = %order_id, "Cancel for order not resting anywhere");
                Err(OrderError::NotFound { order_id }.into())
            }
        }
    }

    /// Cancel a resting order in a known pair
    pub fn cancel_in(&self, pair: &MarketId, order_id: OrderId) -> Result<Order, EngineError> {
        let Some(handle) = self.registry.get(pair) else {
            return Err(OrderError::NotFound { order_id }.into());
        };

        let mut book = handle.lock();
        let result = book.cancel(&order_id, now_nanos());
        if result.is_ok() {
            self.registry.forget(&order_id);
        }
        drop(book);

        match &result {
            Ok(order) => debug!(pair = %pair, order_id = %order_id, remaining = %order.remaining_quantity, "Cancel accepted"),
            Err(err) => debug!(pair = %pair, order_id = %order_id, error = %err, "Cancel missed"),
        }
        result
    }

    /// Aggregated book depth
    ///
    /// `None` and `Some(0)` both return every level. A pair without a book
    /// yields an empty snapshot and does not create one.
    pub fn snapshot(&self, pair: &MarketId, depth: Option<usize>) -> Result<BookSnapshot, EngineError> {
        let Some(handle) = self.registry.get(pair) else {
            return Ok(BookSnapshot::empty(pair.clone()));
        };
        let book = handle.lock();
        book.ensure_usable()?;
        Ok(book.snapshot(depth.unwrap_or(0)))
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::assemble(EngineConfig::default(), Arc::new(BookRegistry::default()))
    }
}

/// Event emitted for a successful cancellation
pub fn cancel_event(order: &Order) -> EngineEvent {
    EngineEvent::for_order(order, CancelSource::User)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;
    use types::order::{OrderStatus, Side};

    fn request(side: Side, price: u64, qty: &str, owner: u64) -> OrderRequest {
        OrderRequest::new(
            MarketId::new("BTC/USDT"),
            side,
            Price::from_u64(price),
            qty.parse::<Quantity>().unwrap(),
            AccountId::new(owner),
        )
    }

    #[test]
    fn test_engine_resting_order() {
        let engine = MatchingEngine::default();
        let report = engine.submit(request(Side::BUY, 50000, "1.0", 1)).unwrap();

        assert!(report.fills.is_empty());
        assert_eq!(report.order.status, OrderStatus::Resting);
        assert_eq!(report.order.order_id, OrderId::new(1));
        assert_eq!(engine.registry().route(&report.order.order_id), Some(MarketId::new("BTC/USDT")));
    }

    #[test]
    fn test_engine_full_match() {
        let engine = MatchingEngine::default();
        let sell = engine.submit(request(Side::SELL, 50000, "1.0", 1)).unwrap();
        let buy = engine.submit(request(Side::BUY, 50000, "1.0", 2)).unwrap();

        assert_eq!(buy.fills.len(), 1);
        assert_eq!(buy.fills[0].quantity, "1.0".parse::<Quantity>().unwrap());
        assert_eq!(buy.order.status, OrderStatus::Filled);
        assert_eq!(buy.maker_updates[0].order_id, sell.order.order_id);
        assert_eq!(engine.registry().route(&sell.order.order_id), None);
    }

    #[test]
    fn test_engine_partial_match() {
        let engine = MatchingEngine::default();
        engine.submit(request(Side::SELL, 50000, "0.5", 1)).unwrap();
        let buy = engine.submit(request(Side::BUY, 50000, "1.0", 2)).unwrap();

        assert_eq!(buy.fills.len(), 1);
        assert_eq!(buy.order.status, OrderStatus::PartiallyFilled);
        assert_eq!(buy.order.remaining_quantity, "0.5".parse::<Quantity>().unwrap());
        assert_eq!(buy.average_price(), Some(Price::from_u64(50000)));
    }

    #[test]
    fn test_engine_no_cross() {
        let engine = MatchingEngine::default();
        engine.submit(request(Side::SELL, 51000, "1.0", 1)).unwrap();
        let buy = engine.submit(request(Side::BUY, 50000, "1.0", 2)).unwrap();

        assert!(buy.fills.is_empty());
        assert_eq!(buy.order.status, OrderStatus::Resting);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let engine = MatchingEngine::default();
        let result = engine.submit(request(Side::BUY, 100, "0", 1));

        assert!(matches!(result, Err(EngineError::InvalidOperation { .. })));
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn test_cancel_routes_by_id() {
        let engine = MatchingEngine::default();
        let buy = engine.submit(request(Side::BUY, 40, "10", 1)).unwrap();

        let canceled = engine.cancel(buy.order.order_id).unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(canceled.remaining_quantity, Quantity::from_u64(10));
        assert!(engine.cancel(buy.order.order_id).unwrap_err().is_not_found());
        assert!(engine
            .cancel_in(&MarketId::new("ETH/USDT"), buy.order.order_id)
            .unwrap_err()
            .is_not_found());

        assert!(matches!(cancel_event(&canceled), EngineEvent::OrderCanceled(_)));
    }

    #[test]
    fn test_snapshot_unknown_pair_does_not_create_book() {
        let engine = MatchingEngine::default();
        let snapshot = engine.snapshot(&MarketId::new("DOGE/USDT"), None).unwrap();

        assert!(snapshot.is_empty());
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn test_snapshot_absent_depth_is_unlimited() {
        let engine = MatchingEngine::default();
        for price in 1..=12 {
            engine.submit(request(Side::BUY, price, "1", 1)).unwrap();
        }

        let pair = MarketId::new("BTC/USDT");
        assert_eq!(engine.snapshot(&pair, None).unwrap().bids.len(), 12);
        assert_eq!(engine.snapshot(&pair, Some(0)).unwrap().bids.len(), 12);
        let top = engine.snapshot(&pair, Some(3)).unwrap();
        assert_eq!(top.bids.len(), 3);
        assert_eq!(top.bids[0].price, Price::from_u64(12));
    }

    #[test]
    fn test_oversized_quantity_rejected_before_book() {
        let engine = MatchingEngine::default();
        let huge = "50000000000000000000000000000";

        for _ in 0..2 {
            let result = engine.submit(request(Side::BUY, 1, huge, 1));
            assert!(matches!(result, Err(EngineError::InvalidOperation { .. })));
        }
        assert!(engine.registry().is_empty());
        assert!(engine.snapshot(&MarketId::new("BTC/USDT"), Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_largest_admissible_orders_aggregate_exactly() {
        let engine = MatchingEngine::default();
        let max_qty = Quantity::try_new(Quantity::max_admissible()).unwrap();
        let max_price = Price::try_new(Price::max_admissible()).unwrap();
        let pair = MarketId::new("BTC/USDT");

        for owner in 1..=2 {
            engine
                .submit(OrderRequest::new(pair.clone(), Side::SELL, max_price, max_qty, AccountId::new(owner)))
                .unwrap();
        }
        let level = &engine.snapshot(&pair, None).unwrap().asks[0];
        assert_eq!(level.quantity, max_qty + max_qty);
        assert_eq!(level.order_count, 2);

        let buy = engine
            .submit(OrderRequest::new(pair.clone(), Side::BUY, max_price, max_qty, AccountId::new(3)))
            .unwrap();
        assert_eq!(buy.notional(), Some(max_qty.as_decimal() * max_price.as_decimal()));
        assert_eq!(buy.average_price(), Some(max_price));
    }

    #[test]
    fn test_new_validates_config() {
        let config = EngineConfig {
            first_order_sequence: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(MatchingEngine::new(config.clone()), Err(ConfigError::ZeroSequence)));
        assert!(matches!(
            MatchingEngine::with_registry(config, Arc::new(BookRegistry::default())),
            Err(ConfigError::ZeroSequence)
        ));

        let engine = MatchingEngine::new(EngineConfig {
            first_order_sequence: 500,
            ..EngineConfig::default()
        })
        .unwrap();
        let report = engine.submit(request(Side::BUY, 10, "1", 1)).unwrap();
        assert_eq!(report.order.order_id, OrderId::new(500));
    }

    #[test]
    fn test_report_events_order() {
        let engine = MatchingEngine::default();
        engine.submit(request(Side::SELL, 100, "5", 1)).unwrap();
        let report = engine.submit(request(Side::BUY, 100, "8", 2)).unwrap();

        let labels: Vec<_> = report.events().iter().map(|e| e.event_type_label()).collect();
        assert_eq!(
            labels,
            vec!["OrderAccepted", "TradeExecuted", "OrderFilled", "OrderPartiallyFilled"]
        );
    }
}
