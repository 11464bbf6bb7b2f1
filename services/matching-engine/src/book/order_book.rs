//! Order book for a single pair
//!
//! Owns both sides and the cancellation index. Nothing outside the book gets
//! at the queues directly; all mutation goes through `submit` and `cancel`.
//! Callers reach a book only through the registry's exclusive section.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use types::errors::{EngineError, OrderError};
use types::ids::{MarketId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

use crate::config::SelfTradePolicy;
use crate::matching::{self, crossing, MatchExecutor, MatchOutcome};
use crate::sequence::SequenceGenerator;

use super::price_level::PriceLevelQueue;
use super::snapshot::BookSnapshot;

#[derive(Debug, Clone)]
pub struct OrderBook {
    pair: MarketId,
    bids: PriceLevelQueue,
    asks: PriceLevelQueue,
    /// Which side each resting order sits on
    index: HashMap<OrderId, Side>,
    executor: MatchExecutor,
    self_trade_policy: SelfTradePolicy,
    last_sequence: Option<u64>,
    /// Set for the duration of a mutation; still set afterwards only if it panicked
    poisoned: bool,
}

impl OrderBook {
    pub fn new(pair: MarketId, fill_sequence: Arc<SequenceGenerator>, self_trade_policy: SelfTradePolicy) -> Self {
        Self {
            executor: MatchExecutor::new(pair.clone(), fill_sequence),
            pair,
            bids: PriceLevelQueue::new(Side::BUY),
            asks: PriceLevelQueue::new(Side::SELL),
            index: HashMap::new(),
            self_trade_policy,
            last_sequence: None,
            poisoned: false,
        }
    }

    pub fn pair(&self) -> &MarketId {
        &self.pair
    }

    /// Match an incoming order and rest whatever is left of it
    ///
    /// The order's final remaining quantity and status are written back into
    /// `order`. Returns the fills (in execution order) and the final state of
    /// every resting order touched.
    pub fn submit(&mut self, order: &mut Order, timestamp: i64) -> Result<MatchOutcome, EngineError> {
        self.ensure_usable()?;
        if order.pair != self.pair {
            return Err(EngineError::InvalidOperation {
                reason: format!("order {} is for {}, book is {}", order.order_id, order.pair, self.pair),
            });
        }
        if order.status != OrderStatus::Resting || order.remaining_quantity.is_zero() {
            return Err(EngineError::InvalidOperation {
                reason: format!("order {} is not a fresh order", order.order_id),
            });
        }
        if self.index.contains_key(&order.order_id) {
            return Err(OrderError::Duplicate { order_id: order.order_id }.into());
        }

        self.poisoned = true;
        self.last_sequence = Some(self.last_sequence.map_or(order.order_id.sequence(), |last| {
            last.max(order.order_id.sequence())
        }));

        let (opposing, own) = match order.side {
            Side::BUY => (&mut self.asks, &mut self.bids),
            Side::SELL => (&mut self.bids, &mut self.asks),
        };

        let outcome = matching::match_order(order, opposing, &self.executor, self.self_trade_policy, timestamp);

        for maker in outcome.resolved_makers() {
            let removed = self.index.remove(&maker.order_id);
            assert!(removed.is_some(), "resolved maker {} missing from index", maker.order_id);
        }

        if outcome.halted_by_self_trade {
            order.cancel(timestamp);
        } else if !order.remaining_quantity.is_zero() {
            own.push(order.clone())?;
            self.index.insert(order.order_id, order.side);
            debug!(
                pair = %self.pair,
                order_id = %order.order_id,
                side = ?order.side,
                price = %order.price,
                remaining = %order.remaining_quantity,
                "Order resting"
            );
        }

        self.assert_not_crossed();
        self.poisoned = false;
        Ok(outcome)
    }

    /// Remove a resting order
    ///
    /// Fails with `NotFound` when the order is not resting in this book
    /// (already filled, already canceled, or unknown).
    pub fn cancel(&mut self, order_id: &OrderId, timestamp: i64) -> Result<Order, EngineError> {
        self.ensure_usable()?;
        self.poisoned = true;
        let Some(side) = self.index.remove(order_id) else {
            self.poisoned = false;
            return Err(OrderError::NotFound { order_id: *order_id }.into());
        };

        let mut order = match self.side(side).remove(order_id) {
            Some(order) => order,
            None => panic!("indexed order {} missing from {:?} queue", order_id, side),
        };
        order.cancel(timestamp);

        debug!(
            pair = %self.pair,
            order_id = %order_id,
            remaining = %order.remaining_quantity,
            "Order canceled"
        );
        self.poisoned = false;
        Ok(order)
    }

    /// Refuse to operate on a book a panicking operation left half-mutated
    pub fn ensure_usable(&self) -> Result<(), EngineError> {
        if self.poisoned {
            return Err(EngineError::BookPoisoned { pair: self.pair.clone() });
        }
        Ok(())
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Aggregated depth, `depth == 0` meaning every level
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            pair: self.pair.clone(),
            bids: self.bids.levels(depth),
            asks: self.asks.levels(depth),
            last_sequence: self.last_sequence,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.peek_best().map(|o| o.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.peek_best().map(|o| o.price)
    }

    pub fn spread(&self) -> Option<rust_decimal::Decimal> {
        Some(self.best_ask()?.as_decimal() - self.best_bid()?.as_decimal())
    }

    /// A resting order by id
    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        let side = self.index.get(order_id)?;
        self.side_ref(*side).get(order_id)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// Resting quantity on one side
    pub fn depth_quantity(&self, side: Side) -> Quantity {
        self.side_ref(side).iter().map(|o| o.remaining_quantity).sum()
    }

    /// All resting orders, bids first, in no particular order within a side
    pub fn resting_orders(&self) -> impl Iterator<Item = &Order> {
        self.bids.iter().chain(self.asks.iter())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Full structural check: heap order, index agreement, no crossing,
    /// per-order conservation
    pub fn check_invariants(&self) -> bool {
        let sides_consistent = self.bids.is_consistent() && self.asks.is_consistent();
        let index_consistent = self.index.len() == self.bids.len() + self.asks.len()
            && self.index.iter().all(|(id, side)| self.side_ref(*side).contains(id));
        let orders_sound = self
            .resting_orders()
            .all(|o| o.check_invariant() && o.is_active() && !o.remaining_quantity.is_zero());

        sides_consistent
            && index_consistent
            && orders_sound
            && !crossing::is_crossed(self.best_bid(), self.best_ask())
    }

    fn assert_not_crossed(&self) {
        assert!(
            !crossing::is_crossed(self.best_bid(), self.best_ask()),
            "book {} crossed: bid {:?} >= ask {:?}",
            self.pair,
            self.best_bid(),
            self.best_ask()
        );
    }

    fn side(&mut self, side: Side) -> &mut PriceLevelQueue {
        match side {
            Side::BUY => &mut self.bids,
            Side::SELL => &mut self.asks,
        }
    }

    fn side_ref(&self, side: Side) -> &PriceLevelQueue {
        match side {
            Side::BUY => &self.bids,
            Side::SELL => &self.asks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;
    use types::order::OrderRequest;

    struct Harness {
        book: OrderBook,
        next_id: u64,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                book: OrderBook::new(
                    MarketId::new("BTC/USDT"),
                    Arc::new(SequenceGenerator::new(1)),
                    SelfTradePolicy::Allow,
                ),
                next_id: 1,
            }
        }

        fn submit(&mut self, side: Side, price: u64, qty: u64) -> (Order, MatchOutcome) {
            let request = OrderRequest::new(
                MarketId::new("BTC/USDT"),
                side,
                Price::from_u64(price),
                Quantity::from_u64(qty),
                AccountId::new(self.next_id),
            );
            let mut order = Order::admit(OrderId::new(self.next_id), request, 0);
            self.next_id += 1;
            let outcome = self.book.submit(&mut order, 0).unwrap();
            assert!(self.book.check_invariants());
            (order, outcome)
        }
    }

    #[test]
    fn test_resting_order() {
        let mut h = Harness::new();
        let (order, outcome) = h.submit(Side::BUY, 50000, 1);

        assert!(outcome.fills.is_empty());
        assert_eq!(order.status, OrderStatus::Resting);
        assert_eq!(h.book.best_bid(), Some(Price::from_u64(50000)));
        assert!(h.book.contains(&order.order_id));
    }

    #[test]
    fn test_full_match_empties_book() {
        let mut h = Harness::new();
        let (sell, _) = h.submit(Side::SELL, 100, 5);
        let (buy, outcome) = h.submit(Side::BUY, 100, 5);

        assert_eq!(outcome.fills.len(), 1);
        assert_eq!(outcome.fills[0].maker_order_id, sell.order_id);
        assert_eq!(buy.status, OrderStatus::Filled);
        assert_eq!(outcome.maker_updates[0].status, OrderStatus::Filled);
        assert!(h.book.is_empty());
    }

    #[test]
    fn test_partial_taker_rests_remainder() {
        let mut h = Harness::new();
        h.submit(Side::SELL, 100, 2);
        let (buy, _) = h.submit(Side::BUY, 101, 5);

        assert_eq!(buy.status, OrderStatus::PartiallyFilled);
        let resting = h.book.order(&buy.order_id).unwrap();
        assert_eq!(resting.remaining_quantity, Quantity::from_u64(3));
        assert_eq!(resting.price, Price::from_u64(101));
        assert_eq!(h.book.best_ask(), None);
    }

    #[test]
    fn test_cancel_then_not_found() {
        let mut h = Harness::new();
        let (buy, _) = h.submit(Side::BUY, 40, 10);

        let canceled = h.book.cancel(&buy.order_id, 1).unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(canceled.remaining_quantity, Quantity::from_u64(10));
        assert!(h.book.snapshot(0).bids.is_empty());

        assert_eq!(
            h.book.cancel(&buy.order_id, 2),
            Err(EngineError::Order(OrderError::NotFound { order_id: buy.order_id }))
        );
        assert!(!h.book.is_poisoned());
    }

    #[test]
    fn test_cancel_filled_order_not_found() {
        let mut h = Harness::new();
        let (sell, _) = h.submit(Side::SELL, 100, 5);
        h.submit(Side::BUY, 100, 5);

        assert!(h.book.cancel(&sell.order_id, 1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_submit_rejects_wrong_pair_and_duplicates() {
        let mut h = Harness::new();
        let (buy, _) = h.submit(Side::BUY, 40, 10);

        let request = OrderRequest::new(
            MarketId::new("ETH/USDT"),
            Side::BUY,
            Price::from_u64(40),
            Quantity::from_u64(1),
            AccountId::new(1),
        );
        let mut foreign = Order::admit(OrderId::new(99), request, 0);
        assert!(matches!(h.book.submit(&mut foreign, 0), Err(EngineError::InvalidOperation { .. })));

        let mut duplicate = buy.clone();
        duplicate.status = OrderStatus::Resting;
        assert_eq!(
            h.book.submit(&mut duplicate, 0),
            Err(EngineError::Order(OrderError::Duplicate { order_id: buy.order_id }))
        );
    }

    #[test]
    fn test_snapshot_depth_and_spread() {
        let mut h = Harness::new();
        h.submit(Side::BUY, 98, 1);
        h.submit(Side::BUY, 99, 2);
        h.submit(Side::BUY, 99, 3);
        h.submit(Side::SELL, 101, 4);
        h.submit(Side::SELL, 102, 5);

        let snapshot = h.book.snapshot(1);
        assert_eq!(snapshot.bids.len(), 1);
        assert_eq!(snapshot.bids[0].quantity, Quantity::from_u64(5));
        assert_eq!(snapshot.bids[0].order_count, 2);
        assert_eq!(snapshot.asks[0].price, Price::from_u64(101));
        assert_eq!(snapshot.last_sequence, Some(5));

        assert_eq!(h.book.spread(), Some(rust_decimal::Decimal::from(2)));
        assert_eq!(h.book.depth_quantity(Side::BUY), Quantity::from_u64(6));
        assert_eq!(h.book.snapshot(1), h.book.snapshot(1));
    }

    #[test]
    fn test_panicking_submit_poisons_book() {
        let mut h = Harness::new();
        let (resting, _) = h.submit(Side::BUY, 100, 5);

        // Plant an ask below the bid behind the book's back so the next
        // submission trips the no-crossing assertion.
        let request = OrderRequest::new(
            MarketId::new("BTC/USDT"),
            Side::SELL,
            Price::from_u64(90),
            Quantity::from_u64(1),
            AccountId::new(50),
        );
        h.book.asks.push(Order::admit(OrderId::new(50), request, 0)).unwrap();
        h.book.index.insert(OrderId::new(50), Side::SELL);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            h.submit(Side::BUY, 80, 1);
        }));
        assert!(result.is_err());
        assert!(h.book.is_poisoned());

        let poisoned = EngineError::BookPoisoned { pair: MarketId::new("BTC/USDT") };
        assert_eq!(h.book.cancel(&resting.order_id, 1), Err(poisoned.clone()));
        assert_eq!(h.book.ensure_usable(), Err(poisoned.clone()));

        let request = OrderRequest::new(
            MarketId::new("BTC/USDT"),
            Side::SELL,
            Price::from_u64(200),
            Quantity::from_u64(1),
            AccountId::new(60),
        );
        let mut late = Order::admit(OrderId::new(60), request, 0);
        assert_eq!(h.book.submit(&mut late, 0), Err(poisoned));
    }

    #[test]
    fn test_completed_operations_leave_book_usable() {
        let mut h = Harness::new();
        let (buy, _) = h.submit(Side::BUY, 100, 5);
        h.submit(Side::SELL, 100, 2);
        h.book.cancel(&buy.order_id, 1).unwrap();

        assert!(!h.book.is_poisoned());
        assert!(h.book.ensure_usable().is_ok());
    }
}
