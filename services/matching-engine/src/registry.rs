//! Book registry: pair → order book, created lazily
//!
//! This is the one place concurrency is enforced. Each book lives behind its
//! own mutex; holding a `BookHandle` guard is the pair's exclusive section.
//! Operations on one pair are serialized in lock-acquisition order, while
//! different pairs never contend. No I/O happens while a guard is held.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::info;
use types::ids::{MarketId, OrderId};

use crate::book::OrderBook;
use crate::config::{ConfigError, EngineConfig, SelfTradePolicy};
use crate::sequence::SequenceGenerator;

/// Shared access to one pair's book
#[derive(Debug, Clone)]
pub struct BookHandle {
    pair: MarketId,
    book: Arc<Mutex<OrderBook>>,
}

impl BookHandle {
    fn new(book: OrderBook) -> Self {
        Self {
            pair: book.pair().clone(),
            book: Arc::new(Mutex::new(book)),
        }
    }

    pub fn pair(&self) -> &MarketId {
        &self.pair
    }

    /// Enter the pair's exclusive section
    ///
    /// Blocks until every earlier holder has released it. `parking_lot`
    /// mutexes do not poison, so a holder that panicked leaves the lock free;
    /// the book itself records the interrupted mutation and refuses further
    /// operations (see `OrderBook::ensure_usable`).
    pub fn lock(&self) -> MutexGuard<'_, OrderBook> {
        self.book.lock()
    }
}

/// Lazily populated map of per-pair books
///
/// Also owns the sequence generators every book draws from, and a directory
/// from resting order id to pair so cancellations that only carry an id can
/// be routed. The directory is a routing hint; the book stays authoritative.
#[derive(Debug)]
pub struct BookRegistry {
    books: DashMap<MarketId, BookHandle>,
    directory: DashMap<OrderId, MarketId>,
    order_sequence: SequenceGenerator,
    fill_sequence: Arc<SequenceGenerator>,
    self_trade_policy: SelfTradePolicy,
}

impl BookRegistry {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &EngineConfig) -> Self {
        Self {
            books: DashMap::new(),
            directory: DashMap::new(),
            order_sequence: SequenceGenerator::new(config.first_order_sequence),
            fill_sequence: Arc::new(SequenceGenerator::new(config.first_fill_sequence)),
            self_trade_policy: config.self_trade_policy,
        }
    }

    /// The book for `pair`, creating it on first use
    pub fn for_pair(&self, pair: &MarketId) -> BookHandle {
        if let Some(handle) = self.books.get(pair) {
            return handle.clone();
        }

        self.books
            .entry(pair.clone())
            .or_insert_with(|| {
                info!(pair = %pair, "Creating order book");
                BookHandle::new(OrderBook::new(
                    pair.clone(),
                    Arc::clone(&self.fill_sequence),
                    self.self_trade_policy,
                ))
            })
            .clone()
    }

    /// The book for `pair` if one exists
    pub fn get(&self, pair: &MarketId) -> Option<BookHandle> {
        self.books.get(pair).map(|handle| handle.clone())
    }

    /// Pairs that have a book, sorted
    pub fn pairs(&self) -> Vec<MarketId> {
        let mut pairs: Vec<MarketId> = self.books.iter().map(|entry| entry.key().clone()).collect();
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Pair a resting order was last seen in
    pub fn route(&self, order_id: &OrderId) -> Option<MarketId> {
        self.directory.get(order_id).map(|pair| pair.clone())
    }

    /// Draw the next order id. Call only while holding the pair's section.
    pub(crate) fn next_order_id(&self) -> OrderId {
        OrderId::new(self.order_sequence.next())
    }

    pub(crate) fn record_resting(&self, order_id: OrderId, pair: &MarketId) {
        self.directory.insert(order_id, pair.clone());
    }

    pub(crate) fn forget(&self, order_id: &OrderId) {
        self.directory.remove(order_id);
    }
}

impl Default for BookRegistry {
    fn default() -> Self {
        Self::build(&EngineConfig::default())
    }
}
