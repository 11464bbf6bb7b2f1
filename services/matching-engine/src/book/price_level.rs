//! Price level queue: one side of one pair's book
//!
//! Resting orders are kept in an indexed binary heap: the heap array holds the
//! orders, and a position map from `OrderId` to array slot is updated on every
//! swap. This gives O(log n) push, pop, and removal of an arbitrary order, so
//! cancellation never scans the side or leaves tombstones behind.
//!
//! Priority is price-time: a strictly better price wins (higher for bids,
//! lower for asks), then the smaller admission sequence. Sequences are unique,
//! so no two distinct orders ever compare equal.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use types::errors::OrderError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use super::snapshot::DepthLevel;

/// Resting orders for one side of a book
#[derive(Debug, Clone)]
pub struct PriceLevelQueue {
    side: Side,
    heap: Vec<Order>,
    positions: HashMap<OrderId, usize>,
}

impl PriceLevelQueue {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            heap: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Whether `a` matches before `b` on this side
    fn has_priority(&self, a: &Order, b: &Order) -> bool {
        match a.price.cmp(&b.price) {
            Ordering::Equal => a.order_id < b.order_id,
            Ordering::Greater => self.side == Side::BUY,
            Ordering::Less => self.side == Side::SELL,
        }
    }

    /// The order that would match next
    pub fn peek_best(&self) -> Option<&Order> {
        self.heap.first()
    }

    /// Insert a resting order
    ///
    /// Fails only if an order with the same id is already queued.
    pub fn push(&mut self, order: Order) -> Result<(), OrderError> {
        if self.positions.contains_key(&order.order_id) {
            return Err(OrderError::Duplicate { order_id: order.order_id });
        }

        let slot = self.heap.len();
        self.positions.insert(order.order_id, slot);
        self.heap.push(order);
        self.sift_up(slot);
        Ok(())
    }

    /// Remove and return the best order
    pub fn pop_best(&mut self) -> Option<Order> {
        if self.heap.is_empty() {
            return None;
        }
        self.take(0)
    }

    /// Remove a specific order regardless of its position
    ///
    /// Relative priority of the remaining orders is unaffected.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let slot = *self.positions.get(order_id)?;
        self.take(slot)
    }

    /// Apply a fill to the best order in place
    ///
    /// Price and sequence are untouched, so the order keeps its slot at the
    /// front. The caller pops it once it reports filled.
    pub(crate) fn fill_best(&mut self, quantity: Quantity, timestamp: i64) -> Option<&Order> {
        let best = self.heap.first_mut()?;
        best.add_fill(quantity, timestamp);
        Some(&*best)
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.positions.get(order_id).map(|&slot| &self.heap[slot])
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.positions.contains_key(order_id)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Resting orders in heap order (not priority order)
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.heap.iter()
    }

    /// Aggregate resting quantity per price, most-priority-first
    ///
    /// `depth == 0` means every level.
    pub fn levels(&self, depth: usize) -> Vec<DepthLevel> {
        let mut by_price: BTreeMap<Price, (Quantity, u32)> = BTreeMap::new();
        for order in &self.heap {
            let entry = by_price.entry(order.price).or_insert((Quantity::zero(), 0));
            entry.0 = entry.0 + order.remaining_quantity;
            entry.1 += 1;
        }

        let limit = if depth == 0 { usize::MAX } else { depth };
        let to_level = |(price, (quantity, order_count)): (Price, (Quantity, u32))| DepthLevel {
            price,
            quantity,
            order_count,
        };

        match self.side {
            Side::BUY => by_price.into_iter().rev().take(limit).map(to_level).collect(),
            Side::SELL => by_price.into_iter().take(limit).map(to_level).collect(),
        }
    }

    /// Verify the heap property and the position map
    pub fn is_consistent(&self) -> bool {
        if self.positions.len() != self.heap.len() {
            return false;
        }
        self.heap.iter().enumerate().all(|(slot, order)| {
            let indexed = self.positions.get(&order.order_id) == Some(&slot);
            let ordered = slot == 0 || !self.has_priority(order, &self.heap[(slot - 1) / 2]);
            indexed && ordered
        })
    }

    fn take(&mut self, slot: usize) -> Option<Order> {
        let last = self.heap.len().checked_sub(1)?;
        if slot != last {
            self.swap(slot, last);
        }
        let order = self.heap.pop()?;
        self.positions.remove(&order.order_id);

        if slot < self.heap.len() {
            let slot = self.sift_up(slot);
            self.sift_down(slot);
        }
        Some(order)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.positions.insert(self.heap[i].order_id, i);
        self.positions.insert(self.heap[j].order_id, j);
    }

    /// Returns the final slot of the moved order
    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.has_priority(&self.heap[slot], &self.heap[parent]) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut best = slot;

            if left < len && self.has_priority(&self.heap[left], &self.heap[best]) {
                best = left;
            }
            if right < len && self.has_priority(&self.heap[right], &self.heap[best]) {
                best = right;
            }
            if best == slot {
                break;
            }
            self.swap(slot, best);
            slot = best;
        }
    }
}
