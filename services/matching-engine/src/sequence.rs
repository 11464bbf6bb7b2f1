//! Lock-free sequence generation
//!
//! Order ids and fill sequences come from atomic counters shared by every
//! book, so they are globally unique. Order ids are drawn while the pair's
//! exclusive section is held, which makes them follow that pair's
//! lock-acquisition order as well.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct SequenceGenerator {
    current: AtomicU64,
}

impl SequenceGenerator {
    pub fn new(start: u64) -> Self {
        Self {
            current: AtomicU64::new(start),
        }
    }

    pub fn next(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst)
    }

    /// The value the next call to `next` will return
    pub fn peek(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}
