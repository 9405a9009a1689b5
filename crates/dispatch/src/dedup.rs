//! Bounded window of recently seen message keys.
//!
//! Chat transports redeliver messages on retry; a key seen twice within the
//! window is dropped before any parsing or store mutation happens.

use std::collections::{HashSet, VecDeque};

/// Fixed-capacity recently-seen set with oldest-first eviction.
pub struct DedupWindow {
    capacity: usize,
    order: VecDeque<i64>,
    seen: HashSet<i64>,
}

impl DedupWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Records a key. Returns false when the key is already in the window —
    /// the caller drops the message. Evicts the oldest key once full.
    pub fn insert(&mut self, key: i64) -> bool {
        if !self.seen.insert(key) {
            return false;
        }
        self.order.push_back(key);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }

    #[must_use]
    pub fn contains(&self, key: i64) -> bool {
        self.seen.contains(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
