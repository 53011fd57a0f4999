use super::OrderKey;
use crate::domain::Order;

pub const CUSTOMER_HISTORY_CAPACITY: usize = 50;
pub const GLOBAL_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Replaced,
    Inserted,
}

/// Most-recent-first order log with a fixed capacity; overflow evicts the oldest.
#[derive(Debug, Clone, PartialEq)]
pub struct CappedHistory {
    capacity: usize,
    entries: Vec<Order>,
}

impl CappedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    /// Wraps an already ordered log, dropping whatever exceeds `capacity`.
    pub fn from_entries(capacity: usize, mut entries: Vec<Order>) -> Self {
        entries.truncate(capacity);
        Self { capacity, entries }
    }

    /// Moves `entry` to the front, replacing any earlier copy of the same order.
    pub fn upsert(&mut self, entry: Order) -> Upsert {
        let outcome = match OrderKey::of(&entry).locate(&self.entries) {
            Some(index) => {
                self.entries.remove(index);
                Upsert::Replaced
            }
            None => Upsert::Inserted,
        };
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
        outcome
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Order] {
        &self.entries
    }
}
