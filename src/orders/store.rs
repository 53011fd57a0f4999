use tracing::debug;

use super::OrderKey;
use crate::domain::{Order, OrderId};

/// Counts from one [`OrderStore::merge`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Submitted orders that were new to the canonical set.
    pub inserted: usize,
    /// Submitted orders that were given a synthetic id or order number.
    pub stamped: usize,
}

/// The canonical order set, kept newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderStore {
    orders: Vec<Order>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_orders(orders: Vec<Order>) -> Self {
        let mut store = Self { orders };
        store.sort_by_recency();
        store
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    /// Replaces the order with the same id in place, or inserts it.
    pub fn put(&mut self, order: Order) {
        match self.orders.iter_mut().find(|existing| existing.id == order.id) {
            Some(existing) => *existing = order,
            None => {
                self.orders.push(order);
                self.sort_by_recency();
            }
        }
    }

    pub fn list(&self) -> &[Order] {
        &self.orders
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Order> {
        self.orders.iter_mut()
    }

    /// Keeps the orders for which `keep` returns true; returns how many were dropped.
    pub fn retain(&mut self, keep: impl FnMut(&Order) -> bool) -> usize {
        let before = self.orders.len();
        self.orders.retain(keep);
        before - self.orders.len()
    }

    /// Orders created strictly after `watermark` (milliseconds).
    pub fn created_after(&self, watermark: i64) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| order.created_millis() > watermark)
            .cloned()
            .collect()
    }

    /// Folds customer-submitted orders into the canonical set.
    ///
    /// Records lacking an id get one derived from their `timestamp`, or a fresh
    /// time-based one; records lacking a number get `USER` plus the id's last six
    /// digits. The stamps are written into `submitted` so the caller can persist
    /// them. Anything already present (by [`OrderKey`]) is left untouched, so
    /// merging the same collection again inserts nothing.
    pub fn merge(&mut self, submitted: &mut [Order], now_millis: i64) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        let mut next_synthetic = self.synthetic_floor(submitted, now_millis);

        for index in 0..submitted.len() {
            let (earlier, rest) = submitted.split_at_mut(index);
            let candidate = &mut rest[0];
            let mut stamped = false;
            if !candidate.id.is_assigned() {
                candidate.id = match candidate.timestamp.and_then(|ts| u64::try_from(ts).ok()) {
                    Some(ts) if ts > 0 && !self.id_claimed(OrderId(ts), candidate, earlier) => {
                        OrderId(ts)
                    }
                    _ => {
                        let id = OrderId(next_synthetic);
                        next_synthetic += 1;
                        id
                    }
                };
                stamped = true;
            }
            if candidate.order_number.is_none() {
                candidate.order_number = Some(format!("USER{}", candidate.id.short()));
                stamped = true;
            }
            if stamped {
                outcome.stamped += 1;
            }

            if OrderKey::of(candidate).locate(&self.orders).is_none() {
                debug!(order_id = %candidate.id, "Merging submitted order");
                self.orders.push(candidate.clone());
                outcome.inserted += 1;
            }
        }

        self.sort_by_recency();
        outcome
    }

    /// True when `id` already belongs to a different order, either in the
    /// canonical set or earlier in the batch being merged.
    fn id_claimed(&self, id: OrderId, candidate: &Order, earlier: &[Order]) -> bool {
        self.orders
            .iter()
            .chain(earlier.iter())
            .any(|other| {
                other.id == id
                    && (candidate.order_number.is_none()
                        || other.order_number != candidate.order_number)
            })
    }

    fn synthetic_floor(&self, submitted: &[Order], now_millis: i64) -> u64 {
        let highest = self
            .orders
            .iter()
            .chain(submitted.iter())
            .map(|order| {
                let ts = order.timestamp.and_then(|ts| u64::try_from(ts).ok());
                order.id.0.max(ts.unwrap_or(0))
            })
            .max()
            .unwrap_or(0);
        u64::try_from(now_millis).unwrap_or(0).max(highest + 1)
    }

    fn sort_by_recency(&mut self) {
        self.orders
            .sort_by_key(|order| std::cmp::Reverse(order.created_millis()));
    }
}
