//! Fan-out of one changed order into every storage location holding a copy.
//!
//! Each location is written independently. A failure in one is logged and recorded
//! in the [`SyncReport`], and the remaining locations are still attempted.

use std::fmt;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::history::{CappedHistory, Upsert, CUSTOMER_HISTORY_CAPACITY, GLOBAL_HISTORY_CAPACITY};
use super::{OrderKey, OrderStore};
use crate::domain::{display_date, Order, OrderId, StoreIdentity};
use crate::error::StorageError;
use crate::storage::{keys, read_json, write_json, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CopyLocation {
    Canonical,
    UserSubmitted,
    UserCollection(String),
    CustomerHistory(String),
    GlobalHistory,
}

impl fmt::Display for CopyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyLocation::Canonical => f.write_str(keys::ORDERS),
            CopyLocation::UserSubmitted => f.write_str(keys::USER_ORDERS),
            CopyLocation::UserCollection(key) | CopyLocation::CustomerHistory(key) => {
                f.write_str(key)
            }
            CopyLocation::GlobalHistory => f.write_str(keys::GLOBAL_HISTORY),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated,
    Inserted,
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    pub location: CopyLocation,
    pub outcome: SyncOutcome,
}

/// What one propagation did at each location it visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub order_id: OrderId,
    pub entries: Vec<SyncEntry>,
}

impl SyncReport {
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, location: CopyLocation, outcome: SyncOutcome) {
        match &outcome {
            SyncOutcome::Failed(reason) => {
                warn!(order_id = %self.order_id, location = %location, reason = %reason, "Copy not synced")
            }
            _ => debug!(order_id = %self.order_id, location = %location, outcome = ?outcome, "Copy visited"),
        }
        self.entries.push(SyncEntry { location, outcome });
    }

    pub fn outcome(&self, location: &CopyLocation) -> Option<&SyncOutcome> {
        self.entries
            .iter()
            .find(|entry| &entry.location == location)
            .map(|entry| &entry.outcome)
    }

    /// Locations that now hold the new record.
    pub fn written(&self) -> impl Iterator<Item = &CopyLocation> {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.outcome, SyncOutcome::Updated | SyncOutcome::Inserted))
            .map(|entry| &entry.location)
    }

    pub fn not_found(&self) -> impl Iterator<Item = &CopyLocation> {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == SyncOutcome::NotFound)
            .map(|entry| &entry.location)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&CopyLocation, &str)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            SyncOutcome::Failed(reason) => Some((&entry.location, reason.as_str())),
            _ => None,
        })
    }

    /// True when no location failed; copies may still have been absent.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// An order counts as synced when the customer-submitted collection holds a copy
/// with the same status.
pub fn is_synced(order: &Order, submitted: &[Order]) -> bool {
    OrderKey::of(order)
        .locate(submitted)
        .is_some_and(|index| submitted[index].status == order.status)
}

pub struct FanOutSynchronizer<'a> {
    storage: &'a dyn KeyValueStore,
    identity: &'a StoreIdentity,
    now_millis: i64,
}

impl<'a> FanOutSynchronizer<'a> {
    pub fn new(storage: &'a dyn KeyValueStore, identity: &'a StoreIdentity, now_millis: i64) -> Self {
        Self {
            storage,
            identity,
            now_millis,
        }
    }

    /// Writes `order` into the canonical set, the user-submitted collection, every
    /// per-user collection, the customer history and the global history.
    #[instrument(skip(self, canonical, order), fields(order_id = %order.id, status = %order.status))]
    pub fn propagate(&self, canonical: &mut OrderStore, order: &Order) -> SyncReport {
        let mut report = SyncReport::new(order.id);

        report.record(CopyLocation::Canonical, self.write_canonical(canonical, order));
        report.record(
            CopyLocation::UserSubmitted,
            self.patch_submitted(keys::USER_ORDERS, order),
        );

        match self.storage.keys() {
            Ok(all) => {
                for key in all.into_iter().filter(|key| keys::is_user_collection(key)) {
                    if let Some(outcome) = self.patch_user_collection(&key, order) {
                        report.record(CopyLocation::UserCollection(key), outcome);
                    }
                }
            }
            Err(e) => report.record(
                CopyLocation::UserCollection(format!("{}*", keys::USER_COLLECTION_PREFIX)),
                failed(e),
            ),
        }

        self.record_histories(&mut report, order);
        report
    }

    /// Only the two history logs; used to repair orders whose history drifted.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub fn sync_history(&self, order: &Order) -> SyncReport {
        let mut report = SyncReport::new(order.id);
        self.record_histories(&mut report, order);
        report
    }

    fn write_canonical(&self, canonical: &mut OrderStore, order: &Order) -> SyncOutcome {
        let existed = canonical.get(order.id).is_some();
        canonical.put(order.clone());
        match write_json(self.storage, keys::ORDERS, canonical.list()) {
            Ok(()) if existed => SyncOutcome::Updated,
            Ok(()) => SyncOutcome::Inserted,
            Err(e) => failed(e),
        }
    }

    fn patch_submitted(&self, key: &str, order: &Order) -> SyncOutcome {
        match read_json::<Vec<Order>>(self.storage, key) {
            Ok(Some(records)) => self.patch_records(key, records, order, false),
            Ok(None) => SyncOutcome::NotFound,
            Err(e) => failed(e),
        }
    }

    /// `None` when the key holds something other than an order list.
    fn patch_user_collection(&self, key: &str, order: &Order) -> Option<SyncOutcome> {
        let raw = match read_json::<Value>(self.storage, key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => return Some(failed(e)),
        };
        if !raw.is_array() {
            return None;
        }
        let outcome = match serde_json::from_value::<Vec<Order>>(raw) {
            Ok(records) => self.patch_records(key, records, order, true),
            Err(e) => SyncOutcome::Failed(e.to_string()),
        };
        Some(outcome)
    }

    fn patch_records(
        &self,
        key: &str,
        mut records: Vec<Order>,
        order: &Order,
        match_phone: bool,
    ) -> SyncOutcome {
        let order_key = OrderKey::of(order);
        let found = if match_phone {
            order_key.locate_with_phone(&records)
        } else {
            order_key.locate(&records)
        };
        let Some(index) = found else {
            return SyncOutcome::NotFound;
        };

        let record = &mut records[index];
        record.status = order.status;
        record.updated_at = order.updated_at.or(Some(self.now_millis));
        if order.updated_by.is_some() {
            record.updated_by = order.updated_by.clone();
        }

        match write_json(self.storage, key, &records) {
            Ok(()) => SyncOutcome::Updated,
            Err(e) => failed(e),
        }
    }

    fn record_histories(&self, report: &mut SyncReport, order: &Order) {
        let snapshot = self.history_snapshot(order);
        let customer_key = keys::customer_history(order);
        let outcome = self.upsert_history(&customer_key, CUSTOMER_HISTORY_CAPACITY, snapshot.clone());
        report.record(CopyLocation::CustomerHistory(customer_key), outcome);
        let outcome = self.upsert_history(keys::GLOBAL_HISTORY, GLOBAL_HISTORY_CAPACITY, snapshot);
        report.record(CopyLocation::GlobalHistory, outcome);
    }

    /// The record as customers see it, stamped with the current store identity.
    fn history_snapshot(&self, order: &Order) -> Order {
        let mut entry = order.clone();
        if entry.date.is_none() {
            entry.date = Some(display_date(order.created_millis()));
        }
        entry.updated_at = entry.updated_at.or(Some(self.now_millis));
        entry.market = Some(self.identity.name.clone());
        entry.market_address = Some(self.identity.address.clone());
        entry.market_phone = Some(self.identity.phone.clone());
        entry
    }

    fn upsert_history(&self, key: &str, capacity: usize, entry: Order) -> SyncOutcome {
        let existing = match read_json::<Vec<Order>>(self.storage, key) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => return failed(e),
        };
        let mut history = CappedHistory::from_entries(capacity, existing);
        let outcome = match history.upsert(entry) {
            Upsert::Replaced => SyncOutcome::Updated,
            Upsert::Inserted => SyncOutcome::Inserted,
        };
        match write_json(self.storage, key, history.entries()) {
            Ok(()) => outcome,
            Err(e) => failed(e),
        }
    }
}

fn failed(err: StorageError) -> SyncOutcome {
    SyncOutcome::Failed(err.to_string())
}
