use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::domain::{Notification, NotificationKind, Order};
use crate::error::StorageError;
use crate::storage::{keys, read_json, write_json, KeyValueStore};

/// Oldest entries are evicted beyond this many notifications.
pub const NOTIFICATION_CAPACITY: usize = 200;

/// Message text for a notification about `order`.
pub fn message_for(kind: NotificationKind, order: &Order) -> String {
    let number = order.display_number();
    match kind {
        NotificationKind::NewOrder => format!(
            "New order {number} from {}",
            order.customer_name.as_deref().unwrap_or("Customer")
        ),
        NotificationKind::StatusChanged => {
            format!("Order {number} status changed to {}", order.status)
        }
        NotificationKind::OrderSynced => format!("Order {number} synced with user history"),
        NotificationKind::Other => format!("Order {number} updated"),
    }
}

/// Newest-first admin notification feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFeed {
    entries: Vec<Notification>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(storage: &dyn KeyValueStore) -> Result<Self, StorageError> {
        let mut entries: Vec<Notification> =
            read_json(storage, keys::NOTIFICATIONS)?.unwrap_or_default();
        entries.truncate(NOTIFICATION_CAPACITY);
        Ok(Self { entries })
    }

    pub fn persist(&self, storage: &dyn KeyValueStore) -> Result<(), StorageError> {
        write_json(storage, keys::NOTIFICATIONS, &self.entries)
    }

    /// Puts a fresh unread notification at the front and returns the unread count.
    #[instrument(skip(self, order), fields(order_id = %order.id, kind = %kind))]
    pub fn emit(&mut self, kind: NotificationKind, order: &Order, now: DateTime<Utc>) -> usize {
        let id = self.next_id(now);
        let notification = Notification {
            id,
            kind,
            order_id: order.id,
            order_number: order.display_number(),
            message: message_for(kind, order),
            time: now,
            read: false,
        };
        debug!(notification_id = id, message = %notification.message, "Notification emitted");
        self.entries.insert(0, notification);
        self.entries.truncate(NOTIFICATION_CAPACITY);
        self.unread_count()
    }

    pub fn on_new_orders(&mut self, orders: &[Order], now: DateTime<Utc>) -> usize {
        for order in orders {
            self.emit(NotificationKind::NewOrder, order, now);
        }
        self.unread_count()
    }

    pub fn on_status_changed(&mut self, order: &Order, now: DateTime<Utc>) -> usize {
        self.emit(NotificationKind::StatusChanged, order, now)
    }

    pub fn on_synced(&mut self, order: &Order, now: DateTime<Utc>) -> usize {
        self.emit(NotificationKind::OrderSynced, order, now)
    }

    /// Returns false when no notification has this id. Already-read entries stay read.
    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Returns how many were unread before.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for notification in self.entries.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn list(&self) -> &[Notification] {
        &self.entries
    }

    // Millisecond ids, bumped past the newest so a burst never collides.
    fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let newest = self.entries.iter().map(|n| n.id).max().unwrap_or(0);
        millis.max(newest + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, OrderStatus};
    use crate::storage::MemoryStore;
    use rust_decimal::Decimal;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn order(id: u64, number: &str) -> Order {
        Order::new(OrderId(id), number, OrderStatus::Pending, Decimal::from(100))
    }

    #[test]
    fn templates_match_the_dashboard() {
        let named = order(1, "A1").with_customer("Asha", "1");
        assert_eq!(message_for(NotificationKind::NewOrder, &named), "New order A1 from Asha");
        assert_eq!(
            message_for(NotificationKind::NewOrder, &order(2, "A2")),
            "New order A2 from Customer"
        );
        let mut moving = order(3, "A3");
        moving.status = OrderStatus::OutForDelivery;
        assert_eq!(
            message_for(NotificationKind::StatusChanged, &moving),
            "Order A3 status changed to Out for Delivery"
        );
        assert_eq!(
            message_for(NotificationKind::OrderSynced, &moving),
            "Order A3 synced with user history"
        );
    }

    #[test]
    fn status_change_then_sync_are_newest_first() {
        let mut feed = NotificationFeed::new();
        let o = order(1001, "A1001");
        assert_eq!(feed.on_status_changed(&o, at(5_000)), 1);
        assert_eq!(feed.on_synced(&o, at(5_000)), 2);

        let kinds: Vec<NotificationKind> = feed.list().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::OrderSynced, NotificationKind::StatusChanged]);
        assert!(feed.list()[0].id > feed.list()[1].id);
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut feed = NotificationFeed::new();
        feed.on_new_orders(&[order(1, "A1"), order(2, "A2")], at(10));
        let id = feed.list()[0].id;

        assert!(feed.mark_read(id));
        assert_eq!(feed.unread_count(), 1);
        assert!(feed.mark_read(id));
        assert_eq!(feed.unread_count(), 1);
        assert!(!feed.mark_read(424242));
        assert_eq!(feed.mark_all_read(), 1);
        assert_eq!(feed.unread_count(), 0);
    }

    #[test]
    fn feed_is_capped_and_round_trips_storage() {
        let storage = MemoryStore::new();
        let mut feed = NotificationFeed::new();
        for id in 1..=(NOTIFICATION_CAPACITY as u64 + 5) {
            feed.emit(NotificationKind::Other, &order(id, &format!("N{id}")), at(1));
        }
        assert_eq!(feed.list().len(), NOTIFICATION_CAPACITY);
        assert_eq!(feed.list()[0].order_number, format!("N{}", NOTIFICATION_CAPACITY + 5));

        feed.persist(&storage).unwrap();
        assert_eq!(NotificationFeed::load(&storage).unwrap(), feed);
    }
}
