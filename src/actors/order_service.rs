use std::sync::Arc;

use chrono::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument, warn};

use crate::clients::OrderClient;
use crate::clock::Clock;
use crate::domain::{Order, OrderId, OrderStatus, StoreIdentity};
use crate::error::OrderError;
use crate::messages::{
    Alert, AlertLevel, BulkUpdate, LoadSummary, OrderRequest, ServiceResponse, StatusUpdate,
};
use crate::orders::{
    apply_action, is_synced, transition, CopyLocation, FanOutSynchronizer, NotificationFeed,
    OrderAction, OrderKey, OrderStore, SyncOutcome, SyncReport,
};
use crate::reports::{export_csv, render_invoice, OrderFilter, OrderStats};
use crate::storage::{keys, read_json, write_json, KeyValueStore};

/// Buffered alerts per subscriber before the slowest one starts lagging.
pub const ALERT_CAPACITY: usize = 64;

const LOAD_ERROR_ALERT: &str = "Error loading orders. Please refresh the page.";

/// Order lifecycle actor. Holds the canonical order set, the notification feed and
/// the store identity; every storage write goes through it.
pub struct OrderService {
    receiver: mpsc::Receiver<OrderRequest>,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    alerts: broadcast::Sender<Alert>,
    orders: OrderStore,
    notifications: NotificationFeed,
    identity: StoreIdentity,
}

impl OrderService {
    pub fn new(
        buffer_size: usize,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> (Self, OrderClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (alerts, _) = broadcast::channel(ALERT_CAPACITY);
        let client = OrderClient::new(sender, alerts.clone());
        let service = Self {
            receiver,
            storage,
            clock,
            alerts,
            orders: OrderStore::new(),
            notifications: NotificationFeed::new(),
            identity: StoreIdentity::default(),
        };
        (service, client)
    }

    #[instrument(name = "order_service", skip(self))]
    pub async fn run(mut self) {
        info!("OrderService starting");
        self.restore();

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                OrderRequest::LoadOrders { respond_to } => {
                    self.handle_load_orders(respond_to);
                }
                OrderRequest::GetOrder { id, respond_to } => {
                    self.handle_get_order(id, respond_to);
                }
                OrderRequest::ListOrders { filter, respond_to } => {
                    self.handle_list_orders(filter, respond_to);
                }
                OrderRequest::UpdateStatus {
                    id,
                    status,
                    updated_by,
                    respond_to,
                } => {
                    self.handle_update_status(id, status, updated_by, respond_to);
                }
                OrderRequest::ApplyAction {
                    id,
                    action,
                    updated_by,
                    respond_to,
                } => {
                    self.handle_apply_action(id, action, updated_by, respond_to);
                }
                OrderRequest::UpdateMany {
                    ids,
                    status,
                    updated_by,
                    respond_to,
                } => {
                    self.handle_update_many(ids, status, updated_by, respond_to);
                }
                OrderRequest::SyncAll { respond_to } => {
                    self.handle_sync_all(respond_to);
                }
                OrderRequest::Stats { respond_to } => {
                    self.handle_stats(respond_to);
                }
                OrderRequest::ExportCsv { respond_to } => {
                    self.handle_export_csv(respond_to);
                }
                OrderRequest::Invoice { id, respond_to } => {
                    self.handle_invoice(id, respond_to);
                }
                OrderRequest::ClearOlderThan { days, respond_to } => {
                    self.handle_clear_older_than(days, respond_to);
                }
                OrderRequest::ListNotifications { respond_to } => {
                    let _ = respond_to.send(Ok(self.notifications.list().to_vec()));
                }
                OrderRequest::MarkNotificationRead { id, respond_to } => {
                    self.handle_mark_notification_read(id, respond_to);
                }
                OrderRequest::MarkAllNotificationsRead { respond_to } => {
                    self.handle_mark_all_notifications_read(respond_to);
                }
                OrderRequest::GetStoreIdentity { respond_to } => {
                    let _ = respond_to.send(Ok(self.identity.clone()));
                }
                OrderRequest::SetStoreIdentity {
                    identity,
                    respond_to,
                } => {
                    self.handle_set_store_identity(identity, respond_to);
                }
                OrderRequest::GetRefreshInterval { respond_to } => {
                    let result = read_json(self.storage.as_ref(), keys::REFRESH_INTERVAL)
                        .map_err(OrderError::from);
                    let _ = respond_to.send(result);
                }
                OrderRequest::SetRefreshInterval { millis, respond_to } => {
                    self.handle_set_refresh_interval(millis, respond_to);
                }
                OrderRequest::Shutdown => {
                    info!("OrderService shutting down");
                    break;
                }
                #[cfg(test)]
                OrderRequest::GetOrderCount { respond_to } => {
                    let _ = respond_to.send(Ok(self.orders.len()));
                }
            }
        }

        info!("OrderService stopped");
    }

    /// Picks up whatever an earlier session persisted. Nothing here is fatal.
    fn restore(&mut self) {
        let storage = self.storage.as_ref();
        match read_json::<StoreIdentity>(storage, keys::STORE_IDENTITY) {
            Ok(Some(identity)) => self.identity = identity,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Store identity unreadable, using default"),
        }
        match NotificationFeed::load(storage) {
            Ok(feed) => self.notifications = feed,
            Err(e) => warn!(error = %e, "Notifications unreadable, starting empty"),
        }
        match read_json::<Vec<Order>>(storage, keys::ORDERS) {
            Ok(orders) => self.orders = OrderStore::from_orders(orders.unwrap_or_default()),
            Err(e) => {
                error!(error = %e, "Canonical orders unreadable");
                self.alert(AlertLevel::Error, LOAD_ERROR_ALERT);
            }
        }
        info!(
            orders = self.orders.len(),
            unread = self.notifications.unread_count(),
            store = %self.identity.name,
            "State restored"
        );
    }

    fn alert(&self, level: AlertLevel, message: impl Into<String>) {
        // No subscribers is fine.
        let _ = self.alerts.send(Alert::new(level, message));
    }

    fn persist_notifications(&self) {
        if let Err(e) = self.notifications.persist(self.storage.as_ref()) {
            warn!(error = %e, "Notifications not persisted");
        }
    }

    /// Merge, persist, then look for orders newer than the watermark. Any storage
    /// failure leaves an empty order set behind.
    #[instrument(skip(self, respond_to))]
    fn handle_load_orders(&mut self, respond_to: ServiceResponse<LoadSummary, OrderError>) {
        debug!("Processing load_orders request");

        let result = self.load_orders();
        if let Err(e) = &result {
            error!(error = %e, "Loading orders failed");
            self.orders = OrderStore::new();
            self.alert(AlertLevel::Error, LOAD_ERROR_ALERT);
        }

        let _ = respond_to.send(result);
    }

    fn load_orders(&mut self) -> Result<LoadSummary, OrderError> {
        let storage = self.storage.as_ref();
        let admin: Vec<Order> = read_json(storage, keys::ORDERS)?.unwrap_or_default();
        let mut submitted: Vec<Order> =
            read_json(storage, keys::USER_ORDERS)?.unwrap_or_default();

        let mut store = OrderStore::from_orders(admin);
        let outcome = store.merge(&mut submitted, self.clock.now_millis());
        if outcome.stamped > 0 {
            write_json(storage, keys::USER_ORDERS, &submitted)?;
        }
        write_json(storage, keys::ORDERS, store.list())?;
        self.orders = store;
        info!(
            total = self.orders.len(),
            merged = outcome.inserted,
            stamped = outcome.stamped,
            "Orders loaded"
        );

        let new_orders = self.detect_new_orders()?;
        Ok(LoadSummary {
            total: self.orders.len(),
            merged: outcome.inserted,
            new_orders,
            unread: self.notifications.unread_count(),
        })
    }

    fn detect_new_orders(&mut self) -> Result<Vec<OrderId>, OrderError> {
        let storage = self.storage.as_ref();
        let watermark: i64 = read_json(storage, keys::LAST_ORDER_CHECK)?.unwrap_or(0);
        let fresh = self.orders.created_after(watermark);
        if fresh.is_empty() {
            return Ok(Vec::new());
        }

        let latest = fresh
            .iter()
            .map(Order::created_millis)
            .max()
            .unwrap_or(watermark);
        write_json(storage, keys::LAST_ORDER_CHECK, &latest)?;

        let unread = self.notifications.on_new_orders(&fresh, self.clock.now());
        self.persist_notifications();
        info!(count = fresh.len(), unread, watermark = latest, "New orders detected");

        let headline = match fresh.as_slice() {
            [only] => format!(
                "New Order #{}",
                only.order_number.clone().unwrap_or_else(|| only.id.to_string())
            ),
            many => format!("{} New Orders", many.len()),
        };
        self.alert(AlertLevel::Info, headline);

        Ok(fresh.iter().map(|order| order.id).collect())
    }

    #[instrument(fields(order_id = %id), skip(self, respond_to))]
    fn handle_get_order(&self, id: OrderId, respond_to: ServiceResponse<Option<Order>, OrderError>) {
        debug!("Processing get_order request");
        let order = self.orders.get(id).cloned();
        match &order {
            Some(order) => debug!(status = %order.status, total = %order.total, "Order found"),
            None => debug!("Order not found"),
        }
        let _ = respond_to.send(Ok(order));
    }

    #[instrument(skip(self, filter, respond_to))]
    fn handle_list_orders(
        &self,
        filter: OrderFilter,
        respond_to: ServiceResponse<Vec<Order>, OrderError>,
    ) {
        let orders: Vec<Order> = filter
            .apply(self.orders.list(), self.clock.now())
            .into_iter()
            .cloned()
            .collect();
        debug!(count = orders.len(), "Listed orders");
        let _ = respond_to.send(Ok(orders));
    }

    #[instrument(fields(order_id = %id, status = %status), skip(self, updated_by, respond_to))]
    fn handle_update_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        updated_by: Option<String>,
        respond_to: ServiceResponse<StatusUpdate, OrderError>,
    ) {
        info!("Processing update_status request");
        let result = self.change_status(id, updated_by.as_deref(), |order, by, now| {
            transition(order, status, by, now)
        });
        let _ = respond_to.send(result);
    }

    #[instrument(fields(order_id = %id, action = %action), skip(self, updated_by, respond_to))]
    fn handle_apply_action(
        &mut self,
        id: OrderId,
        action: OrderAction,
        updated_by: Option<String>,
        respond_to: ServiceResponse<StatusUpdate, OrderError>,
    ) {
        info!("Processing apply_action request");
        let result = self.change_status(id, updated_by.as_deref(), |order, by, now| {
            apply_action(order, action, by, now)
        });
        let _ = respond_to.send(result);
    }

    #[instrument(fields(count = ids.len(), status = %status), skip(self, ids, updated_by, respond_to))]
    fn handle_update_many(
        &mut self,
        ids: Vec<OrderId>,
        status: OrderStatus,
        updated_by: Option<String>,
        respond_to: ServiceResponse<BulkUpdate, OrderError>,
    ) {
        info!("Processing bulk status update");
        let mut outcome = BulkUpdate::default();
        for id in ids {
            match self.change_status(id, updated_by.as_deref(), |order, by, now| {
                transition(order, status, by, now)
            }) {
                Ok(_) => outcome.updated.push(id),
                Err(e) => outcome.failed.push((id, e)),
            }
        }

        if !outcome.updated.is_empty() {
            self.alert(
                AlertLevel::Success,
                format!("{} orders updated to {status}", outcome.updated.len()),
            );
        }
        if !outcome.failed.is_empty() {
            warn!(failed = outcome.failed.len(), "Some orders were not updated");
        }
        let _ = respond_to.send(Ok(outcome));
    }

    /// Transition, fan out, notify. The canonical copy is replaced even when a
    /// secondary location fails; the report says which ones did.
    fn change_status(
        &mut self,
        id: OrderId,
        updated_by: Option<&str>,
        change: impl FnOnce(&Order, Option<&str>, i64) -> Result<Order, OrderError>,
    ) -> Result<StatusUpdate, OrderError> {
        let Some(current) = self.orders.get(id).cloned() else {
            error!(order_id = %id, "Order not found");
            self.alert(AlertLevel::Error, "Order not found");
            return Err(OrderError::NotFound(id));
        };

        let now = self.clock.now();
        let updated = change(&current, updated_by, now.timestamp_millis()).map_err(|e| {
            warn!(order_id = %id, error = %e, "Status change rejected");
            e
        })?;

        let report = FanOutSynchronizer::new(
            self.storage.as_ref(),
            &self.identity,
            now.timestamp_millis(),
        )
        .propagate(&mut self.orders, &updated);

        self.notifications.on_status_changed(&updated, now);
        let unread = self.notifications.on_synced(&updated, now);
        self.persist_notifications();

        let number = updated.display_number();
        info!(
            order_id = %id,
            from = %current.status,
            to = %updated.status,
            copies = report.written().count(),
            "Status updated"
        );
        if report.is_complete() {
            self.alert(
                AlertLevel::Success,
                format!(
                    "Order {number} status updated to {} and synced with user",
                    updated.status
                ),
            );
        } else {
            self.alert(
                AlertLevel::Warning,
                format!(
                    "Order {number} status updated to {} but {} copies could not be synced",
                    updated.status,
                    report.failures().count()
                ),
            );
        }

        Ok(StatusUpdate {
            previous: current.status,
            order: updated,
            report,
            unread,
        })
    }

    /// Re-propagates every order whose user-submitted copy is missing or stale.
    #[instrument(skip(self, respond_to))]
    fn handle_sync_all(&mut self, respond_to: ServiceResponse<Vec<SyncReport>, OrderError>) {
        info!("Processing sync_all request");

        let mut submitted: Vec<Order> = match read_json(self.storage.as_ref(), keys::USER_ORDERS) {
            Ok(submitted) => submitted.unwrap_or_default(),
            Err(e) => {
                error!(error = %e, "User orders unreadable");
                let _ = respond_to.send(Err(e.into()));
                return;
            }
        };

        let pending: Vec<Order> = self
            .orders
            .list()
            .iter()
            .filter(|order| !is_synced(order, &submitted))
            .cloned()
            .collect();
        if pending.is_empty() {
            self.alert(AlertLevel::Info, "All orders are already synced");
            let _ = respond_to.send(Ok(Vec::new()));
            return;
        }

        let missing: Vec<Order> = pending
            .iter()
            .filter(|order| OrderKey::of(order).locate(&submitted).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            debug!(count = missing.len(), "Restoring missing user order copies");
            submitted.extend(missing);
            if let Err(e) = write_json(self.storage.as_ref(), keys::USER_ORDERS, &submitted) {
                warn!(error = %e, "Could not restore user order copies");
            }
        }

        let synchronizer = FanOutSynchronizer::new(
            self.storage.as_ref(),
            &self.identity,
            self.clock.now_millis(),
        );
        let reports: Vec<SyncReport> = pending
            .iter()
            .map(|order| synchronizer.propagate(&mut self.orders, order))
            .collect();

        let synced = reports
            .iter()
            .filter(|report| {
                report.is_complete()
                    && report.outcome(&CopyLocation::UserSubmitted) == Some(&SyncOutcome::Updated)
            })
            .count();
        info!(pending = pending.len(), synced, "Orders synced");
        self.alert(
            AlertLevel::Success,
            format!("{synced} orders synced with user history"),
        );
        let _ = respond_to.send(Ok(reports));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_stats(&self, respond_to: ServiceResponse<OrderStats, OrderError>) {
        let stats = OrderStats::compute(self.orders.list(), self.clock.now());
        debug!(total = stats.total_orders, pending = stats.pending, revenue = %stats.revenue, "Computed stats");
        let _ = respond_to.send(Ok(stats));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_export_csv(&self, respond_to: ServiceResponse<String, OrderError>) {
        debug!("Processing export_csv request");
        let result = read_json::<Vec<Order>>(self.storage.as_ref(), keys::USER_ORDERS)
            .map_err(OrderError::from)
            .map(|submitted| export_csv(self.orders.list(), &submitted.unwrap_or_default()));

        match &result {
            Ok(_) if self.orders.is_empty() => {
                self.alert(AlertLevel::Warning, "No orders to export")
            }
            Ok(_) => {
                info!(rows = self.orders.len(), "Orders exported");
                self.alert(AlertLevel::Success, "Orders exported successfully");
            }
            Err(e) => error!(error = %e, "Export failed"),
        }
        let _ = respond_to.send(result);
    }

    #[instrument(fields(order_id = %id), skip(self, respond_to))]
    fn handle_invoice(&self, id: OrderId, respond_to: ServiceResponse<String, OrderError>) {
        debug!("Processing invoice request");
        let result = self
            .orders
            .get(id)
            .map(|order| render_invoice(order, &self.identity))
            .ok_or(OrderError::NotFound(id));
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, respond_to))]
    fn handle_clear_older_than(&mut self, days: u32, respond_to: ServiceResponse<usize, OrderError>) {
        info!("Processing clear_older_than request");
        let result = self.clear_older_than(days);
        match &result {
            Ok(0) => self.alert(
                AlertLevel::Info,
                format!("No orders older than {days} days"),
            ),
            Ok(removed) => self.alert(
                AlertLevel::Success,
                format!("{removed} old orders cleared from all systems"),
            ),
            Err(e) => error!(error = %e, "Clearing old orders failed"),
        }
        let _ = respond_to.send(result);
    }

    fn clear_older_than(&mut self, days: u32) -> Result<usize, OrderError> {
        let cutoff = self.clock.now() - Duration::days(i64::from(days));
        let recent = |order: &Order| order.placed_at().map_or(true, |at| at >= cutoff);

        let storage = self.storage.as_ref();
        let removed = self.orders.retain(recent);
        write_json(storage, keys::ORDERS, self.orders.list())?;

        if let Some(mut submitted) = read_json::<Vec<Order>>(storage, keys::USER_ORDERS)? {
            let before = submitted.len();
            submitted.retain(recent);
            if submitted.len() != before {
                write_json(storage, keys::USER_ORDERS, &submitted)?;
            }
        }
        info!(removed, remaining = self.orders.len(), "Old orders cleared");
        Ok(removed)
    }

    #[instrument(fields(notification_id = id), skip(self, respond_to))]
    fn handle_mark_notification_read(&mut self, id: u64, respond_to: ServiceResponse<usize, OrderError>) {
        if self.notifications.mark_read(id) {
            self.persist_notifications();
        } else {
            debug!("Notification not found");
        }
        let _ = respond_to.send(Ok(self.notifications.unread_count()));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_mark_all_notifications_read(&mut self, respond_to: ServiceResponse<usize, OrderError>) {
        let marked = self.notifications.mark_all_read();
        if marked > 0 {
            self.persist_notifications();
        }
        debug!(marked, "Marked all notifications read");
        let _ = respond_to.send(Ok(marked));
    }

    /// Saves the identity and restamps it onto every canonical order.
    #[instrument(fields(store = %identity.name), skip(self, identity, respond_to))]
    fn handle_set_store_identity(
        &mut self,
        identity: StoreIdentity,
        respond_to: ServiceResponse<(), OrderError>,
    ) {
        let identity = StoreIdentity::new(
            identity.name.trim(),
            identity.phone.trim(),
            identity.address.trim(),
        );
        if identity.name.is_empty() {
            error!("Validation failed: empty store name");
            self.alert(AlertLevel::Error, "Store name is required");
            let _ = respond_to.send(Err(OrderError::ValidationError(
                "Store name is required".to_string(),
            )));
            return;
        }

        for order in self.orders.iter_mut() {
            order.market = Some(identity.name.clone());
            order.market_address = Some(identity.address.clone());
            order.market_phone = Some(identity.phone.clone());
        }
        self.identity = identity;

        let storage = self.storage.as_ref();
        let result = write_json(storage, keys::STORE_IDENTITY, &self.identity)
            .and_then(|()| write_json(storage, keys::ORDERS, self.orders.list()))
            .map_err(OrderError::from);
        match &result {
            Ok(()) => {
                info!("Store identity saved");
                self.alert(
                    AlertLevel::Success,
                    "Store information saved and updated in all orders",
                );
            }
            Err(e) => error!(error = %e, "Store identity not saved"),
        }
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, respond_to))]
    fn handle_set_refresh_interval(&self, millis: u64, respond_to: ServiceResponse<(), OrderError>) {
        let result = write_json(self.storage.as_ref(), keys::REFRESH_INTERVAL, &millis)
            .map_err(OrderError::from);
        if let Err(e) = &result {
            warn!(error = %e, "Refresh interval not saved");
        }
        let _ = respond_to.send(result);
    }
}
