use tokio::sync::{broadcast, mpsc};
use tracing::{debug, instrument};

use crate::domain::{Notification, Order, OrderId, OrderStatus, StoreIdentity};
use crate::error::OrderError;
use crate::messages::{Alert, BulkUpdate, LoadSummary, OrderRequest, StatusUpdate};
use crate::orders::{OrderAction, SyncReport};
use crate::reports::{OrderFilter, OrderStats};

/// Handle to the order service. Cheap to clone; every clone talks to the same actor.
#[derive(Clone)]
pub struct OrderClient {
    sender: mpsc::Sender<OrderRequest>,
    alerts: broadcast::Sender<Alert>,
}

impl OrderClient {
    pub fn new(sender: mpsc::Sender<OrderRequest>, alerts: broadcast::Sender<Alert>) -> Self {
        Self { sender, alerts }
    }

    /// User-visible alerts published from now on.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alerts.subscribe()
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), OrderError> {
        debug!("Sending shutdown request");
        self.sender
            .send(OrderRequest::Shutdown)
            .await
            .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))
    }
}

client_method!(OrderClient => fn load_orders() -> LoadSummary as OrderRequest::LoadOrders, Error = OrderError);
client_method!(OrderClient => fn get_order(id: OrderId) -> Option<Order> as OrderRequest::GetOrder, Error = OrderError);
client_method!(OrderClient => fn list_orders(filter: OrderFilter) -> Vec<Order> as OrderRequest::ListOrders, Error = OrderError);
client_method!(OrderClient => fn update_status(id: OrderId, status: OrderStatus, updated_by: Option<String>) -> StatusUpdate as OrderRequest::UpdateStatus, Error = OrderError);
client_method!(OrderClient => fn apply_action(id: OrderId, action: OrderAction, updated_by: Option<String>) -> StatusUpdate as OrderRequest::ApplyAction, Error = OrderError);
client_method!(OrderClient => fn update_many(ids: Vec<OrderId>, status: OrderStatus, updated_by: Option<String>) -> BulkUpdate as OrderRequest::UpdateMany, Error = OrderError);
client_method!(OrderClient => fn sync_all() -> Vec<SyncReport> as OrderRequest::SyncAll, Error = OrderError);
client_method!(OrderClient => fn stats() -> OrderStats as OrderRequest::Stats, Error = OrderError);
client_method!(OrderClient => fn export_csv() -> String as OrderRequest::ExportCsv, Error = OrderError);
client_method!(OrderClient => fn invoice(id: OrderId) -> String as OrderRequest::Invoice, Error = OrderError);
client_method!(OrderClient => fn clear_older_than(days: u32) -> usize as OrderRequest::ClearOlderThan, Error = OrderError);
client_method!(OrderClient => fn notifications() -> Vec<Notification> as OrderRequest::ListNotifications, Error = OrderError);
client_method!(OrderClient => fn mark_notification_read(id: u64) -> usize as OrderRequest::MarkNotificationRead, Error = OrderError);
client_method!(OrderClient => fn mark_all_notifications_read() -> usize as OrderRequest::MarkAllNotificationsRead, Error = OrderError);
client_method!(OrderClient => fn store_identity() -> StoreIdentity as OrderRequest::GetStoreIdentity, Error = OrderError);
client_method!(OrderClient => fn set_store_identity(identity: StoreIdentity) -> () as OrderRequest::SetStoreIdentity, Error = OrderError);
client_method!(OrderClient => fn refresh_interval() -> Option<u64> as OrderRequest::GetRefreshInterval, Error = OrderError);
client_method!(OrderClient => fn set_refresh_interval(millis: u64) -> () as OrderRequest::SetRefreshInterval, Error = OrderError);

// Test-only method for internal state inspection
#[cfg(test)]
client_method!(OrderClient => fn get_order_count() -> usize as OrderRequest::GetOrderCount, Error = OrderError);
