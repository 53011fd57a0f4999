use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::domain::{Notification, Order, OrderId, OrderStatus, StoreIdentity};
use crate::error::OrderError;
use crate::orders::{OrderAction, SyncReport};
use crate::reports::{OrderFilter, OrderStats};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Typed messages for the order service. Each variant carries its parameters and a
/// oneshot channel for the reply.
#[derive(Debug)]
pub enum OrderRequest {
    LoadOrders {
        respond_to: ServiceResponse<LoadSummary, OrderError>,
    },
    GetOrder {
        id: OrderId,
        respond_to: ServiceResponse<Option<Order>, OrderError>,
    },
    ListOrders {
        filter: OrderFilter,
        respond_to: ServiceResponse<Vec<Order>, OrderError>,
    },
    UpdateStatus {
        id: OrderId,
        status: OrderStatus,
        updated_by: Option<String>,
        respond_to: ServiceResponse<StatusUpdate, OrderError>,
    },
    ApplyAction {
        id: OrderId,
        action: OrderAction,
        updated_by: Option<String>,
        respond_to: ServiceResponse<StatusUpdate, OrderError>,
    },
    UpdateMany {
        ids: Vec<OrderId>,
        status: OrderStatus,
        updated_by: Option<String>,
        respond_to: ServiceResponse<BulkUpdate, OrderError>,
    },
    SyncAll {
        respond_to: ServiceResponse<Vec<SyncReport>, OrderError>,
    },
    Stats {
        respond_to: ServiceResponse<OrderStats, OrderError>,
    },
    ExportCsv {
        respond_to: ServiceResponse<String, OrderError>,
    },
    Invoice {
        id: OrderId,
        respond_to: ServiceResponse<String, OrderError>,
    },
    ClearOlderThan {
        days: u32,
        respond_to: ServiceResponse<usize, OrderError>,
    },
    ListNotifications {
        respond_to: ServiceResponse<Vec<Notification>, OrderError>,
    },
    MarkNotificationRead {
        id: u64,
        respond_to: ServiceResponse<usize, OrderError>,
    },
    MarkAllNotificationsRead {
        respond_to: ServiceResponse<usize, OrderError>,
    },
    GetStoreIdentity {
        respond_to: ServiceResponse<StoreIdentity, OrderError>,
    },
    SetStoreIdentity {
        identity: StoreIdentity,
        respond_to: ServiceResponse<(), OrderError>,
    },
    GetRefreshInterval {
        respond_to: ServiceResponse<Option<u64>, OrderError>,
    },
    SetRefreshInterval {
        millis: u64,
        respond_to: ServiceResponse<(), OrderError>,
    },
    Shutdown,
    #[cfg(test)]
    GetOrderCount {
        respond_to: ServiceResponse<usize, OrderError>,
    },
}

/// Result of one load/merge/notify cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub total: usize,
    pub merged: usize,
    pub new_orders: Vec<OrderId>,
    pub unread: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub previous: OrderStatus,
    pub order: Order,
    pub report: SyncReport,
    pub unread: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkUpdate {
    pub updated: Vec<OrderId>,
    pub failed: Vec<(OrderId, OrderError)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-visible message published on the alert broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}
