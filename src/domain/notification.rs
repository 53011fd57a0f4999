use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
    StatusChanged,
    OrderSynced,
    #[serde(other)]
    Other,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::NewOrder => "new_order",
            NotificationKind::StatusChanged => "status_changed",
            NotificationKind::OrderSynced => "order_synced",
            NotificationKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// An entry in the admin notification feed. Only `read` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub order_id: OrderId,
    pub order_number: String,
    pub message: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}
