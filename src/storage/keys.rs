//! Storage key layout.

use crate::domain::Order;

/// Canonical, admin-visible merged order set.
pub const ORDERS: &str = "orders";
/// Orders as customers submitted them.
pub const USER_ORDERS: &str = "userOrders";
/// Prefix of per-user order collections.
pub const USER_COLLECTION_PREFIX: &str = "user_";
/// Prefix of per-customer capped histories.
pub const HISTORY_PREFIX: &str = "history_";
/// Cross-customer capped history.
pub const GLOBAL_HISTORY: &str = "userHistory";
pub const NOTIFICATIONS: &str = "notifications";
pub const STORE_IDENTITY: &str = "storeIdentity";
/// Watermark (milliseconds) for new-order detection.
pub const LAST_ORDER_CHECK: &str = "lastOrderCheck";
/// Auto-refresh period in milliseconds; `0` disables polling.
pub const REFRESH_INTERVAL: &str = "refreshInterval";

/// A `user_*` key other than the user-submitted collection.
pub fn is_user_collection(key: &str) -> bool {
    key.starts_with(USER_COLLECTION_PREFIX) && key != USER_ORDERS
}

/// `history_{phone}`, or `history_{id}` when the order carries no phone.
pub fn customer_history(order: &Order) -> String {
    match order.phone() {
        Some(phone) => format!("{HISTORY_PREFIX}{phone}"),
        None => format!("{HISTORY_PREFIX}{}", order.id),
    }
}
