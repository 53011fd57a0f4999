use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Order, OrderStatus};

/// Dashboard headline figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_orders: usize,
    pub pending: usize,
    pub revenue: Decimal,
    pub unique_customers: usize,
    pub orders_today: usize,
}

impl OrderStats {
    pub fn compute(orders: &[Order], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let phones: HashSet<&str> = orders.iter().filter_map(Order::phone).collect();
        Self {
            total_orders: orders.len(),
            pending: orders
                .iter()
                .filter(|order| order.status == OrderStatus::Pending)
                .count(),
            revenue: orders.iter().map(|order| order.total).sum(),
            unique_customers: phones.len(),
            orders_today: orders
                .iter()
                .filter(|order| order.placed_at().is_some_and(|at| at.date_naive() == today))
                .count(),
        }
    }
}
