use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    #[default]
    All,
    /// Same UTC calendar day as now.
    Today,
    /// The last seven days.
    Week,
    /// Since the same day last month.
    Month,
}

impl TimeWindow {
    pub fn contains(self, placed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            TimeWindow::All => true,
            TimeWindow::Today => placed_at.date_naive() == now.date_naive(),
            TimeWindow::Week => placed_at >= now - Duration::days(7),
            TimeWindow::Month => match now.checked_sub_months(Months::new(1)) {
                Some(month_ago) => placed_at >= month_ago,
                None => true,
            },
        }
    }
}

/// Dashboard list filter. Every criterion left empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub window: TimeWindow,
    pub search: Option<String>,
}

impl OrderFilter {
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn matches(&self, order: &Order, now: DateTime<Utc>) -> bool {
        if self.status.is_some_and(|status| order.status != status) {
            return false;
        }
        if self.window != TimeWindow::All {
            match order.placed_at() {
                Some(placed_at) if self.window.contains(placed_at, now) => {}
                _ => return false,
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => searchable_text(order).contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply<'a>(&self, orders: &'a [Order], now: DateTime<Utc>) -> Vec<&'a Order> {
        orders.iter().filter(|order| self.matches(order, now)).collect()
    }
}

fn searchable_text(order: &Order) -> String {
    let id = order.id.to_string();
    [
        order.customer_name.as_deref(),
        order.customer_phone.as_deref(),
        order.customer_email.as_deref(),
        order.delivery_address.as_deref(),
        order.order_number.as_deref(),
        Some(id.as_str()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}
