use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::OrderError;

/// Time-based numeric order identifier. `0` marks a legacy record that never had one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    pub const UNASSIGNED: OrderId = OrderId(0);

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }

    /// Last six digits, used when an order has no human-readable number.
    pub fn short(self) -> String {
        let digits = self.0.to_string();
        let start = digits.len().saturating_sub(6);
        digits[start..].to_string()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status. Serialized with the exact labels the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "processing")]
    Processing,
    #[serde(rename = "Out for Delivery", alias = "out_for_delivery")]
    OutForDelivery,
    #[serde(alias = "delivered")]
    Delivered,
    #[serde(alias = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// `Delivered` and `Cancelled` admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Badge class, e.g. `status-out-for-delivery`.
    pub fn css_class(self) -> String {
        format!("status-{}", self.as_str().to_lowercase().replace(' ', "-"))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| OrderError::UnknownStatus(wanted.to_string()))
    }
}

/// One purchased line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, alias = "product")]
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub price: Decimal,
}

fn default_quantity() -> u32 {
    1
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Itemized lines, or the free-text description older orders carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderItems {
    Lines(Vec<LineItem>),
    Description(String),
}

impl Default for OrderItems {
    fn default() -> Self {
        OrderItems::Lines(Vec::new())
    }
}

impl OrderItems {
    /// `Milk x2; Bread x1`, or the description verbatim.
    pub fn summary(&self) -> String {
        match self {
            OrderItems::Lines(lines) => lines
                .iter()
                .map(|line| format!("{} x{}", line.name, line.quantity))
                .collect::<Vec<_>>()
                .join("; "),
            OrderItems::Description(text) => text.clone(),
        }
    }
}

/// Represents a customer order.
///
/// Fields this crate does not model are kept in `extra`, so a record read from any
/// copy location is written back without losing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub items: OrderItems,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn new(
        id: OrderId,
        order_number: impl Into<String>,
        status: OrderStatus,
        total: Decimal,
    ) -> Self {
        Self {
            id,
            order_number: Some(order_number.into()),
            customer_name: None,
            customer_phone: None,
            customer_email: None,
            delivery_address: None,
            delivery_notes: None,
            payment_method: None,
            items: OrderItems::default(),
            total,
            status,
            timestamp: None,
            date: None,
            updated_at: None,
            updated_by: None,
            market: None,
            market_address: None,
            market_phone: None,
            extra: Map::new(),
        }
    }

    pub fn with_customer(mut self, name: impl Into<String>, phone: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self.customer_phone = Some(phone.into());
        self
    }

    pub fn with_items(mut self, items: OrderItems) -> Self {
        self.items = items;
        self
    }

    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    /// The order number, or `#` followed by the last six digits of the id.
    pub fn display_number(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id.short()))
    }

    /// Recency key: creation timestamp, falling back to the time-based id.
    pub fn created_millis(&self) -> i64 {
        self.timestamp
            .unwrap_or_else(|| i64::try_from(self.id.0).unwrap_or(i64::MAX))
    }

    /// When the order was placed: the explicit `date` if it parses, else the
    /// creation timestamp.
    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.date
            .as_deref()
            .and_then(parse_order_date)
            .or_else(|| DateTime::from_timestamp_millis(self.created_millis()))
    }

    /// The phone number, when present and not blank.
    pub fn phone(&self) -> Option<&str> {
        self.customer_phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
    }
}

/// Dashboard date format, e.g. `05 Jan 2025`.
pub fn display_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|at| at.format("%d %b %Y").to_string())
        .unwrap_or_default()
}

fn parse_order_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%d %b %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
