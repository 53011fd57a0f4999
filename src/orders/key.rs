use crate::domain::{Order, OrderId};

/// How a copy of an order is recognised in any collection.
///
/// The id is authoritative. The order number is only consulted when no record
/// carries the id, and the customer phone only where a caller opts in (per-user
/// collections written before orders had ids).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub id: OrderId,
    pub order_number: Option<String>,
    pub phone: Option<String>,
}

impl OrderKey {
    pub fn of(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            phone: order.phone().map(str::to_string),
        }
    }

    pub fn matches(&self, candidate: &Order) -> bool {
        self.matches_id(candidate) || self.matches_number(candidate)
    }

    /// Index of the copy in `records`: an id match first, then an order-number match.
    pub fn locate(&self, records: &[Order]) -> Option<usize> {
        records
            .iter()
            .position(|record| self.matches_id(record))
            .or_else(|| records.iter().position(|record| self.matches_number(record)))
    }

    /// [`locate`](Self::locate), falling back to the first record with the same phone.
    pub fn locate_with_phone(&self, records: &[Order]) -> Option<usize> {
        self.locate(records).or_else(|| {
            let phone = self.phone.as_deref()?;
            records.iter().position(|record| record.phone() == Some(phone))
        })
    }

    fn matches_id(&self, candidate: &Order) -> bool {
        self.id.is_assigned() && candidate.id == self.id
    }

    fn matches_number(&self, candidate: &Order) -> bool {
        match self.order_number.as_deref() {
            Some(number) => candidate.order_number.as_deref() == Some(number),
            None => false,
        }
    }
}
