use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Order, OrderStatus};
use crate::error::OrderError;

/// Dashboard buttons, mapped onto status changes by [`OrderStatus::next_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Accept,
    Reject,
    Advance,
    Cancel,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderAction::Accept => "accept",
            OrderAction::Reject => "reject",
            OrderAction::Advance => "advance",
            OrderAction::Cancel => "cancel",
        };
        f.write_str(label)
    }
}

impl OrderStatus {
    /// Transition table for dashboard actions.
    pub fn next_for(self, action: OrderAction) -> Option<OrderStatus> {
        use OrderAction::*;
        use OrderStatus::*;
        match (self, action) {
            (Pending, Accept | Advance) => Some(Processing),
            (Pending, Reject) => Some(Cancelled),
            (Processing, Advance) => Some(OutForDelivery),
            (OutForDelivery, Advance) => Some(Delivered),
            (Processing | OutForDelivery, Cancel) => Some(Cancelled),
            _ => None,
        }
    }

    pub fn available_actions(self) -> Vec<OrderAction> {
        [
            OrderAction::Accept,
            OrderAction::Reject,
            OrderAction::Advance,
            OrderAction::Cancel,
        ]
        .into_iter()
        .filter(|action| self.next_for(*action).is_some())
        .collect()
    }
}

/// Returns `order` moved to `new_status`.
///
/// Terminal orders are never reopened. Any other status may be overwritten, which
/// the bulk dashboard actions rely on. `updated_at` always moves forward, even when
/// the clock has not.
pub fn transition(
    order: &Order,
    new_status: OrderStatus,
    updated_by: Option<&str>,
    now_millis: i64,
) -> Result<Order, OrderError> {
    if order.status.is_terminal() {
        return Err(OrderError::InvalidTransition {
            id: order.id,
            from: order.status,
            requested: new_status.to_string(),
        });
    }

    let mut next = order.clone();
    next.status = new_status;
    next.updated_at = Some(match order.updated_at {
        Some(previous) if previous >= now_millis => previous + 1,
        _ => now_millis,
    });
    if let Some(actor) = updated_by {
        next.updated_by = Some(actor.to_string());
    }
    Ok(next)
}

pub fn apply_action(
    order: &Order,
    action: OrderAction,
    updated_by: Option<&str>,
    now_millis: i64,
) -> Result<Order, OrderError> {
    let target = order
        .status
        .next_for(action)
        .ok_or_else(|| OrderError::InvalidTransition {
            id: order.id,
            from: order.status,
            requested: action.to_string(),
        })?;
    transition(order, target, updated_by, now_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderId;
    use rust_decimal::Decimal;

    fn order(status: OrderStatus) -> Order {
        Order::new(OrderId(1001), "A1001", status, Decimal::from(450))
    }

    #[test]
    fn pending_to_processing_stamps_metadata() {
        let next = transition(&order(OrderStatus::Pending), OrderStatus::Processing, Some("admin"), 50).unwrap();
        assert_eq!(next.status, OrderStatus::Processing);
        assert_eq!(next.updated_at, Some(50));
        assert_eq!(next.updated_by.as_deref(), Some("admin"));
    }

    #[test]
    fn updated_at_moves_forward_on_a_stalled_clock() {
        let mut current = order(OrderStatus::Pending);
        current.updated_at = Some(80);
        let next = transition(&current, OrderStatus::Processing, None, 80).unwrap();
        assert_eq!(next.updated_at, Some(81));
        assert_eq!(next.updated_by, None);
    }

    #[test]
    fn terminal_orders_reject_every_transition() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for target in OrderStatus::ALL {
                let err = transition(&order(terminal), target, None, 1).unwrap_err();
                assert!(matches!(err, OrderError::InvalidTransition { from, .. } if from == terminal));
            }
        }
    }

    #[test]
    fn action_table() {
        use OrderAction::*;
        use OrderStatus::*;
        assert_eq!(Pending.next_for(Accept), Some(Processing));
        assert_eq!(Pending.next_for(Reject), Some(Cancelled));
        assert_eq!(Processing.next_for(Advance), Some(OutForDelivery));
        assert_eq!(Processing.next_for(Cancel), Some(Cancelled));
        assert_eq!(OutForDelivery.next_for(Advance), Some(Delivered));
        assert_eq!(OutForDelivery.next_for(Cancel), Some(Cancelled));
        assert_eq!(Processing.next_for(Accept), None);
        assert!(Delivered.available_actions().is_empty());
        assert!(Cancelled.available_actions().is_empty());
    }

    #[test]
    fn action_outside_table_is_invalid() {
        let err = apply_action(&order(OrderStatus::Processing), OrderAction::Reject, None, 1).unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                id: OrderId(1001),
                from: OrderStatus::Processing,
                requested: "reject".to_string(),
            }
        );
    }
}
