//! # Mock Framework
//!
//! Utilities for testing code that drives an [`OrderClient`] without spinning up
//! the real service.
//!
//! Use [`create_mock_client`] to get a client and the receiver its requests land
//! on, then helpers like [`expect_load_orders`] or [`expect_update_status`] to
//! assert on the next request and answer it.

use tokio::sync::{broadcast, mpsc};

use crate::actors::ALERT_CAPACITY;
use crate::clients::OrderClient;
use crate::domain::{OrderId, OrderStatus};
use crate::error::OrderError;
use crate::messages::{LoadSummary, OrderRequest, ServiceResponse, StatusUpdate};

/// Creates a mock client and a receiver for asserting requests.
///
/// The test plays the service: it reads requests off `receiver` and replies
/// through their `respond_to` channels, which makes success, failure and delay
/// deterministic.
pub fn create_mock_client(buffer_size: usize) -> (OrderClient, mpsc::Receiver<OrderRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (alerts, _) = broadcast::channel(ALERT_CAPACITY);
    (OrderClient::new(sender, alerts), receiver)
}

/// Helper to verify that the next message is a LoadOrders request
pub async fn expect_load_orders(
    receiver: &mut mpsc::Receiver<OrderRequest>,
) -> Option<ServiceResponse<LoadSummary, OrderError>> {
    match receiver.recv().await {
        Some(OrderRequest::LoadOrders { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is an UpdateStatus request
pub async fn expect_update_status(
    receiver: &mut mpsc::Receiver<OrderRequest>,
) -> Option<(
    OrderId,
    OrderStatus,
    Option<String>,
    ServiceResponse<StatusUpdate, OrderError>,
)> {
    match receiver.recv().await {
        Some(OrderRequest::UpdateStatus {
            id,
            status,
            updated_by,
            respond_to,
        }) => Some((id, status, updated_by, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Order;
    use crate::orders::SyncReport;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client(10);

        let update_task = tokio::spawn(async move {
            client
                .update_status(OrderId(1001), OrderStatus::Processing, Some("admin".to_string()))
                .await
        });

        let (id, status, updated_by, responder) = expect_update_status(&mut receiver)
            .await
            .expect("Expected UpdateStatus request");
        assert_eq!(id, OrderId(1001));
        assert_eq!(status, OrderStatus::Processing);
        assert_eq!(updated_by.as_deref(), Some("admin"));

        let order = Order::new(id, "A1001", status, Decimal::from(450));
        let update = StatusUpdate {
            previous: OrderStatus::Pending,
            order,
            report: SyncReport::new(id),
            unread: 2,
        };
        responder.send(Ok(update.clone())).unwrap();

        let result = update_task.await.unwrap();
        assert_eq!(result, Ok(update));
    }

    #[tokio::test]
    async fn dropped_request_is_a_communication_error() {
        let (client, mut receiver) = create_mock_client(10);
        let load_task = tokio::spawn(async move { client.load_orders().await });

        let responder = expect_load_orders(&mut receiver).await.unwrap();
        drop(responder);

        let result = load_task.await.unwrap();
        assert!(matches!(result, Err(OrderError::ActorCommunicationError(_))));
    }
}
