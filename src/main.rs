use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use grocery_orders::app_system::{setup_tracing, AdminConfig, OrderSystem};
use grocery_orders::domain::{LineItem, Order, OrderId, OrderItems, OrderStatus, StoreIdentity};
use grocery_orders::orders::OrderAction;
use grocery_orders::storage::{keys, write_json, MemoryStore};

/// Seeds the customer-submitted collection the way the storefront would.
fn seed(storage: &MemoryStore) -> Result<(), String> {
    let mut order = Order::new(
        OrderId::UNASSIGNED,
        "A1001",
        OrderStatus::Pending,
        Decimal::new(45000, 2),
    )
    .with_customer("Asha", "9845012345")
    .with_items(OrderItems::Lines(vec![
        LineItem::new("Basmati Rice 5kg", 1, Decimal::new(40000, 2)),
        LineItem::new("Milk 1L", 2, Decimal::new(2500, 2)),
    ]))
    .with_timestamp(chrono::Utc::now().timestamp_millis());
    order.delivery_address = Some("12 MG Road\nBengaluru".to_string());

    write_json(storage, keys::USER_ORDERS, &vec![order.clone()]).map_err(|e| e.to_string())?;
    write_json(storage, "user_9845012345", &vec![order]).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = AdminConfig::from_env().map_err(|e| e.to_string())?;
    setup_tracing(&config);

    info!("Starting order admin");

    let storage = MemoryStore::new();
    seed(&storage)?;

    let system = OrderSystem::new(config, Arc::new(storage.clone())).await;
    let mut alerts = system.subscribe_alerts();
    let client = system.order_client.clone();

    client
        .set_store_identity(StoreIdentity::new("AS Mart", "080-2345-6789", "Indiranagar, Bengaluru"))
        .await
        .map_err(|e| e.to_string())?;

    let orders = client.list_orders(Default::default()).await.map_err(|e| e.to_string())?;
    let Some(first) = orders.first() else {
        return Err("no orders were merged".to_string());
    };
    let id = first.id;

    let span = tracing::info_span!("order_processing", order_id = %id);
    async {
        for action in [OrderAction::Accept, OrderAction::Advance, OrderAction::Advance] {
            match client.apply_action(id, action, Some("admin".to_string())).await {
                Ok(update) => info!(
                    from = %update.previous,
                    to = %update.order.status,
                    copies = update.report.written().count(),
                    unread = update.unread,
                    "Order advanced"
                ),
                Err(e) => error!(error = %e, "Order action failed"),
            }
        }

        // Delivered is terminal.
        if let Err(e) = client.apply_action(id, OrderAction::Cancel, None).await {
            info!(error = %e, "Cancel refused as expected");
        }
    }
    .instrument(span)
    .await;

    let stats = client.stats().await.map_err(|e| e.to_string())?;
    info!(total = stats.total_orders, revenue = %stats.revenue, "Dashboard stats");

    let csv = client.export_csv().await.map_err(|e| e.to_string())?;
    info!(lines = csv.lines().count(), "CSV exported");

    let invoice = client.invoice(id).await.map_err(|e| e.to_string())?;
    info!(bytes = invoice.len(), "Invoice rendered");

    while let Ok(alert) = alerts.try_recv() {
        info!(level = ?alert.level, message = %alert.message, "Alert");
    }

    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Order admin finished");
    Ok(())
}
