#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;

    use crate::app_system::{AdminConfig, OrderSystem};
    use crate::clock::FixedClock;
    use crate::domain::{NotificationKind, Order, OrderId, OrderStatus, StoreIdentity};
    use crate::error::OrderError;
    use crate::messages::AlertLevel;
    use crate::orders::{CopyLocation, OrderAction, SyncOutcome};
    use crate::reports::{OrderFilter, CSV_HEADER};
    use crate::storage::{keys, read_json, write_json, MemoryStore};

    const NOW: i64 = 1_736_942_400_000; // 2025-01-15T12:00:00Z
    const DAY: i64 = 86_400_000;

    fn customer_order(id: u64, number: &str, phone: &str) -> Order {
        Order::new(OrderId(id), number, OrderStatus::Pending, Decimal::from(450))
            .with_customer("Asha", phone)
            .with_timestamp(i64::try_from(id).unwrap())
    }

    fn config() -> AdminConfig {
        AdminConfig {
            refresh_interval: Duration::ZERO,
            ..AdminConfig::default()
        }
    }

    async fn start(storage: &MemoryStore, config: AdminConfig) -> (OrderSystem, FixedClock) {
        let clock = FixedClock::at_millis(NOW);
        let system =
            OrderSystem::with_clock(config, Arc::new(storage.clone()), Arc::new(clock.clone()))
                .await;
        (system, clock)
    }

    fn stored(storage: &MemoryStore, key: &str) -> Vec<Order> {
        read_json(storage, key).unwrap().unwrap_or_default()
    }

    #[tokio::test]
    async fn status_change_reaches_every_copy() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        let submitted = customer_order(1001, "A1001", "98450");
        let mut legacy_copy = submitted.clone();
        legacy_copy.id = OrderId::UNASSIGNED;
        write_json(&storage, keys::USER_ORDERS, &vec![submitted.clone()])?;
        write_json(&storage, "user_asha", &vec![legacy_copy])?;
        write_json(&storage, "history_98450", &vec![submitted.clone()])?;

        let (system, _clock) = start(&storage, config()).await;
        let client = system.order_client.clone();
        let mut alerts = system.subscribe_alerts();

        let notifications = client.notifications().await?;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::NewOrder);
        assert_eq!(notifications[0].message, "New order A1001 from Asha");

        let update = client
            .update_status(OrderId(1001), OrderStatus::Processing, Some("admin".to_string()))
            .await?;
        assert_eq!(update.previous, OrderStatus::Pending);
        assert_eq!(update.order.status, OrderStatus::Processing);
        assert_eq!(update.order.updated_at, Some(NOW));
        assert!(update.report.is_complete());
        assert_eq!(update.unread, 3);
        assert_eq!(
            update
                .report
                .outcome(&CopyLocation::CustomerHistory("history_98450".to_string())),
            Some(&SyncOutcome::Updated)
        );

        for key in [
            keys::ORDERS,
            keys::USER_ORDERS,
            "user_asha",
            "history_98450",
            keys::GLOBAL_HISTORY,
        ] {
            let copies = stored(&storage, key);
            assert_eq!(copies[0].status, OrderStatus::Processing, "stale copy under {key}");
        }

        let kinds: Vec<NotificationKind> = client
            .notifications()
            .await?
            .iter()
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::OrderSynced,
                NotificationKind::StatusChanged,
                NotificationKind::NewOrder
            ]
        );

        let alert = alerts.recv().await?;
        assert_eq!(alert.level, AlertLevel::Success);
        assert_eq!(
            alert.message,
            "Order A1001 status updated to Processing and synced with user"
        );

        system.shutdown().await?;
        Ok(())
    }

    #[tokio::test]
    async fn delivered_orders_stay_delivered() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        write_json(&storage, keys::USER_ORDERS, &vec![customer_order(7, "A7", "555")])?;
        let (system, clock) = start(&storage, config()).await;
        let client = system.order_client.clone();

        let mut last_update = 0;
        for action in [OrderAction::Accept, OrderAction::Advance, OrderAction::Advance] {
            let update = client.apply_action(OrderId(7), action, None).await?;
            let stamped = update.order.updated_at.unwrap();
            assert!(stamped > last_update);
            last_update = stamped;
            clock.advance(chrono::Duration::seconds(1));
        }
        assert_eq!(
            client.get_order(OrderId(7)).await?.map(|o| o.status),
            Some(OrderStatus::Delivered)
        );

        let reopen = client
            .update_status(OrderId(7), OrderStatus::Pending, None)
            .await;
        assert!(matches!(
            reopen,
            Err(OrderError::InvalidTransition { from: OrderStatus::Delivered, .. })
        ));
        let cancel = client.apply_action(OrderId(7), OrderAction::Cancel, None).await;
        assert!(matches!(cancel, Err(OrderError::InvalidTransition { .. })));
        assert_eq!(stored(&storage, keys::USER_ORDERS)[0].status, OrderStatus::Delivered);

        let missing = client
            .update_status(OrderId(99), OrderStatus::Processing, None)
            .await;
        assert_eq!(missing.unwrap_err(), OrderError::NotFound(OrderId(99)));

        system.shutdown().await?;
        Ok(())
    }

    #[tokio::test]
    async fn bulk_update_reports_each_order() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        write_json(
            &storage,
            keys::USER_ORDERS,
            &vec![customer_order(1, "A1", "1"), customer_order(2, "A2", "2")],
        )?;
        let (system, _clock) = start(&storage, config()).await;
        let client = system.order_client.clone();

        let bulk = client
            .update_many(
                vec![OrderId(1), OrderId(2), OrderId(3)],
                OrderStatus::Processing,
                Some("admin".to_string()),
            )
            .await?;
        assert_eq!(bulk.updated, vec![OrderId(1), OrderId(2)]);
        assert_eq!(bulk.failed, vec![(OrderId(3), OrderError::NotFound(OrderId(3)))]);

        let processing = client
            .list_orders(OrderFilter::default().status(OrderStatus::Processing))
            .await?;
        assert_eq!(processing.len(), 2);
        assert!(processing
            .iter()
            .all(|o| o.updated_by.as_deref() == Some("admin")));

        system.shutdown().await?;
        Ok(())
    }

    #[tokio::test]
    async fn sync_all_repairs_stale_copies() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        let mut canonical = customer_order(5, "A5", "77");
        canonical.status = OrderStatus::OutForDelivery;
        write_json(&storage, keys::ORDERS, &vec![canonical.clone()])?;
        write_json(&storage, keys::USER_ORDERS, &vec![customer_order(5, "A5", "77")])?;
        write_json(&storage, keys::LAST_ORDER_CHECK, &10_i64)?;

        let (system, _clock) = start(&storage, config()).await;
        let client = system.order_client.clone();

        let csv = client.export_csv().await?;
        assert!(csv.starts_with(CSV_HEADER));
        assert!(csv.contains("\"Not Synced\""));

        let reports = client.sync_all().await?;
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_complete());
        assert_eq!(stored(&storage, keys::USER_ORDERS)[0].status, OrderStatus::OutForDelivery);
        assert_eq!(stored(&storage, "history_77").len(), 1);

        assert!(client.sync_all().await?.is_empty());
        assert!(client.export_csv().await?.contains("\"Synced\""));

        system.shutdown().await?;
        Ok(())
    }

    #[tokio::test]
    async fn sync_all_restores_missing_user_copy() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        write_json(&storage, keys::ORDERS, &vec![customer_order(5, "A5", "77")])?;
        write_json(&storage, keys::LAST_ORDER_CHECK, &10_i64)?;

        let (system, _clock) = start(&storage, config()).await;
        let client = system.order_client.clone();
        assert!(client.export_csv().await?.contains("\"Not Synced\""));
        let mut alerts = system.subscribe_alerts();

        let reports = client.sync_all().await?;
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].outcome(&CopyLocation::UserSubmitted),
            Some(&SyncOutcome::Updated)
        );
        let alert = alerts.recv().await?;
        assert_eq!(alert.message, "1 orders synced with user history");

        let copies = stored(&storage, keys::USER_ORDERS);
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].id, OrderId(5));
        assert!(client.sync_all().await?.is_empty());
        assert!(!client.export_csv().await?.contains("Not Synced"));

        system.shutdown().await?;
        Ok(())
    }

    #[tokio::test]
    async fn clearing_old_orders_touches_both_collections() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        let old = customer_order((NOW - 45 * DAY) as u64, "OLD", "1");
        let recent = customer_order((NOW - 2 * DAY) as u64, "NEW", "2");
        write_json(&storage, keys::USER_ORDERS, &vec![old, recent])?;

        let (system, _clock) = start(&storage, config()).await;
        let client = system.order_client.clone();
        assert_eq!(client.stats().await?.total_orders, 2);

        assert_eq!(client.clear_older_than(30).await?, 1);
        assert_eq!(client.clear_older_than(30).await?, 0);

        let numbers: Vec<Option<String>> = stored(&storage, keys::USER_ORDERS)
            .into_iter()
            .map(|o| o.order_number)
            .collect();
        assert_eq!(numbers, vec![Some("NEW".to_string())]);
        assert_eq!(stored(&storage, keys::ORDERS).len(), 1);

        system.shutdown().await?;
        Ok(())
    }

    #[tokio::test]
    async fn store_identity_survives_restart() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        write_json(&storage, keys::USER_ORDERS, &vec![customer_order(3, "A3", "3")])?;

        let (system, _clock) = start(&storage, config()).await;
        let client = system.order_client.clone();
        client
            .set_store_identity(StoreIdentity::new(" Fresh Mart ", "080-1", "MG Road"))
            .await?;
        assert_eq!(
            stored(&storage, keys::ORDERS)[0].market.as_deref(),
            Some("Fresh Mart")
        );
        let unread = client.notifications().await?.len();
        system.shutdown().await?;

        let (system, _clock) = start(&storage, config()).await;
        let client = system.order_client.clone();
        assert_eq!(client.store_identity().await?.name, "Fresh Mart");
        assert_eq!(client.notifications().await?.len(), unread);
        let invoice = client.invoice(OrderId(3)).await?;
        assert!(invoice.contains("<h1>Fresh Mart</h1>"));
        assert!(invoice.contains("Grand Total:</td><td>₹490.00</td>"));
        assert_eq!(
            client.invoice(OrderId(4)).await.unwrap_err(),
            OrderError::NotFound(OrderId(4))
        );

        system.shutdown().await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_picks_up_new_orders() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        let (system, _clock) = start(&storage, AdminConfig::default()).await;
        let client = system.order_client.clone();
        assert_eq!(system.refresh_interval(), Duration::from_secs(30));
        assert!(client.notifications().await?.is_empty());

        write_json(&storage, keys::USER_ORDERS, &vec![customer_order(42, "A42", "9")])?;
        tokio::time::sleep(Duration::from_secs(31)).await;

        let notifications = client.notifications().await?;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].order_id, OrderId(42));

        system.shutdown().await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn saved_refresh_interval_wins_and_zero_disables() -> Result<(), Box<dyn std::error::Error>> {
        let storage = MemoryStore::new();
        write_json(&storage, keys::REFRESH_INTERVAL, &60_000_u64)?;

        let (mut system, _clock) = start(&storage, AdminConfig::default()).await;
        assert_eq!(system.refresh_interval(), Duration::from_secs(60));

        system.set_refresh_interval(0).await?;
        assert_eq!(read_json::<u64>(&storage, keys::REFRESH_INTERVAL)?, Some(0));

        write_json(&storage, keys::USER_ORDERS, &vec![customer_order(42, "A42", "9")])?;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(system.order_client.notifications().await?.is_empty());

        system.shutdown().await?;
        Ok(())
    }
}
