use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

use super::{AdminConfig, RefreshScheduler};
use crate::actors::OrderService;
use crate::clients::OrderClient;
use crate::clock::{Clock, SystemClock};
use crate::error::OrderError;
use crate::messages::Alert;
use crate::storage::KeyValueStore;

/// Owns the running order service and its auto-refresh timer.
///
/// Startup spawns the service, runs the first load so new orders are noticed right
/// away, and schedules periodic refreshes. Shutdown stops the timer first, then the
/// service, and waits for the task to finish.
pub struct OrderSystem {
    pub order_client: OrderClient,
    refresh: RefreshScheduler,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl OrderSystem {
    pub async fn new(config: AdminConfig, storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(config, storage, Arc::new(SystemClock)).await
    }

    #[instrument(name = "order_system", skip(storage, clock))]
    pub async fn with_clock(
        config: AdminConfig,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut handles = Vec::new();

        info!("Starting order system");

        let (order_service, order_client) = OrderService::new(config.buffer_size, storage, clock);
        handles.push(tokio::spawn(order_service.run()));

        if let Err(e) = order_client.load_orders().await {
            warn!(error = %e, "Initial load failed");
        }

        let interval = match order_client.refresh_interval().await {
            Ok(Some(millis)) => Duration::from_millis(millis),
            Ok(None) => config.refresh_interval,
            Err(e) => {
                warn!(error = %e, "Saved refresh interval unreadable, using configured one");
                config.refresh_interval
            }
        };
        let refresh = RefreshScheduler::start(order_client.clone(), interval);

        info!("Order system started successfully");

        Self {
            order_client,
            refresh,
            handles,
        }
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.order_client.subscribe_alerts()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh.interval()
    }

    /// Persists the new period and restarts the timer with it; `0` turns
    /// auto-refresh off.
    #[instrument(skip(self))]
    pub async fn set_refresh_interval(&mut self, millis: u64) -> Result<(), OrderError> {
        self.order_client.set_refresh_interval(millis).await?;
        self.refresh.set_interval(Duration::from_millis(millis));
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn shutdown(mut self) -> Result<(), OrderError> {
        info!("Shutting down order system");

        self.refresh.stop();
        let _ = self.order_client.shutdown().await;

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!(error = ?e, "Service shutdown error");
                return Err(OrderError::ActorCommunicationError(e.to_string()));
            }
        }

        info!("Order system shutdown complete");
        Ok(())
    }
}
