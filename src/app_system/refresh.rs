use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::clients::OrderClient;
use crate::error::OrderError;

/// Periodically re-runs the load/merge/notify cycle.
///
/// Changing the interval cancels the running timer and starts a fresh one; a zero
/// interval leaves no timer running. Dropping the scheduler stops it.
pub struct RefreshScheduler {
    client: OrderClient,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn start(client: OrderClient, interval: Duration) -> Self {
        let mut scheduler = Self {
            client,
            interval: Duration::ZERO,
            task: None,
        };
        scheduler.set_interval(interval);
        scheduler
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    #[instrument(skip(self))]
    pub fn set_interval(&mut self, interval: Duration) {
        self.stop();
        self.interval = interval;
        if interval.is_zero() {
            info!("Auto-refresh disabled");
            return;
        }

        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        info!(interval_ms, "Auto-refresh scheduled");
        let span = info_span!("auto_refresh", interval_ms);
        self.task = Some(tokio::spawn(
            refresh_loop(self.client.clone(), interval).instrument(span),
        ));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Stopping auto-refresh");
            task.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// First tick fires one full period after start; the initial load is the caller's.
async fn refresh_loop(client: OrderClient, period: Duration) {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        timer.tick().await;
        match client.load_orders().await {
            Ok(summary) => debug!(
                total = summary.total,
                new_orders = summary.new_orders.len(),
                "Auto-refresh completed"
            ),
            Err(OrderError::ActorCommunicationError(e)) => {
                warn!(error = %e, "Order service gone, stopping auto-refresh");
                break;
            }
            Err(e) => warn!(error = %e, "Auto-refresh failed"),
        }
    }
}
