use tracing_subscriber::fmt::time::uptime;
use tracing_subscriber::EnvFilter;

use super::AdminConfig;

/// Installs the process-wide subscriber: the configured filter (`RUST_LOG` when
/// set), uptime timestamps and the compact formatter. Call once at startup.
///
/// ```bash
/// RUST_LOG=debug order_admin
/// RUST_LOG=grocery_orders::orders=debug,info order_admin
/// ```
pub fn setup_tracing(config: &AdminConfig) {
    let env_filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(super::DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(uptime())
        .compact()
        .init();
}
