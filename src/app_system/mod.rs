//! System orchestration: configuration, startup, the auto-refresh timer, tracing
//! setup and shutdown.

pub mod config;
pub mod order_system;
pub mod refresh;
pub mod tracing;

pub use config::*;
pub use order_system::*;
pub use refresh::*;
pub use self::tracing::*;
