//! The order service actor. It owns every piece of mutable order state, so all
//! requests run to completion one at a time.

pub mod order_service;

pub use order_service::{OrderService, ALERT_CAPACITY};
