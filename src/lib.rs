//! # Grocery Order Admin
//!
//! Order lifecycle and synchronization for a small grocery store's back office.
//!
//! Customers submit orders into one collection; the admin works from another. The
//! same logical order also lives in per-user collections and two capped history
//! logs. This crate keeps all of those copies in step when an order changes status,
//! and derives the admin notification feed from those changes.
//!
//! ## Layout
//!
//! - **Domain types** - Orders, statuses, notifications, store identity → [`domain`]
//! - **Storage** - Key/value document store behind a trait → [`storage::KeyValueStore`]
//! - **Lifecycle core**
//!     - **Order Store** - Canonical set and the merge of submitted orders → [`orders::OrderStore`]
//!     - **Transition Engine** - Status changes with terminal states → [`orders::transition`]
//!     - **Fan-out Synchronizer** - One change written to every copy → [`orders::FanOutSynchronizer`]
//!     - **Notification Emitter** - Admin feed → [`orders::NotificationFeed`]
//! - **Read models** - Filters, stats, CSV export, invoices → [`reports`]
//! - **Actor surface**
//!     - **Service** - Single owner of all mutable state → [`actors::OrderService`]
//!     - **Client** - Macro-generated, traced request methods → [`clients::OrderClient`]
//!     - **System coordinator** - Startup, auto-refresh, shutdown → [`app_system::OrderSystem`]
//!     - **Tracing setup** - [`app_system::setup_tracing`]
//!
//! ## Example Usage
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use grocery_orders::app_system::{AdminConfig, OrderSystem};
//! # use grocery_orders::domain::{OrderId, OrderStatus};
//! # use grocery_orders::storage::MemoryStore;
//! # async fn demo() -> Result<(), grocery_orders::error::OrderError> {
//! let system = OrderSystem::new(AdminConfig::default(), Arc::new(MemoryStore::new())).await;
//!
//! let update = system
//!     .order_client
//!     .update_status(OrderId(1001), OrderStatus::Processing, Some("admin".into()))
//!     .await?;
//! assert!(update.report.is_complete());
//!
//! system.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod actors;
pub mod app_system;
pub mod clients;
pub mod clock;
pub mod domain;
pub mod error;
pub mod messages;
pub mod orders;
pub mod reports;
pub mod storage;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;
