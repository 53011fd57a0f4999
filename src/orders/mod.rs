//! Order lifecycle: the canonical store, the status transition engine, fan-out of
//! a changed order into every copy location, and the notification feed.

pub mod history;
pub mod key;
pub mod notify;
pub mod store;
pub mod sync;
pub mod transition;

pub use history::{CappedHistory, Upsert, CUSTOMER_HISTORY_CAPACITY, GLOBAL_HISTORY_CAPACITY};
pub use key::OrderKey;
pub use notify::{message_for, NotificationFeed, NOTIFICATION_CAPACITY};
pub use store::{MergeOutcome, OrderStore};
pub use sync::{is_synced, CopyLocation, FanOutSynchronizer, SyncEntry, SyncOutcome, SyncReport};
pub use transition::{apply_action, transition, OrderAction};
