pub mod notification;
pub mod order;
pub mod store_identity;

pub use notification::*;
pub use order::*;
pub use store_identity::*;
